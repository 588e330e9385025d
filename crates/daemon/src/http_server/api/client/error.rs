use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
}

impl ApiError {
    /// Turn a non-success response into [`ApiError::HttpStatus`], keeping the body
    /// as the message.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        match response.text().await {
            Ok(body) => ApiError::HttpStatus(status, body),
            Err(e) => ApiError::Reqwest(e),
        }
    }
}
