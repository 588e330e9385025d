use reqwest::multipart::{Form, Part};
use reqwest::Client;
use url::Url;

use super::error::ApiError;
use super::ApiRequest;
use crate::http_server::api::v0::bucket::upload::{BUCKET_FIELD, FILE_FIELD};

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    /// `insecure` accepts any server certificate, for self-signed deployments.
    pub fn new(remote: &Url, insecure: bool) -> Result<Self, ApiError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client)?;
        let response = request_builder.send().await?;

        if response.status().is_success() {
            Ok(response.json::<T::Response>().await?)
        } else {
            Err(ApiError::from_response(response).await)
        }
    }

    /// Upload `data` as `filename` into `bucket` (the root bucket if `None`).
    pub async fn upload(
        &self,
        bucket: Option<&str>,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<(), ApiError> {
        let mut form = Form::new().part(
            FILE_FIELD,
            Part::bytes(data).file_name(filename.to_string()),
        );
        if let Some(bucket) = bucket {
            form = form.text(BUCKET_FIELD, bucket.to_string());
        }

        let url = self.remote.join("/api/v0/bucket/upload")?;
        let response = self.client.post(url).multipart(form).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ApiError::from_response(response).await)
        }
    }

    /// Start downloading `file` (`<bucket>/<name>`). The body is left unread so the
    /// caller can stream it.
    pub async fn download(&self, file: &str) -> Result<reqwest::Response, ApiError> {
        let url = self.remote.join("/api/v0/bucket/download")?;
        let response = self
            .client
            .get(url)
            .query(&[("file", file)])
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(response).await)
        }
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}
