use std::path::PathBuf;

use clap::Args;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use ferry_daemon::http_server::api::client::ApiError;

#[derive(Args, Debug, Clone)]
pub struct Download {
    /// Remote file as `<bucket>/<name>`
    #[arg(long)]
    pub file: String,

    /// Where to write the file (defaults to its name in the current directory)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum BucketDownloadError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot derive an output filename from {0:?}, pass --output")]
    NoFilename(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Download {
    type Error = BucketDownloadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let output = match &self.output {
            Some(path) => path.clone(),
            None => self
                .file
                .rsplit(['/', '\\'])
                .next()
                .filter(|leaf| !leaf.is_empty() && *leaf != "." && *leaf != "..")
                .map(PathBuf::from)
                .ok_or_else(|| BucketDownloadError::NoFilename(self.file.clone()))?,
        };

        let response = ctx.client.download(&self.file).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let mut out = tokio::fs::File::create(&output).await?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        out.flush().await?;

        Ok(format!(
            "Downloaded {} to {} ({} bytes, {})",
            self.file,
            output.display(),
            written,
            content_type
        ))
    }
}
