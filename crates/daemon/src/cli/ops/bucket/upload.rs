use std::path::PathBuf;

use clap::Args;

use ferry_daemon::http_server::api::client::ApiError;

#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// Local file to upload
    #[arg(long)]
    pub path: PathBuf,

    /// Target bucket (the storage root if omitted)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Remote filename; may contain `/` to nest further buckets
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BucketUploadError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot derive a filename from {0:?}, pass --name")]
    NoFilename(PathBuf),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Upload {
    type Error = BucketUploadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let name = match &self.name {
            Some(name) => name.clone(),
            None => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| BucketUploadError::NoFilename(self.path.clone()))?,
        };

        let data = tokio::fs::read(&self.path).await?;
        let size = data.len();

        ctx.client
            .upload(self.bucket.as_deref(), &name, data)
            .await?;

        let target = match self.bucket.as_deref() {
            Some(bucket) if !bucket.is_empty() => format!("{}/{}", bucket.trim_matches('/'), name),
            _ => name,
        };
        Ok(format!("Uploaded {} ({} bytes)", target, size))
    }
}
