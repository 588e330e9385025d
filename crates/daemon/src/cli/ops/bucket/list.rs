use time::format_description::well_known::Rfc3339;

use ferry_daemon::http_server::api::client::ApiError;
use ferry_daemon::http_server::api::v0::bucket::{ListRequest, ListResponse};

#[derive(Debug, thiserror::Error)]
pub enum BucketListError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for ListRequest {
    type Error = BucketListError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response: ListResponse = ctx.client.call(self.clone()).await?;

        if response.buckets.is_empty() {
            return Ok("No buckets found".to_string());
        }

        let mut lines = Vec::new();
        for bucket in &response.buckets {
            lines.push(format!("{}/ ({} files)", bucket.name, bucket.files.len()));
            for file in &bucket.files {
                let modified = file
                    .modified_at
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| file.modified_at.to_string());
                lines.push(format!("  {:<32} {:>12}  {}", file.name, file.size, modified));
            }
        }
        Ok(lines.join("\n"))
    }
}
