use clap::{Args, Subcommand};

pub mod download;
pub mod list;
pub mod upload;

use crate::cli::op::Op;
use ferry_daemon::http_server::api::v0::bucket::ListRequest;

crate::command_enum! {
    (List, ListRequest),
    (Upload, upload::Upload),
    (Download, download::Download),
}

// Rename the generated Command to BucketCommand for clarity
pub type BucketCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Bucket {
    #[command(subcommand)]
    pub command: BucketCommand,
}

#[async_trait::async_trait]
impl Op for Bucket {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
