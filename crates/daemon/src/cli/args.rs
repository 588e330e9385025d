pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(about = "Upload, list and download files kept in directory buckets")]
#[command(version)]
pub struct Args {
    /// Daemon API URL (defaults to localhost on the configured port)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Accept self-signed or otherwise untrusted server certificates
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Path to the ferry config directory (defaults to ~/.ferry)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
