use std::net::SocketAddr;
use std::path::PathBuf;

use common::prelude::Ownership;

use crate::state::TlsConfig;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// address for the HTTP(S) server to listen on
    pub listen_addr: SocketAddr,
    /// serve HTTPS with this material, plain HTTP if unset
    pub tls: Option<TlsConfig>,
    /// largest accepted request body in bytes
    pub max_upload_bytes: usize,

    // storage configuration
    /// absolute storage root, resolved once at startup
    pub data_dir: PathBuf,
    /// ownership applied to every uploaded file
    pub ownership: Option<Ownership>,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}
