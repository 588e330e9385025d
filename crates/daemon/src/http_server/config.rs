use std::net::SocketAddr;

use crate::state::TlsConfig;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    // log level for http tracing
    pub log_level: tracing::Level,
    // request bodies above this are rejected before a handler runs
    pub max_upload_bytes: usize,
    // HTTPS material, plain HTTP if unset
    pub tls: Option<TlsConfig>,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, tls: Option<TlsConfig>, max_upload_bytes: usize) -> Self {
        tracing::info!(
            "Creating HTTP server Config: listen_addr={}, tls={}, max_upload_bytes={}",
            listen_addr,
            tls.is_some(),
            max_upload_bytes
        );
        Self {
            listen_addr,
            log_level: tracing::Level::INFO,
            max_upload_bytes,
            tls,
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.tls.is_some() {
            "https"
        } else {
            "http"
        }
    }
}
