use std::path::PathBuf;

use clap::Args;

use ferry_daemon::state::{AppConfig, AppState, StateError, TlsConfig, DEFAULT_PORT};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Port for the HTTP(S) server
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Storage root (defaults to ./data relative to where the daemon starts)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// PEM certificate chain; enables HTTPS together with --tls-key
    #[arg(long, requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    /// PEM private key for --tls-cert
    #[arg(long, requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let tls = match (&self.tls_cert, &self.tls_key) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert: cert.clone(),
                key: key.clone(),
            }),
            _ => None,
        };

        let config = AppConfig {
            listen_port: self.port,
            data_dir: self.data_dir.clone(),
            tls,
            ..AppConfig::default()
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let data_dir = match &state.config.data_dir {
            Some(dir) => dir.display().to_string(),
            None => "./data (relative to the daemon's working directory)".to_string(),
        };
        let scheme = if state.config.tls.is_some() {
            "https"
        } else {
            "http"
        };

        Ok(format!(
            "Initialized ferry directory at: {}\n\
             - Config: {}\n\
             - Listen port: {} ({})\n\
             - Data directory: {}",
            state.ferry_dir.display(),
            state.config_path.display(),
            state.config.listen_port,
            scheme,
            data_dir
        ))
    }
}
