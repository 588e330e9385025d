use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Args;

use ferry_daemon::state::{AppState, StateError};
use ferry_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override the listen port (default from config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Override the storage root (default from config, else ./data)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Default log level; RUST_LOG takes precedence
    #[arg(long, default_value_t = tracing::Level::INFO)]
    pub log_level: tracing::Level,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Missing config directory means defaults
        let mut state = AppState::load_or_default(ctx.config_path.clone())?;

        if let Some(dir) = &self.data_dir {
            state.config.data_dir = Some(dir.clone());
        }
        let data_dir = state.config.resolve_data_dir()?;
        let port = self.port.unwrap_or(state.config.listen_port);

        let config = ServiceConfig {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            tls: state.config.tls.clone(),
            max_upload_bytes: state.config.max_upload_bytes,
            data_dir,
            ownership: state.config.ownership,
            log_level: self.log_level,
            log_dir: self.log_dir.clone(),
        };

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
