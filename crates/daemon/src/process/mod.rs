pub mod utils;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use futures::future::join_all;
use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

use crate::http_server;
use crate::{ServiceConfig, ServiceState};

/// Handle for gracefully shutting down the daemon service.
pub struct ShutdownHandle {
    graceful_waiter: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl ShutdownHandle {
    /// Block until a shutdown signal arrives and the server tasks have finished.
    pub async fn wait(self) {
        shutdown_and_join(self.graceful_waiter, self.handles).await;
    }
}

/// Initialize logging, panic handler, and build info reporting.
/// Returns guards that must be kept alive for the duration of the program.
fn init_logging(
    service_config: &ServiceConfig,
) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let mut guards = Vec::new();

    // Stdout layer
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);

    let stdout_env_filter = EnvFilter::builder()
        .with_default_directive(service_config.log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(stdout_env_filter);

    // File layer (if log_dir is set)
    if let Some(log_dir) = &service_config.log_dir {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
        }

        let file_appender = tracing_appender::rolling::daily(log_dir, "ferry.log");
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guards.push(file_guard);

        let file_env_filter = EnvFilter::builder()
            .with_default_directive(service_config.log_level.into())
            .from_env_lossy();

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(file_env_filter);

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(stdout_layer).init();
    }

    utils::register_panic_logger();
    utils::report_build_info();

    guards
}

/// Wait for shutdown and join all handles with timeout.
async fn shutdown_and_join(
    graceful_waiter: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
) {
    let _ = graceful_waiter.await;

    if timeout(FINAL_SHUTDOWN_TIMEOUT, join_all(handles))
        .await
        .is_err()
    {
        tracing::error!(
            "Failed to shut down within {} seconds",
            FINAL_SHUTDOWN_TIMEOUT.as_secs()
        );
        std::process::exit(4);
    }
}

/// Create state and spawn the HTTP server, returning the state handle.
///
/// The returned `ShutdownHandle` must be kept alive; dropping it does not stop the service.
pub async fn start_service(
    service_config: &ServiceConfig,
) -> anyhow::Result<(ServiceState, ShutdownHandle)> {
    let (graceful_waiter, shutdown_rx) =
        utils::graceful_shutdown_blocker().context("failed to install signal handlers")?;
    let state = ServiceState::from_config(service_config)
        .await
        .context("error creating server state")?
        .with_shutdown(shutdown_rx.clone());

    let mut handles = Vec::new();

    let listen_addr: SocketAddr = service_config.listen_addr;
    let http_state = state.clone();
    let http_config = http_server::Config::new(
        listen_addr,
        service_config.tls.clone(),
        service_config.max_upload_bytes,
    );
    let http_rx = shutdown_rx.clone();
    let http_handle = tokio::spawn(async move {
        if let Err(e) = http_server::run(http_config, http_state, http_rx).await {
            tracing::error!("HTTP server error: {}", e);
            std::process::exit(3);
        }
    });
    handles.push(http_handle);

    tracing::info!(
        addr = %listen_addr,
        tls = service_config.tls.is_some(),
        root = %state.store().root().display(),
        "Running: file server"
    );

    let handle = ShutdownHandle {
        graceful_waiter,
        handles,
    };

    Ok((state, handle))
}

/// Spawns the daemon service and blocks until a shutdown signal is received.
/// Use for CLI binary usage.
pub async fn spawn_service(service_config: &ServiceConfig) {
    let _guards = init_logging(service_config);
    let handle = match start_service(service_config).await {
        Ok((_, handle)) => handle,
        Err(e) => {
            tracing::error!("{:#}", e);
            std::process::exit(3);
        }
    };
    handle.wait().await;
}
