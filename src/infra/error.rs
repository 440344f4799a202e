use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("failed to build content service client: {0}")]
    CmsClient(#[source] reqwest::Error),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("http server stopped unexpectedly: {0}")]
    Serve(#[source] std::io::Error),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}
