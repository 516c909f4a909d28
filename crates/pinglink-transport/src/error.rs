use std::net::SocketAddr;
use std::path::PathBuf;

/// Errors that can occur in link transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to a TCP endpoint.
    #[error("failed to connect to {addr}: {source}")]
    ConnectTcp {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to connect to a Unix socket path.
    #[error("failed to connect to {path}: {source}")]
    ConnectUnix {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The endpoint address could not be resolved.
    #[error("could not resolve address {0}")]
    Resolve(String),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed, locally or by the remote end.
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
