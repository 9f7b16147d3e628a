use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Enumeration of errors that may occur while reaching an engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("timed out")]
    TimedOut,
    #[error("failed spawning engine process: {0}")]
    SpawnFailed(String),
    #[error("port file not found after {0} attempts: {1}")]
    PortFileNotFound(u32, String),
    #[error("invalid port file contents: {0}")]
    InvalidPortFile(String),
    #[error("handshake failed, got: {0}")]
    HandshakeFailed(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "zmq_transport")]
    #[error("zmq error")]
    ZmqError(#[from] zmq::Error),

    #[error("core error")]
    CoreError(#[from] omdrive_core::error::Error),

    #[error("other: {0}")]
    Other(String),
}
