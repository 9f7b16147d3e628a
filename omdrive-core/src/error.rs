//! Error types.

use std::io;
use std::num::{ParseFloatError, ParseIntError};

pub type Result<T> = core::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

/// Crate-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    IoError(String),

    #[error("toml deserialization error: {0}")]
    TomlDeserError(#[from] toml::de::Error),
    #[error("semver req parse error")]
    SemverReqParseError(#[from] semver::ReqParseError),
    #[error("semver error")]
    SemverError(#[from] semver::SemVerError),

    #[error("parsing error: {0}")]
    ParsingError(String),
    #[error("failed parsing int: {0}")]
    ParseIntError(#[from] ParseIntError),
    #[error("failed parsing float: {0}")]
    ParseFloatError(#[from] ParseFloatError),

    #[error("invalid model name: {0}")]
    InvalidModelName(String),
    #[error(
        "library list and version list differ in length: \
         {0} libraries, {1} versions"
    )]
    LibraryVersionMismatch(usize, usize),
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("engine version \"{0}\" does not meet the requirement \"{1}\"")]
    EngineVersionMismatch(String, String),
    #[error("engine installation not found at: {0}")]
    InstallationNotFound(String),

    #[error("session error: {0}")]
    SessionError(String),
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("result file not found at: {0}")]
    ResultFileNotFound(String),
    #[error("no signal named: {0}")]
    NoSuchSignal(String),

    #[error("other error: {0}")]
    Other(String),
}
