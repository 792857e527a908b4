use http::StatusCode;
use thiserror::Error;

/// Failures while talking to the remote admin surface
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("credential rejected by remote host")]
    Unauthorized,

    #[error("remote endpoint not found: {0}")]
    NotFound(String),

    #[error("remote host answered with status {0}")]
    RemoteFailure(StatusCode),

    #[error("network failure: {0}")]
    NetworkFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid server url: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// Classify a non-success status code
    pub fn from_status(status: StatusCode, path: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TransportError::Unauthorized,
            StatusCode::NOT_FOUND => TransportError::NotFound(path.to_string()),
            other => TransportError::RemoteFailure(other),
        }
    }
}

/// The admin surface returned a page we could not read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{page} page is missing its `{marker}` marker")]
    MissingMarker {
        page: &'static str,
        marker: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("{kind} '{name}' is not registered")]
    NotFound { kind: &'static str, name: String },

    #[error("no tunnel is running for local port {port}")]
    NotRunning { port: u16 },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, ApiError>;
