//! Error types for the cardinality provider

use std::fmt;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the cardinality provider
#[derive(Debug)]
pub enum Error {
    /// The request is malformed or cannot be served (missing organization,
    /// bad bounds, unsupported capability)
    Invalid(String),
    /// A referenced resource does not exist
    NotFound(String),
    /// The execution context was cancelled
    Canceled,
    /// The execution context deadline expired
    DeadlineExceeded,
    /// Unexpected backend or codec failure
    Internal(String),
    /// Arrow-related errors
    Arrow(arrow::error::ArrowError),
    /// DataFusion errors (memory pool reservations)
    DataFusion(datafusion::error::DataFusionError),
    /// Read source decoding errors
    Decode(prost::DecodeError),
    /// A collaborator failure annotated with the step that produced it
    Context {
        step: &'static str,
        source: Box<Error>,
    },
}

/// Coarse error classification, stable across wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    Canceled,
    DeadlineExceeded,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Canceled => "canceled",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
            ErrorKind::Internal => "internal",
        }
    }
}

impl Error {
    /// Kind of this error. Context wrappers report the kind of their source.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Invalid(_) => ErrorKind::InvalidRequest,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Canceled => ErrorKind::Canceled,
            Error::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            Error::Internal(_) | Error::Arrow(_) | Error::DataFusion(_) | Error::Decode(_) => {
                ErrorKind::Internal
            }
            Error::Context { source, .. } => source.kind(),
        }
    }

    /// The innermost error, with all context wrappers removed
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Message carried by an `Invalid`, `NotFound` or `Internal` root error
    pub fn message(&self) -> Option<&str> {
        match self.root() {
            Error::Invalid(msg) | Error::NotFound(msg) | Error::Internal(msg) => Some(msg),
            _ => None,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Arrow(e) => Some(e),
            Error::DataFusion(e) => Some(e),
            Error::Decode(e) => Some(e),
            Error::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Invalid(msg) => write!(f, "{}", msg),
            Error::NotFound(msg) => write!(f, "{}", msg),
            Error::Canceled => write!(f, "context canceled"),
            Error::DeadlineExceeded => write!(f, "context deadline exceeded"),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
            Error::Arrow(e) => write!(f, "Arrow error: {}", e),
            Error::DataFusion(e) => write!(f, "DataFusion error: {}", e),
            Error::Decode(e) => write!(f, "Read source decode error: {}", e),
            Error::Context { step, source } => write!(f, "{}: {}", step, source),
        }
    }
}

impl From<arrow::error::ArrowError> for Error {
    fn from(e: arrow::error::ArrowError) -> Self {
        Error::Arrow(e)
    }
}

impl From<datafusion::error::DataFusionError> for Error {
    fn from(e: datafusion::error::DataFusionError) -> Self {
        Error::DataFusion(e)
    }
}

impl From<prost::DecodeError> for Error {
    fn from(e: prost::DecodeError) -> Self {
        Error::Decode(e)
    }
}

/// Annotate collaborator failures with the step that failed
pub trait ResultExt<T> {
    fn context(self, step: &'static str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, step: &'static str) -> Result<T> {
        self.map_err(|source| Error::Context {
            step,
            source: Box::new(source),
        })
    }
}
