use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error! status: {status}, {body}")]
    Service { status: u16, body: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Unknown action: {0}")]
    UnknownCommand(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Internal(String),

    /// A failure response relayed from the other side of the command bus.
    #[error("{message}")]
    Rejected {
        kind: ErrorKind,
        message: String,
        status: Option<u16>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error category carried on failure responses so a UI surface can
/// decide how to present a failure without parsing the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Network,
    Service,
    Validation,
    NotFound,
    UnknownCommand,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network(_) | Error::Timeout(_) => ErrorKind::Network,
            Error::Service { .. } => ErrorKind::Service,
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::UnknownCommand(_) => ErrorKind::UnknownCommand,
            Error::Config(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Storage(_)
            | Error::Internal(_) => ErrorKind::Internal,
            Error::Rejected { kind, .. } => *kind,
        }
    }

    /// HTTP status of a remote failure, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Service { status, .. } => Some(*status),
            Error::Rejected { status, .. } => *status,
            _ => None,
        }
    }
}
