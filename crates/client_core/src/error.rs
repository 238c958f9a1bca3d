use std::path::PathBuf;

use shared::error::{ProtocolError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid service url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed service response: {0}")]
    Malformed(String),
}

impl From<ProtocolError> for TransportError {
    fn from(value: ProtocolError) -> Self {
        Self::Malformed(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("surface {surface} already has a chart bound")]
    AlreadyBound { surface: String },
    #[error("surface {surface} does not hold binding {binding}")]
    UnknownBinding { surface: String, binding: u64 },
    #[error("surface {surface} has nothing rendered")]
    NothingRendered { surface: String },
    #[error("failed to draw chart on {surface}: {reason}")]
    Draw { surface: String, reason: String },
    #[error("failed to encode snapshot of {surface}: {reason}")]
    Encode { surface: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{message}")]
    ServiceRejection { message: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("chart rendering failed: {0}")]
    Surface(#[from] SurfaceError),
    #[error("failed to save report to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        source: std::io::Error,
    },
}
