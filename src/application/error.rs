use thiserror::Error;

use crate::infra::error::InfraError;

/// Top-level failure for process startup and the serve loop. Request-scoped
/// failures are mapped to HTTP responses at the boundary instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
