use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

/// Crate-level composite error for callers that wire the whole stack
/// together (startup, integration harnesses).
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("validation failed: {0}")]
    Validation(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
