//! Service error types.

use shop_cache::CacheError;
use shop_domain::DomainError;
use thiserror::Error;

/// Errors returned by storefront services.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input rejected by a business rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payment processing failed.
    #[error("Payment error: {0}")]
    Payment(String),

    /// Password hashing or verification failed.
    #[error("Password error: {0}")]
    Password(String),

    /// Storage lock poisoned.
    #[error("Storage lock poisoned: {0}")]
    LockPoisoned(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
