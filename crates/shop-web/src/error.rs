//! Web layer error types.

use shop_cache::CacheError;
use shop_domain::{DomainError, StoreId};
use shop_services::ServiceError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors an action can fail with. Business rule failures never end up
/// here; they are reported through the model state or as warnings.
#[derive(Error, Debug)]
pub enum WebError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The request names a store that isn't configured.
    #[error("Store not found: {0}")]
    StoreNotFound(StoreId),
}
