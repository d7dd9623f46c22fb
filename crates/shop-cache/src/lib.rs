//! Type-safe caching layer for the storefront.
//!
//! Values are stored as JSON so any `Serialize + DeserializeOwned` type can
//! be cached, and entries expire after a per-entry TTL.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use shop_cache::{cache_key, Cache};
//!
//! let cache = Cache::in_memory();
//! let key = cache_key!("shop.category.navigation", 1, "guests");
//! assert_eq!(key, "shop.category.navigation:1:guests");
//!
//! cache.set(&key, &vec![1, 2, 3], Some(Duration::from_secs(60))).unwrap();
//! let ids: Option<Vec<u32>> = cache.get(&key).unwrap();
//! assert_eq!(ids, Some(vec![1, 2, 3]));
//! ```

mod error;
mod memory;
mod session;

pub use error::CacheError;
pub use memory::{Cache, CacheBackend, MemoryBackend};
pub use session::{Session, SessionData, SessionId};

/// Helper to build cache keys with namespacing.
///
/// ```rust
/// let key = shop_cache::cache_key!("cart", 42);
/// assert_eq!(key, "cart:42");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{cache_key, Cache, CacheError, Session, SessionId};
}
