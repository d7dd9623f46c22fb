//! Per-visitor session state stored in the cache.

use std::time::Duration;

use crate::{Cache, CacheError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Maximum retry attempts for optimistic concurrency control.
const MAX_UPDATE_RETRIES: u32 = 3;

/// A unique session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new session ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random session ID.
    pub fn generate() -> Self {
        Self(format!("sess_{}", random_token(18)))
    }

    /// Get the session ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// URL-safe random token of `bytes` random bytes.
pub(crate) fn random_token(bytes: usize) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::RngCore;

    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// Session data stored in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData<T> {
    pub id: SessionId,
    pub data: T,
    /// Version for optimistic concurrency control.
    pub version: u64,
}

/// Typed session store for one kind of session payload.
///
/// The `namespace` keeps different payload types for the same visitor
/// apart, e.g. `"checkout"` and `"auth"`.
pub struct Session<T> {
    cache: Cache,
    namespace: &'static str,
    ttl: Option<Duration>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Session<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    /// Create a session store over `cache`.
    pub fn new(cache: Cache, namespace: &'static str) -> Self {
        Self {
            cache,
            namespace,
            ttl: Some(Duration::from_secs(20 * 60)),
            _phantom: std::marker::PhantomData,
        }
    }

    /// Set the idle lifetime of sessions.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Get session data, or the default value if the session doesn't exist.
    pub fn get_or_default(&self, id: &SessionId) -> Result<T, CacheError> {
        Ok(self.get(id)?.unwrap_or_default())
    }

    /// Get session data if it exists.
    pub fn get(&self, id: &SessionId) -> Result<Option<T>, CacheError> {
        Ok(self.get_versioned(id)?.map(|s| s.data))
    }

    fn get_versioned(&self, id: &SessionId) -> Result<Option<SessionData<T>>, CacheError> {
        self.cache.get::<SessionData<T>>(&self.session_key(id))
    }

    /// Set session data (unconditional write).
    pub fn set(&self, id: &SessionId, data: &T) -> Result<(), CacheError> {
        let version = self.get_versioned(id)?.map(|s| s.version + 1).unwrap_or(1);
        self.write(id, data, version)
    }

    fn write(&self, id: &SessionId, data: &T, version: u64) -> Result<(), CacheError> {
        let session_data = SessionData {
            id: id.clone(),
            data: data.clone(),
            version,
        };
        self.cache.set(&self.session_key(id), &session_data, self.ttl)
    }

    /// Delete a session.
    pub fn delete(&self, id: &SessionId) -> Result<(), CacheError> {
        self.cache.remove(&self.session_key(id))
    }

    /// Update session data with a closure, retrying when another writer
    /// bumped the version in between.
    pub fn update<F>(&self, id: &SessionId, f: F) -> Result<T, CacheError>
    where
        F: Fn(&mut T),
    {
        for _attempt in 0..MAX_UPDATE_RETRIES {
            let (mut data, expected_version) = match self.get_versioned(id)? {
                Some(session_data) => (session_data.data, session_data.version),
                None => (T::default(), 0),
            };

            f(&mut data);

            let current_version = self.get_versioned(id)?.map(|s| s.version).unwrap_or(0);
            if current_version != expected_version {
                continue;
            }

            self.write(id, &data, expected_version + 1)?;
            return Ok(data);
        }

        Err(CacheError::ConcurrentModification(
            "max retries exceeded".to_string(),
        ))
    }

    fn session_key(&self, id: &SessionId) -> String {
        crate::cache_key!("session", self.namespace, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Checkout {
        card_last4: Option<String>,
        steps: u32,
    }

    #[test]
    fn test_session_id_generate_format() {
        let id = SessionId::generate();
        assert!(id.as_str().starts_with("sess_"));
        // 18 bytes base64 = 24 chars, plus "sess_"
        assert_eq!(id.as_str().len(), 29);
        assert_ne!(id, SessionId::generate());
    }

    #[test]
    fn test_get_set_delete() {
        let session = Session::<Checkout>::new(Cache::in_memory(), "checkout");
        let id = SessionId::new("abc");

        assert_eq!(session.get(&id).unwrap(), None);
        assert_eq!(session.get_or_default(&id).unwrap(), Checkout::default());

        let data = Checkout {
            card_last4: Some("1111".into()),
            steps: 1,
        };
        session.set(&id, &data).unwrap();
        assert_eq!(session.get(&id).unwrap(), Some(data));

        session.delete(&id).unwrap();
        assert_eq!(session.get(&id).unwrap(), None);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let cache = Cache::in_memory();
        let checkout = Session::<Checkout>::new(cache.clone(), "checkout");
        let other = Session::<Checkout>::new(cache, "other");
        let id = SessionId::new("abc");

        checkout.set(&id, &Checkout { card_last4: None, steps: 3 }).unwrap();
        assert_eq!(other.get(&id).unwrap(), None);
    }

    #[test]
    fn test_update_bumps_version() {
        let session = Session::<Checkout>::new(Cache::in_memory(), "checkout");
        let id = SessionId::new("abc");

        session.update(&id, |c| c.steps += 1).unwrap();
        let updated = session.update(&id, |c| c.steps += 1).unwrap();
        assert_eq!(updated.steps, 2);
        assert_eq!(session.get_versioned(&id).unwrap().unwrap().version, 2);
    }
}
