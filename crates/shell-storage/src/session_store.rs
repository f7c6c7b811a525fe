//! Typed wrapper over the storage backend for session state.

use crate::{StorageKeys, StorageResult, TokenStorage};
use auth_callback::UserSummary;

/// Owns the well-known keys for the persisted session.
///
/// The bearer token is opaque: the store never inspects it, and absence of
/// the token key means "unauthenticated".
pub struct SessionStore {
    storage: Box<dyn TokenStorage>,
}

impl SessionStore {
    /// Create a store over any backend.
    pub fn new(storage: Box<dyn TokenStorage>) -> Self {
        Self { storage }
    }

    /// Persist an accepted session.
    pub fn set_session(&self, token: &str, user: &UserSummary) -> StorageResult<()> {
        self.storage.set(StorageKeys::SESSION_TOKEN, token)?;
        self.storage
            .set(StorageKeys::SESSION_USER, &serde_json::to_string(user)?)?;
        Ok(())
    }

    /// Persist only the bearer token, leaving any stored user record alone.
    pub fn set_token(&self, token: &str) -> StorageResult<()> {
        self.storage.set(StorageKeys::SESSION_TOKEN, token)
    }

    /// Get the stored bearer token.
    pub fn token(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::SESSION_TOKEN)
    }

    /// Get the mirrored user record.
    pub fn user(&self) -> StorageResult<Option<UserSummary>> {
        match self.storage.get(StorageKeys::SESSION_USER)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Whether a token is present.
    pub fn has_session(&self) -> StorageResult<bool> {
        self.storage.has(StorageKeys::SESSION_TOKEN)
    }

    /// Destroy the stored session.
    pub fn clear_session(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::SESSION_TOKEN)?;
        self.storage.delete(StorageKeys::SESSION_USER)?;
        Ok(())
    }
}
