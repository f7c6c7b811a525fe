//! Storage key constants.

/// Storage keys used by the shell
pub struct StorageKeys;

impl StorageKeys {
    /// Session bearer token. Absence of this key means "unauthenticated".
    pub const SESSION_TOKEN: &'static str = "session_token";

    /// Mirrored user record (JSON)
    pub const SESSION_USER: &'static str = "session_user";
}
