//! Wire types for the authentication callback.

use serde::{Deserialize, Serialize};

/// Message used when redirect data cannot be decoded or parsed.
pub const DECODE_FAILURE_MESSAGE: &str = "Failed to process authentication callback";

/// Message used when the user closes the external window before a result.
pub const CANCELLED_MESSAGE: &str = "Authentication cancelled by user.";

/// Message used when a pending open-window request hits its deadline.
pub const TIMEOUT_MESSAGE: &str = "Authentication timed out";

/// Summary of the authenticated user, mirrored from the backend record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// Backend user ID.
    pub id: String,
    /// Account email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL, if the provider supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Identity provider that authenticated this user (e.g. "google").
    pub auth_provider: String,
}

/// Result of one external login attempt.
///
/// Produced exactly once per attempt by the credential exchange endpoint,
/// carried in transit through the redirect and relay, and consumed once by
/// the session state machine. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCallbackPayload {
    /// Whether the external authentication succeeded.
    pub success: bool,
    /// Human-readable outcome description.
    pub message: String,
    /// Bearer token for the established session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// User record mirrored from the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl AuthCallbackPayload {
    /// Create a successful payload carrying a session token.
    pub fn accepted(message: impl Into<String>, token: impl Into<String>, user: UserSummary) -> Self {
        Self {
            success: true,
            message: message.into(),
            token: Some(token.into()),
            user: Some(user),
        }
    }

    /// Create a failed payload.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            token: None,
            user: None,
        }
    }

    /// Synthetic payload for undecodable redirect data.
    pub fn decode_failure() -> Self {
        Self::failure(DECODE_FAILURE_MESSAGE)
    }

    /// Payload for a user-cancelled flow. Cancellation is a distinct
    /// outcome, not an error the UI should surface.
    pub fn cancelled() -> Self {
        Self::failure(CANCELLED_MESSAGE)
    }

    /// Payload for a pending request that hit its deadline.
    pub fn timed_out() -> Self {
        Self::failure(TIMEOUT_MESSAGE)
    }

    /// True when this payload establishes a session: success plus a token.
    pub fn is_accepted(&self) -> bool {
        self.success && self.token.is_some()
    }

    /// True when this payload represents user cancellation.
    pub fn is_cancellation(&self) -> bool {
        !self.success && self.message == CANCELLED_MESSAGE
    }
}
