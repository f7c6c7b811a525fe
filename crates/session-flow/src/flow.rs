//! The authentication flow as a tagged union.
//!
//! The flow email lives inside the state that needs it, so "awaiting OTP
//! with no email" cannot be constructed.

use serde::{Deserialize, Serialize};

/// Which multi-step flow, if any, is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFlow {
    /// No flow in progress.
    Idle,
    /// An OTP was sent to `email` and the next step is verification.
    AwaitingOtp { email: String },
    /// The OTP validated a password-reset request for `email`.
    AwaitingPasswordReset { email: String },
}

impl AuthFlow {
    /// Flat status tag for the UI.
    pub fn status(&self) -> FlowStatus {
        match self {
            AuthFlow::Idle => FlowStatus::Idle,
            AuthFlow::AwaitingOtp { .. } => FlowStatus::AwaitingOtp,
            AuthFlow::AwaitingPasswordReset { .. } => FlowStatus::AwaitingPasswordReset,
        }
    }

    /// The email the current flow was started for.
    pub fn email(&self) -> Option<&str> {
        match self {
            AuthFlow::Idle => None,
            AuthFlow::AwaitingOtp { email } => Some(email),
            AuthFlow::AwaitingPasswordReset { email } => Some(email),
        }
    }
}

/// Serialized flow status, as rendered by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowStatus {
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "awaiting-otp")]
    AwaitingOtp,
    #[serde(rename = "awaiting-password-reset")]
    AwaitingPasswordReset,
}
