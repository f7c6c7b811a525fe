//! The session state machine.
//!
//! One controller per UI process. Flow transitions, the loading flag, and
//! the error field live behind a single mutex; the mutex is never held
//! across an await. Nothing here propagates failures to the caller: every
//! operation converts them into the error field or a boolean outcome.

use crate::exchange::CredentialExchange;
use crate::flow::{AuthFlow, FlowStatus};
use auth_callback::{AuthCallbackPayload, UserSummary};
use serde::Serialize;
use shell_storage::SessionStore;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Error shown when a step is invoked with no matching flow in progress.
pub const MISUSE_MESSAGE: &str = "An unexpected error occurred. Please restart the process.";

/// Error shown when an accepted-looking payload lacks a session token.
pub const MISSING_CREDENTIALS_MESSAGE: &str =
    "Authentication response was missing session credentials.";

/// Point-in-time view of the session state, as the UI consumes it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: FlowStatus,
    pub flow_email: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub user: Option<UserSummary>,
    pub authenticated: bool,
}

struct FlowState {
    flow: AuthFlow,
    is_loading: bool,
    error: Option<String>,
    user: Option<UserSummary>,
    authenticated: bool,
}

/// Single authority for the authentication flow in the UI process.
///
/// Starts with `is_loading = true`; the startup validation pass is the only
/// thing that terminates the initial loading state.
pub struct SessionController<E: CredentialExchange> {
    exchange: E,
    store: SessionStore,
    state: Mutex<FlowState>,
}

impl<E: CredentialExchange> SessionController<E> {
    /// Create a controller over the given exchange client and store.
    pub fn new(exchange: E, store: SessionStore) -> Self {
        Self {
            exchange,
            store,
            state: Mutex::new(FlowState {
                flow: AuthFlow::Idle,
                is_loading: true,
                error: None,
                user: None,
                authenticated: false,
            }),
        }
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().unwrap();
        SessionSnapshot {
            status: state.flow.status(),
            flow_email: state.flow.email().map(str::to_string),
            is_loading: state.is_loading,
            error: state.error.clone(),
            user: state.user.clone(),
            authenticated: state.authenticated,
        }
    }

    fn begin_operation(&self) {
        let mut state = self.state.lock().unwrap();
        state.is_loading = true;
        state.error = None;
    }

    fn fail_operation(&self, message: String) -> bool {
        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        state.error = Some(message);
        false
    }

    /// Persist an accepted payload's credentials. The payload must carry a
    /// token; the user record is optional and mirrored when present.
    fn persist_credentials(&self, payload: &AuthCallbackPayload) -> Result<(), String> {
        let token = payload
            .token
            .as_deref()
            .ok_or_else(|| MISSING_CREDENTIALS_MESSAGE.to_string())?;

        let stored = match &payload.user {
            Some(user) => self.store.set_session(token, user),
            None => self.store.set_token(token),
        };
        stored.map_err(|error| {
            warn!(%error, "Failed to persist accepted session");
            error.to_string()
        })
    }

    /// Mark the session accepted: persist the token and settle to idle.
    fn accept(&self, payload: AuthCallbackPayload) -> bool {
        if let Err(message) = self.persist_credentials(&payload) {
            return self.fail_operation(message);
        }

        let mut state = self.state.lock().unwrap();
        state.flow = AuthFlow::Idle;
        state.is_loading = false;
        state.error = None;
        state.user = payload.user;
        state.authenticated = true;
        info!("Session accepted");
        true
    }

    /// Begin a signup flow. On success the flow advances to awaiting-otp.
    pub async fn start_signup(&self, email: &str, password: &str) -> bool {
        self.begin_operation();

        match self.exchange.start_signup(email, password).await {
            Ok(payload) if payload.success => {
                let mut state = self.state.lock().unwrap();
                state.flow = AuthFlow::AwaitingOtp {
                    email: email.to_string(),
                };
                state.is_loading = false;
                info!(email = %email, "Signup started, awaiting OTP");
                true
            }
            Ok(payload) => self.fail_operation(payload.message),
            Err(error) => self.fail_operation(error.to_string()),
        }
    }

    /// Begin a password-reset flow. On success the flow advances to
    /// awaiting-otp, same as signup; the OTP verification outcome decides
    /// which flow it was.
    pub async fn start_forgot_password(&self, email: &str) -> bool {
        self.begin_operation();

        match self.exchange.start_password_reset(email).await {
            Ok(payload) if payload.success => {
                let mut state = self.state.lock().unwrap();
                state.flow = AuthFlow::AwaitingOtp {
                    email: email.to_string(),
                };
                state.is_loading = false;
                info!(email = %email, "Password reset started, awaiting OTP");
                true
            }
            Ok(payload) => self.fail_operation(payload.message),
            Err(error) => self.fail_operation(error.to_string()),
        }
    }

    /// Verify the OTP for the flow in progress.
    ///
    /// A token-bearing success accepts the session. A success without a
    /// token means the OTP validated a password-reset request, and the flow
    /// advances to awaiting-password-reset.
    pub async fn verify_otp(&self, code: &str) -> bool {
        let email = {
            let mut state = self.state.lock().unwrap();
            match &state.flow {
                AuthFlow::AwaitingOtp { email } => {
                    let email = email.clone();
                    state.is_loading = true;
                    state.error = None;
                    email
                }
                _ => {
                    warn!("verify_otp called with no OTP flow in progress");
                    state.error = Some(MISUSE_MESSAGE.to_string());
                    return false;
                }
            }
        };

        match self.exchange.verify_otp(&email, code).await {
            Ok(payload) if payload.is_accepted() => self.accept(payload),
            Ok(payload) if payload.success => {
                let mut state = self.state.lock().unwrap();
                state.flow = AuthFlow::AwaitingPasswordReset { email };
                state.is_loading = false;
                debug!("OTP validated a password-reset request");
                true
            }
            Ok(payload) => self.fail_operation(payload.message),
            Err(error) => self.fail_operation(error.to_string()),
        }
    }

    /// Complete the password reset for the flow in progress.
    pub async fn reset_password(&self, new_password: &str) -> bool {
        let email = {
            let mut state = self.state.lock().unwrap();
            match &state.flow {
                AuthFlow::AwaitingPasswordReset { email } => {
                    let email = email.clone();
                    state.is_loading = true;
                    state.error = None;
                    email
                }
                _ => {
                    warn!("reset_password called with no reset flow in progress");
                    state.error = Some(MISUSE_MESSAGE.to_string());
                    return false;
                }
            }
        };

        match self.exchange.reset_password(&email, new_password).await {
            Ok(payload) if payload.is_accepted() => self.accept(payload),
            Ok(payload) if payload.success => {
                self.fail_operation(MISSING_CREDENTIALS_MESSAGE.to_string())
            }
            Ok(payload) => self.fail_operation(payload.message),
            Err(error) => self.fail_operation(error.to_string()),
        }
    }

    /// Abort whatever flow is in progress and clear the error field.
    pub fn reset_auth_flow(&self) {
        let mut state = self.state.lock().unwrap();
        state.flow = AuthFlow::Idle;
        state.error = None;
    }

    /// Consume an externally delivered callback payload.
    ///
    /// Accepted payloads establish the session from any flow state.
    /// Cancellation is a distinct non-error outcome and leaves both the
    /// flow and the error field untouched. Everything else surfaces as the
    /// error field with the flow unchanged.
    pub fn receive_callback(&self, payload: AuthCallbackPayload) {
        if payload.is_cancellation() {
            debug!("Authentication cancelled by user");
            self.state.lock().unwrap().is_loading = false;
            return;
        }

        if payload.is_accepted() {
            self.accept(payload);
            return;
        }

        let message = if payload.success {
            // Claimed success with no token to persist.
            MISSING_CREDENTIALS_MESSAGE.to_string()
        } else {
            payload.message
        };
        self.fail_operation(message);
    }

    /// The startup validation pass.
    ///
    /// Runs exactly once per process. A stored token is exchanged for a
    /// fresh user record; a rejected token is discarded. Always terminates
    /// the initial loading state, success or failure.
    pub async fn validate_on_startup(&self) {
        let token = match self.store.token() {
            Ok(token) => token,
            Err(error) => {
                warn!(%error, "Could not read stored session, treating as signed out");
                None
            }
        };

        let Some(token) = token else {
            info!("No stored session found on startup");
            let mut state = self.state.lock().unwrap();
            state.is_loading = false;
            state.authenticated = false;
            state.user = None;
            return;
        };

        match self.exchange.validate_token(&token).await {
            Ok(user) => {
                info!(user_id = %user.id, "Stored session validated on startup");
                if let Err(error) = self.store.set_session(&token, &user) {
                    warn!(%error, "Failed to refresh stored user record");
                }
                let mut state = self.state.lock().unwrap();
                state.is_loading = false;
                state.authenticated = true;
                state.user = Some(user);
            }
            Err(error) => {
                warn!(%error, "Stored session rejected on startup, clearing");
                if let Err(error) = self.store.clear_session() {
                    warn!(%error, "Failed to clear rejected session");
                }
                let mut state = self.state.lock().unwrap();
                state.is_loading = false;
                state.authenticated = false;
                state.user = None;
            }
        }
    }

    /// Destroy the stored session and settle to signed-out idle.
    pub fn sign_out(&self) -> bool {
        if let Err(error) = self.store.clear_session() {
            warn!(%error, "Failed to clear session on sign-out");
            return self.fail_operation(error.to_string());
        }

        let mut state = self.state.lock().unwrap();
        state.flow = AuthFlow::Idle;
        state.is_loading = false;
        state.error = None;
        state.user = None;
        state.authenticated = false;
        info!("Signed out");
        true
    }
}
