//! Authentication flow state machine for the TweakBench UI process.
//!
//! The controller is the single authority for the multi-step signup and
//! password-reset flow. It consumes externally delivered callback payloads,
//! drives the credential exchange endpoint, and owns the persisted session
//! token through the storage layer.

mod controller;
mod error;
mod exchange;
mod flow;

pub use controller::{
    SessionController, SessionSnapshot, MISSING_CREDENTIALS_MESSAGE, MISUSE_MESSAGE,
};
pub use error::{FlowError, FlowResult};
pub use exchange::{CredentialExchange, ExchangeFuture, HttpExchange};
pub use flow::{AuthFlow, FlowStatus};
