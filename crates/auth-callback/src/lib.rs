//! OAuth callback payload types and redirect decoding.
//!
//! An external browser flow hands its result back to the shell through one
//! of two transports: a custom URI scheme activation, or an intercepted
//! navigation inside a privileged embedded window. Both carry the same
//! percent-encoded JSON in a `data` query parameter, and both funnel into
//! one decoder so downstream code never knows which transport fired.

mod payload;
mod redirect;

pub use payload::{
    AuthCallbackPayload, UserSummary, CANCELLED_MESSAGE, DECODE_FAILURE_MESSAGE, TIMEOUT_MESSAGE,
};
pub use redirect::{decode_redirect_data, payload_from_deep_link, payload_from_navigation};
