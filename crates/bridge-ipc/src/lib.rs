//! IPC bridge between the privileged host process and the sandboxed UI.
//!
//! A JSON-lines protocol over Unix domain sockets. The server dispatches
//! only methods that were explicitly registered, which is how the bridge's
//! allow list is enforced: anything else resolves to `method_not_found`,
//! and nothing resembling code or callbacks ever crosses the boundary.
//!
//! Two sockets use this protocol:
//! - the **bridge socket** (host ↔ UI): the `auth.open_window` request and
//!   the pushed `auth.deliver_callback` event
//! - the **instance socket** (host ↔ host): `activation.deep_link` forwards
//!   from a second process to the running instance

mod client;
mod error;
mod protocol;
mod server;

pub use client::{BridgeClient, EventStream};
pub use error::{BridgeError, BridgeResult};
pub use protocol::{error_codes, ErrorInfo, Event, EventType, Method, Request, Response};
pub use server::BridgeServer;
