//! Host relay for the TweakBench shell.
//!
//! The privileged host process is the single authority for deep-link
//! handling. This crate provides:
//! - Single-instance enforcement and activation forwarding
//! - The window-lifecycle state machine
//! - The one-slot pending mailbox for payloads that arrive before the UI
//!   window is ready
//! - Delivery orchestration: buffer, deliver exactly once, focus

mod error;
mod mailbox;
mod relay;
mod singleton;
mod window_fsm;

pub use error::{RelayError, RelayResult};
pub use mailbox::PendingSlot;
pub use relay::{HostRelay, RelayConfig, WindowSink};
pub use singleton::{
    check_singleton, cleanup_pid_file, forward_activation, read_pid_file, write_pid_file,
    SingletonCheck,
};
pub use window_fsm::{relay_window, WindowInput, WindowMachine, WindowState};
