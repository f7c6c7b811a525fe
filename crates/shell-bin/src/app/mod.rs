//! Application wiring and lifecycle management.

mod handlers;
mod init;
mod lifecycle;
mod state;

pub use init::run_shell;
pub use lifecycle::check_status;
pub use state::ShellState;
