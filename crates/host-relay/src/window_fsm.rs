//! Window-lifecycle state machine.
//!
//! The relay never delivers into a window that has not finished its first
//! content load. The machine makes that explicit:
//!
//! ```text
//! NoWindow --WindowCreated--> WindowLoading --WindowLoaded--> WindowReady
//!     ^                            |                              |
//!     +-------WindowClosed--------+------------------------------+
//! ```
//!
//! `WindowLoaded` in `WindowReady` is a self-transition: a reload or
//! in-app navigation re-fires the load event without changing readiness.

use rust_fsm::*;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub relay_window(NoWindow)

    NoWindow => {
        WindowCreated => WindowLoading
    },
    WindowLoading => {
        WindowLoaded => WindowReady,
        WindowClosed => NoWindow
    },
    WindowReady => {
        WindowLoaded => WindowReady,
        WindowClosed => NoWindow
    }
}

// Re-export the generated types with clearer names
pub use relay_window::Input as WindowInput;
pub use relay_window::State as WindowState;
pub use relay_window::StateMachine as WindowMachine;
