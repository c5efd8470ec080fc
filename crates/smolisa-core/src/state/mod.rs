//! Architectural CPU state model primitives.

/// Register file storage and register identifiers.
pub mod registers;
/// Host-observable execution state machine.
pub mod run_state;

pub use registers::{RegisterFile, RegisterId, IP_INDEX, REGISTER_COUNT};
pub use run_state::RunState;
