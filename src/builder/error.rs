//! Build errors for the state machine builder.

use crate::machine::MachineError;
use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No transitions defined. Add at least one transition")]
    NoTransitions,

    #[error("Initial state {0} is not an endpoint of any declared transition")]
    UnreachableInitialState(String),

    #[error(transparent)]
    Machine(#[from] MachineError),
}
