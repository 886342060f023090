//! Handler failure types.

use std::fmt;
use thiserror::Error;

/// Error returned by a handler to signal that it failed.
///
/// # Example
///
/// ```rust
/// use switchyard::handlers::HandlerError;
///
/// let err = HandlerError::new("audit log unavailable");
/// assert_eq!(err.to_string(), "audit log unavailable");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type returned by every handler.
pub type HandlerResult = Result<(), HandlerError>;

/// Dispatch phase of a transition, in the order phases run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Exit handlers of the state being left
    Exiting,
    /// Entry handlers of the state being entered
    Entering,
    /// Handlers bound to the traversed edge
    Transition,
    /// Sequence pattern handlers
    Sequence,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exiting => "exiting",
            Self::Entering => "entering",
            Self::Transition => "transition",
            Self::Sequence => "sequence",
        };
        f.write_str(name)
    }
}

/// A handler failed while a transition was being dispatched.
///
/// Handlers after the failing one, in the same phase and in later phases,
/// were not invoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{phase} handler failed: {source}")]
pub struct DispatchError {
    pub phase: Phase,
    #[source]
    pub source: HandlerError,
}

impl DispatchError {
    /// Whether the failure happened after the new state was committed.
    ///
    /// Exit handlers run before the commit; every other phase runs after it.
    pub fn committed(&self) -> bool {
        self.phase != Phase::Exiting
    }
}
