//! Entry, exit, transition and sequence callbacks.
//!
//! Each callback kind is a capability trait with a single method.
//! Closures with the matching signature implement the traits directly, so
//! most callers never name them.
//!
//! Handlers are stored in per-phase dispatch tables, globally and keyed by
//! state or edge. Within a phase, keyed handlers run before global ones and
//! each group runs in registration order.

mod error;
mod registration;
mod registry;

pub use error::{DispatchError, HandlerError, HandlerResult, Phase};
pub use registration::Registration;

pub(crate) use registration::{dispatch, Entry, HandlerList};
pub(crate) use registry::HandlerRegistry;

/// Callback fired when a state is entered or exited.
pub trait StateHandler<S>: Send + Sync {
    fn on_state(&self, state: &S) -> HandlerResult;
}

impl<S, F> StateHandler<S> for F
where
    F: Fn(&S) -> HandlerResult + Send + Sync,
{
    fn on_state(&self, state: &S) -> HandlerResult {
        self(state)
    }
}

/// Callback fired when an edge is traversed.
pub trait TransitionHandler<S>: Send + Sync {
    fn on_transition(&self, from: &S, to: &S) -> HandlerResult;
}

impl<S, F> TransitionHandler<S> for F
where
    F: Fn(&S, &S) -> HandlerResult + Send + Sync,
{
    fn on_transition(&self, from: &S, to: &S) -> HandlerResult {
        self(from, to)
    }
}

/// Callback fired when the tail of the entered-state history matches a
/// registered pattern. Receives the matched states.
pub trait SequenceHandler<S>: Send + Sync {
    fn on_match(&self, matched: &[S]) -> HandlerResult;
}

impl<S, F> SequenceHandler<S> for F
where
    F: Fn(&[S]) -> HandlerResult + Send + Sync,
{
    fn on_match(&self, matched: &[S]) -> HandlerResult {
        self(matched)
    }
}
