//! Switchyard: an event-driven finite state machine engine.
//!
//! A machine holds a directed graph of allowed transitions over any
//! hashable state type and runs callbacks as it moves through it.
//!
//! # Core Concepts
//!
//! - **State**: any `Clone + Eq + Hash + Debug` value that is `Send + Sync`
//! - **Transition graph**: the set of allowed `from -> to` edges; a request
//!   outside the graph is rejected without side effects
//! - **Handlers**: entry, exit, transition and sequence callbacks, each
//!   returning a [`Registration`] that can release it
//! - **Routers**: callbacks that redirect a transition in flight, resolved to
//!   a fixed point within a bounded number of passes
//! - **Records**: a bounded log of committed transitions with timestamps
//!
//! # Example
//!
//! ```rust
//! use switchyard::{HandlerResult, StateMachine};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum Door {
//!     Closed,
//!     Open,
//!     Locked,
//! }
//!
//! let mut machine = StateMachine::with_initial(Door::Closed);
//! machine.add_transitions(Door::Closed, [Door::Open, Door::Locked]);
//! machine.add_transition(Door::Open, Door::Closed);
//! machine.add_transition(Door::Locked, Door::Closed);
//!
//! let opened = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&opened);
//! let registration = machine.on_entering_state(Door::Open, move |_: &Door| -> HandlerResult {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! assert_eq!(machine.transition(Door::Open), Ok(true));
//! assert_eq!(machine.transition(Door::Locked), Ok(false));
//! assert_eq!(machine.transition(Door::Closed), Ok(true));
//!
//! registration.release();
//! assert_eq!(machine.transition(Door::Open), Ok(true));
//!
//! assert_eq!(opened.load(Ordering::SeqCst), 1);
//! assert_eq!(machine.transition_count(), 3);
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub(crate) mod graph;
pub mod handlers;
pub mod machine;
pub mod routing;
pub(crate) mod sequence;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder};
pub use config::MachineConfig;
pub use core::{State, StateHistory, TransitionRecord};
pub use handlers::{
    DispatchError, HandlerError, HandlerResult, Phase, Registration, SequenceHandler,
    StateHandler, TransitionHandler,
};
pub use machine::{MachineError, SharedStateMachine, StateMachine, TransitionError};
pub use routing::StateRouter;
