//! Builder API for ergonomic state machine construction.
//!
//! `StateMachineBuilder` declares a graph, initial state and configuration in
//! one expression and validates them together; `state_enum!` removes the
//! derive boilerplate for simple enum states.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
