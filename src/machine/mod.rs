//! The engine and its thread-safe wrapper.
//!
//! # Key Concepts
//!
//! - **StateMachine**: single-owner engine, mutated through `&mut self`
//! - **SharedStateMachine**: cloneable handle serializing access with a mutex
//!   and publishing lock-free snapshots of the current state and count
//! - **Errors**: `TransitionError` explains a rejected or failed transition,
//!   `MachineError` covers configuration and registration mistakes

mod engine;
mod error;
mod shared;

pub use engine::StateMachine;
pub use error::{MachineError, TransitionError};
pub use shared::SharedStateMachine;
