//! Core value types shared by every part of the engine.
//!
//! - State tokens via the `State` trait
//! - Committed-transition records and their bounded log

mod history;
mod state;

pub use history::{StateHistory, TransitionRecord};
pub use state::State;
