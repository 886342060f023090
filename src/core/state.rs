//! The state token trait.
//!
//! The engine imposes no structure on states: any value that can be cloned,
//! compared, hashed and debug-printed can name a state. Two tokens name the
//! same state exactly when they compare equal.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state machine states.
///
/// Blanket-implemented for every type that satisfies the bounds, so enums,
/// integers and string slices can all be used directly.
///
/// # Required Traits
///
/// - `Clone`: states are copied into history and handed to handlers
/// - `Eq` + `Hash`: states key the transition graph and handler tables
/// - `Debug`: states appear in diagnostics and error messages
/// - `Send` + `Sync`: machines can be shared across threads
///
/// # Example
///
/// ```rust
/// use switchyard::core::State;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum TaskState {
///     Pending,
///     Running,
/// }
///
/// fn assert_state<S: State>(_: &S) {}
///
/// assert_state(&TaskState::Pending);
/// assert_state(&"running");
/// assert_state(&42u32);
/// ```
pub trait State: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> State for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}
