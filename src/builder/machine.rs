//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::config::MachineConfig;
use crate::core::State;
use crate::machine::StateMachine;

/// Builder for declaring a machine's graph with a fluent API.
///
/// # Example
///
/// ```
/// use switchyard::builder::StateMachineBuilder;
///
/// let machine = StateMachineBuilder::new()
///     .initial("draft")
///     .transition("draft", "review")
///     .transitions("review", ["draft", "published"])
///     .build()
///     .unwrap();
///
/// assert_eq!(machine.current_state(), Some(&"draft"));
/// assert_eq!(machine.edges().count(), 3);
/// ```
pub struct StateMachineBuilder<S: State> {
    initial: Option<S>,
    edges: Vec<(S, S)>,
    config: MachineConfig,
}

impl<S: State> StateMachineBuilder<S> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            edges: Vec::new(),
            config: MachineConfig::default(),
        }
    }

    /// Set the initial state (optional).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Allow `from -> to`.
    pub fn transition(mut self, from: S, to: S) -> Self {
        self.edges.push((from, to));
        self
    }

    /// Allow `from` to move to each of `to`.
    pub fn transitions<I>(mut self, from: S, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        self.edges
            .extend(to.into_iter().map(|target| (from.clone(), target)));
        self
    }

    /// Connect every listed state to every other, and to itself when
    /// `include_self` is set.
    pub fn all_transitions<I>(mut self, states: I, include_self: bool) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        let states: Vec<S> = states.into_iter().collect();
        for from in &states {
            for to in &states {
                if include_self || from != to {
                    self.edges.push((from.clone(), to.clone()));
                }
            }
        }
        self
    }

    /// Replace the default configuration.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the state machine.
    ///
    /// Fails if no transitions were declared, if the initial state is not an
    /// endpoint of any of them, or if the configuration is invalid.
    pub fn build(self) -> Result<StateMachine<S>, BuildError> {
        if self.edges.is_empty() {
            return Err(BuildError::NoTransitions);
        }

        if let Some(initial) = &self.initial {
            let connected = self
                .edges
                .iter()
                .any(|(from, to)| from == initial || to == initial);
            if !connected {
                return Err(BuildError::UnreachableInitialState(format!("{initial:?}")));
            }
        }

        let mut machine = StateMachine::with_config(self.config)?;
        for (from, to) in self.edges {
            machine.add_transition(from, to);
        }
        if let Some(initial) = self.initial {
            machine.set_initial_state(initial)?;
        }

        Ok(machine)
    }
}

impl<S: State> Default for StateMachineBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
