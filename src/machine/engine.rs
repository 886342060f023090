//! The state machine engine.

use crate::config::MachineConfig;
use crate::core::{State, StateHistory, TransitionRecord};
use crate::graph::TransitionGraph;
use crate::handlers::{
    dispatch, DispatchError, Entry, HandlerRegistry, Phase, Registration, SequenceHandler,
    StateHandler, TransitionHandler,
};
use crate::machine::error::{MachineError, TransitionError};
use crate::routing::{RouterChain, StateRouter};
use crate::sequence::{Pattern, SequenceDetector};
use chrono::Utc;
use std::sync::Arc;

/// A finite state machine over states of type `S`.
///
/// The machine owns the transition graph, the handler and router tables,
/// the sequence detector, and the bookkeeping (current and initial state,
/// transition count, transition records). All mutation goes through
/// `&mut self`; wrap the machine in a
/// [`SharedStateMachine`](crate::SharedStateMachine) to drive it from
/// several threads.
///
/// # Transition order
///
/// [`transition`](Self::transition) runs these steps, stopping at the first
/// that fails:
///
/// 1. Legality: `(current, requested)` must be an edge, unless the machine
///    has no current state yet. Nothing else runs if this fails.
/// 2. Routing: routers resolve the actual destination (see
///    [`routing`](crate::routing)). A redirected destination must itself be
///    an edge from the current state.
/// 3. Exit handlers of the current state, state-specific then global.
/// 4. Commit: the current state, transition count, records and sequence
///    window are updated.
/// 5. Entry handlers of the new state, state-specific then global.
/// 6. Transition handlers: attached to the edge, registered for the edge,
///    then global.
/// 7. Sequence handlers whose pattern matches the tail of the entered states.
///
/// Exit and transition handlers are skipped on the first move, which has no
/// source state. The first handler to fail aborts the rest of the dispatch.
///
/// # Example
///
/// ```rust
/// use switchyard::StateMachine;
///
/// let mut machine = StateMachine::with_initial("locked");
/// machine.add_transition("locked", "unlocked");
/// machine.add_transition("unlocked", "locked");
///
/// assert_eq!(machine.transition("unlocked"), Ok(true));
/// assert_eq!(machine.transition("unlocked"), Ok(false)); // no self edge
/// assert_eq!(machine.current_state(), Some(&"unlocked"));
/// assert_eq!(machine.transition_count(), 1);
/// ```
pub struct StateMachine<S: State> {
    config: MachineConfig,
    graph: TransitionGraph<S>,
    handlers: HandlerRegistry<S>,
    routers: RouterChain<S>,
    sequences: SequenceDetector<S>,
    current: Option<S>,
    initial: Option<S>,
    count: u64,
    history: StateHistory<S>,
}

impl<S: State> Default for StateMachine<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateMachine<S> {
    /// Create a machine with no current state and the default configuration.
    ///
    /// The first transition may go to any state.
    pub fn new() -> Self {
        Self::build(MachineConfig::default())
    }

    /// Create a machine whose initial and current state is `initial`.
    pub fn with_initial(initial: S) -> Self {
        let mut machine = Self::new();
        machine.graph.observe(&initial);
        machine.current = Some(initial.clone());
        machine.initial = Some(initial);
        machine
    }

    /// Create a machine with a validated configuration.
    pub fn with_config(config: MachineConfig) -> Result<Self, MachineError> {
        config.check().map_err(MachineError::InvalidConfig)?;
        Ok(Self::build(config))
    }

    fn build(config: MachineConfig) -> Self {
        Self {
            history: StateHistory::with_capacity(config.record_capacity),
            config,
            graph: TransitionGraph::default(),
            handlers: HandlerRegistry::default(),
            routers: RouterChain::default(),
            sequences: SequenceDetector::default(),
            current: None,
            initial: None,
            count: 0,
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// The current state, `None` until an initial state or first transition.
    pub fn current_state(&self) -> Option<&S> {
        self.current.as_ref()
    }

    pub fn initial_state(&self) -> Option<&S> {
        self.initial.as_ref()
    }

    /// Set the state [`reset`](Self::reset) returns to.
    ///
    /// Only allowed while the transition count is zero; the machine's current
    /// state moves to the new initial state as well. Fails with
    /// [`MachineError::InitialStateFrozen`] once a transition has happened.
    pub fn set_initial_state(&mut self, state: S) -> Result<(), MachineError> {
        if self.count > 0 {
            return Err(MachineError::InitialStateFrozen {
                transitions: self.count,
            });
        }
        self.graph.observe(&state);
        self.current = Some(state.clone());
        self.initial = Some(state);
        Ok(())
    }

    /// Successful transitions since creation or the last reset.
    pub fn transition_count(&self) -> u64 {
        self.count
    }

    /// Log of committed transitions, bounded by the configured capacity.
    pub fn history(&self) -> &StateHistory<S> {
        &self.history
    }

    /// Every state the machine has seen, in no particular order.
    pub fn known_states(&self) -> impl Iterator<Item = &S> {
        self.graph.known_states()
    }

    /// Every declared edge, in no particular order.
    pub fn edges(&self) -> impl Iterator<Item = (&S, &S)> {
        self.graph.edges()
    }

    /// States reachable from `from` in one transition.
    pub fn targets_of(&self, from: &S) -> impl Iterator<Item = &S> {
        self.graph.targets_of(from)
    }

    pub fn has_transition(&self, from: &S, to: &S) -> bool {
        self.graph.contains(from, to)
    }

    /// Whether a request for `to` would pass the legality check from the
    /// current state. Routing may still redirect or reject it.
    pub fn can_transition(&self, to: &S) -> bool {
        self.graph.allows(self.current.as_ref(), to)
    }

    // ---- graph ----------------------------------------------------------

    /// Allow `from -> to`. Returns `false` if the edge already existed.
    pub fn add_transition(&mut self, from: S, to: S) -> bool {
        self.graph.add(from, to)
    }

    /// Allow `from -> to` and attach `handler` to the edge.
    ///
    /// The handler is attached even when the edge already existed, and is
    /// dropped when the edge is removed. Returns `false` if the edge already
    /// existed.
    pub fn add_transition_with<H>(&mut self, from: S, to: S, handler: H) -> bool
    where
        H: TransitionHandler<S> + 'static,
    {
        self.add_transitions_with(from, [to], handler)
    }

    /// Allow `from` to move to each of `to`. Returns `true` if at least one
    /// edge was new.
    pub fn add_transitions<I>(&mut self, from: S, to: I) -> bool
    where
        I: IntoIterator<Item = S>,
    {
        let mut added = false;
        for target in to {
            added |= self.graph.add(from.clone(), target);
        }
        added
    }

    /// Like [`add_transitions`](Self::add_transitions), attaching one shared
    /// `handler` to every listed edge.
    pub fn add_transitions_with<I, H>(&mut self, from: S, to: I, handler: H) -> bool
    where
        I: IntoIterator<Item = S>,
        H: TransitionHandler<S> + 'static,
    {
        let entry: Entry<dyn TransitionHandler<S>> = Entry {
            registration: Registration::new(),
            handler: Arc::new(handler),
        };
        let mut added = false;
        for target in to {
            added |= self.graph.add_with(from.clone(), target, entry.clone());
        }
        added
    }

    /// Connect every listed state to every other one, and to itself when
    /// `include_self` is set.
    pub fn add_all_transitions<I>(&mut self, states: I, include_self: bool)
    where
        I: IntoIterator<Item = S>,
    {
        let states: Vec<S> = states.into_iter().collect();
        for from in &states {
            for to in &states {
                if include_self || from != to {
                    self.graph.add(from.clone(), to.clone());
                }
            }
        }
    }

    /// Remove the edges from `from` to each of `to`. Returns `true` if at
    /// least one existed.
    pub fn remove_transitions(&mut self, from: &S, to: &[S]) -> bool {
        self.graph.remove(from, to)
    }

    // ---- handlers -------------------------------------------------------

    /// Call `handler` whenever any state is entered.
    pub fn on_entering<H>(&mut self, handler: H) -> Registration
    where
        H: StateHandler<S> + 'static,
    {
        self.prune();
        self.handlers.on_entering(Arc::new(handler))
    }

    /// Call `handler` whenever `state` is entered.
    pub fn on_entering_state<H>(&mut self, state: S, handler: H) -> Registration
    where
        H: StateHandler<S> + 'static,
    {
        self.prune();
        self.handlers.on_entering_state(state, Arc::new(handler))
    }

    /// Call `handler` whenever any state is exited.
    pub fn on_exiting<H>(&mut self, handler: H) -> Registration
    where
        H: StateHandler<S> + 'static,
    {
        self.prune();
        self.handlers.on_exiting(Arc::new(handler))
    }

    /// Call `handler` whenever `state` is exited.
    pub fn on_exiting_state<H>(&mut self, state: S, handler: H) -> Registration
    where
        H: StateHandler<S> + 'static,
    {
        self.prune();
        self.handlers.on_exiting_state(state, Arc::new(handler))
    }

    /// Call `handler` on every transition.
    pub fn on_transition<H>(&mut self, handler: H) -> Registration
    where
        H: TransitionHandler<S> + 'static,
    {
        self.prune();
        self.handlers.on_transition(Arc::new(handler))
    }

    /// Call `handler` whenever the machine moves from `from` to `to`.
    pub fn on_transition_between<H>(&mut self, from: S, to: S, handler: H) -> Registration
    where
        H: TransitionHandler<S> + 'static,
    {
        self.prune();
        self.handlers
            .on_transition_between(from, to, Arc::new(handler))
    }

    /// Call `handler` each time the most recently entered states equal
    /// `pattern`. Overlapping occurrences each fire.
    ///
    /// Fails with [`MachineError::EmptyPattern`] for an empty pattern.
    pub fn on_sequence<I, H>(
        &mut self,
        pattern: I,
        handler: H,
    ) -> Result<Registration, MachineError>
    where
        I: IntoIterator<Item = S>,
        H: SequenceHandler<S> + 'static,
    {
        let pattern: Vec<S> = pattern.into_iter().collect();
        if pattern.is_empty() {
            return Err(MachineError::EmptyPattern);
        }
        self.prune();
        tracing::trace!(len = pattern.len(), "sequence pattern registered");
        Ok(self.sequences.register(pattern, Arc::new(handler)))
    }

    // ---- routers --------------------------------------------------------

    /// Route every transition through `router`.
    pub fn route_on_transition<R>(&mut self, router: R) -> Registration
    where
        R: StateRouter<S> + 'static,
    {
        self.prune();
        self.routers.route_on_transition(Arc::new(router))
    }

    /// Route transitions whose resolved edge is `from -> to` through `router`.
    pub fn route_on_transition_between<R>(&mut self, from: S, to: S, router: R) -> Registration
    where
        R: StateRouter<S> + 'static,
    {
        self.prune();
        self.routers
            .route_on_transition_between(from, to, Arc::new(router))
    }

    /// Route transitions whose resolved destination is `to` through `router`.
    pub fn route_before_entering<R>(&mut self, to: S, router: R) -> Registration
    where
        R: StateRouter<S> + 'static,
    {
        self.prune();
        self.routers.route_before_entering(to, Arc::new(router))
    }

    /// Route transitions leaving `from` through `router`.
    pub fn route_after_exiting<R>(&mut self, from: S, router: R) -> Registration
    where
        R: StateRouter<S> + 'static,
    {
        self.prune();
        self.routers.route_after_exiting(from, Arc::new(router))
    }

    // ---- lifecycle ------------------------------------------------------

    /// Return to the initial state, zero the transition count, and forget
    /// the transition records and sequence window. No handlers fire.
    pub fn reset(&mut self) {
        tracing::debug!(initial = ?self.initial, transitions = self.count, "machine reset");
        self.current = self.initial.clone();
        self.count = 0;
        self.history.clear();
        self.sequences.clear();
        self.prune();
    }

    /// Request a move to `target`.
    ///
    /// Returns `Ok(true)` when the machine moved, `Ok(false)` when the move
    /// was rejected by the graph or the routers (nothing changed and no
    /// handler fired), and `Err` when a handler failed. Check
    /// [`DispatchError::committed`] to learn whether the state changed
    /// before the failure.
    pub fn transition(&mut self, target: S) -> Result<bool, DispatchError> {
        match self.try_transition(target) {
            Ok(_) => Ok(true),
            Err(TransitionError::Dispatch(err)) => Err(err),
            Err(_) => Ok(false),
        }
    }

    /// Like [`transition`](Self::transition), returning the state actually
    /// entered or the precise reason for rejection.
    pub fn try_transition(&mut self, target: S) -> Result<S, TransitionError<S>> {
        let current = self.current.clone();

        if !self.graph.allows(current.as_ref(), &target) {
            tracing::debug!(from = ?current, to = ?target, "illegal transition rejected");
            return Err(TransitionError::Illegal {
                from: current,
                to: target,
            });
        }

        let resolved = self.resolve(current.as_ref(), &target)?;

        if let Some(from) = &current {
            let exiting = self.handlers.exiting_handlers(from);
            dispatch(&exiting, Phase::Exiting, |h| h.on_state(from))?;
        }

        let matches = self.commit(current.clone(), target, resolved.clone());

        let entering = self.handlers.entering_handlers(&resolved);
        dispatch(&entering, Phase::Entering, |h| h.on_state(&resolved))?;

        if let Some(from) = &current {
            let mut edge = self.graph.handlers(from, &resolved);
            edge.extend(self.handlers.transition_handlers(from, &resolved));
            dispatch(&edge, Phase::Transition, |h| h.on_transition(from, &resolved))?;
        }

        let sequences = &mut self.sequences;
        dispatch(&matches, Phase::Sequence, |pattern| {
            let matched = sequences.tail(pattern.states().len());
            pattern.handler().on_match(matched)
        })?;

        Ok(resolved)
    }

    /// Run the router chain and check the routed edge.
    fn resolve(&self, current: Option<&S>, requested: &S) -> Result<S, TransitionError<S>> {
        let limit = self.config.max_routing_passes;
        let resolved = match self.routers.resolve(current, requested, limit) {
            Ok(resolved) => resolved,
            Err(diverged) => {
                tracing::warn!(
                    from = ?current,
                    requested = ?requested,
                    last = ?diverged.last,
                    passes = diverged.passes,
                    "router chain did not settle; transition rejected"
                );
                return Err(TransitionError::RoutingDiverged {
                    from: current.cloned(),
                    requested: requested.clone(),
                    last: diverged.last,
                    passes: diverged.passes,
                });
            }
        };

        if resolved != *requested && !self.graph.allows(current, &resolved) {
            tracing::debug!(
                from = ?current,
                requested = ?requested,
                routed = ?resolved,
                "routed destination is not an edge; transition rejected"
            );
            return Err(TransitionError::RoutedOffGraph {
                from: current.cloned(),
                requested: requested.clone(),
                routed: resolved,
            });
        }
        Ok(resolved)
    }

    /// Apply a resolved transition to the bookkeeping.
    fn commit(&mut self, from: Option<S>, requested: S, to: S) -> Vec<Entry<Pattern<S>>> {
        self.graph.observe(&to);
        self.current = Some(to.clone());
        self.count += 1;
        tracing::debug!(from = ?from, to = ?to, count = self.count, "transition committed");
        self.history.push(TransitionRecord {
            from,
            requested,
            to: to.clone(),
            timestamp: Utc::now(),
            sequence: self.count,
        });
        let matches = self.sequences.record(to);
        debug_assert_eq!(self.sequences.entered(), self.count);
        matches
    }

    fn prune(&mut self) {
        self.graph.prune();
        self.handlers.prune();
        self.routers.prune();
        self.sequences.prune();
    }
}
