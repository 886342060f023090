//! Dispatch tables for entry, exit and transition handlers.

use super::registration::{Entry, HandlerList, Registration};
use super::{StateHandler, TransitionHandler};
use crate::core::State;
use std::collections::HashMap;
use std::sync::Arc;

type StateEntry<S> = Entry<dyn StateHandler<S>>;
type TransitionEntry<S> = Entry<dyn TransitionHandler<S>>;

/// Handler tables for one machine.
pub(crate) struct HandlerRegistry<S: State> {
    entering: HandlerList<dyn StateHandler<S>>,
    entering_state: HashMap<S, HandlerList<dyn StateHandler<S>>>,
    exiting: HandlerList<dyn StateHandler<S>>,
    exiting_state: HashMap<S, HandlerList<dyn StateHandler<S>>>,
    transition: HandlerList<dyn TransitionHandler<S>>,
    transition_edge: HashMap<(S, S), HandlerList<dyn TransitionHandler<S>>>,
}

impl<S: State> Default for HandlerRegistry<S> {
    fn default() -> Self {
        Self {
            entering: HandlerList::default(),
            entering_state: HashMap::new(),
            exiting: HandlerList::default(),
            exiting_state: HashMap::new(),
            transition: HandlerList::default(),
            transition_edge: HashMap::new(),
        }
    }
}

impl<S: State> HandlerRegistry<S> {
    pub(crate) fn on_entering(&mut self, handler: Arc<dyn StateHandler<S>>) -> Registration {
        self.entering.push(handler)
    }

    pub(crate) fn on_entering_state(
        &mut self,
        state: S,
        handler: Arc<dyn StateHandler<S>>,
    ) -> Registration {
        self.entering_state.entry(state).or_default().push(handler)
    }

    pub(crate) fn on_exiting(&mut self, handler: Arc<dyn StateHandler<S>>) -> Registration {
        self.exiting.push(handler)
    }

    pub(crate) fn on_exiting_state(
        &mut self,
        state: S,
        handler: Arc<dyn StateHandler<S>>,
    ) -> Registration {
        self.exiting_state.entry(state).or_default().push(handler)
    }

    pub(crate) fn on_transition(&mut self, handler: Arc<dyn TransitionHandler<S>>) -> Registration {
        self.transition.push(handler)
    }

    pub(crate) fn on_transition_between(
        &mut self,
        from: S,
        to: S,
        handler: Arc<dyn TransitionHandler<S>>,
    ) -> Registration {
        self.transition_edge
            .entry((from, to))
            .or_default()
            .push(handler)
    }

    /// Entry handlers for `state`: state-specific first, then global.
    pub(crate) fn entering_handlers(&self, state: &S) -> Vec<StateEntry<S>> {
        let mut out = Vec::new();
        if let Some(list) = self.entering_state.get(state) {
            list.snapshot_into(&mut out);
        }
        self.entering.snapshot_into(&mut out);
        out
    }

    /// Exit handlers for `state`: state-specific first, then global.
    pub(crate) fn exiting_handlers(&self, state: &S) -> Vec<StateEntry<S>> {
        let mut out = Vec::new();
        if let Some(list) = self.exiting_state.get(state) {
            list.snapshot_into(&mut out);
        }
        self.exiting.snapshot_into(&mut out);
        out
    }

    /// Transition handlers for the edge: edge-specific first, then global.
    ///
    /// Handlers attached to the edge in the graph are prepended by the
    /// caller.
    pub(crate) fn transition_handlers(&self, from: &S, to: &S) -> Vec<TransitionEntry<S>> {
        let mut out = Vec::new();
        if let Some(list) = self.transition_edge.get(&(from.clone(), to.clone())) {
            list.snapshot_into(&mut out);
        }
        self.transition.snapshot_into(&mut out);
        out
    }

    /// Drop released handlers and empty keyed tables.
    pub(crate) fn prune(&mut self) {
        self.entering.prune();
        self.exiting.prune();
        self.transition.prune();
        prune_keyed(&mut self.entering_state);
        prune_keyed(&mut self.exiting_state);
        prune_keyed(&mut self.transition_edge);
    }
}

fn prune_keyed<K, H: ?Sized>(table: &mut HashMap<K, HandlerList<H>>) {
    table.retain(|_, list| {
        list.prune();
        !list.is_empty()
    });
}
