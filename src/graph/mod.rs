//! The transition graph: known states, legal edges, and handlers attached
//! directly to edges.

use crate::core::State;
use crate::handlers::{Entry, HandlerList, TransitionHandler};
use std::collections::{HashMap, HashSet};

type EdgeHandlers<S> = HandlerList<dyn TransitionHandler<S>>;

/// Adjacency of allowed transitions.
///
/// Every endpoint of every edge is a known state. States can also become
/// known without edges, for example by being set as the initial state.
pub(crate) struct TransitionGraph<S: State> {
    known: HashSet<S>,
    edges: HashMap<S, HashMap<S, EdgeHandlers<S>>>,
}

impl<S: State> Default for TransitionGraph<S> {
    fn default() -> Self {
        Self {
            known: HashSet::new(),
            edges: HashMap::new(),
        }
    }
}

impl<S: State> TransitionGraph<S> {
    /// Mark a state as known.
    pub(crate) fn observe(&mut self, state: &S) {
        if !self.known.contains(state) {
            self.known.insert(state.clone());
        }
    }

    /// Add the edge `(from, to)`. Returns `false` if it already existed.
    pub(crate) fn add(&mut self, from: S, to: S) -> bool {
        self.edge_mut(from, to).1
    }

    /// Add the edge and attach `handler` to it, whether or not the edge
    /// is new. Returns `false` if the edge already existed.
    pub(crate) fn add_with(
        &mut self,
        from: S,
        to: S,
        handler: Entry<dyn TransitionHandler<S>>,
    ) -> bool {
        let (handlers, added) = self.edge_mut(from, to);
        handlers.push_entry(handler);
        added
    }

    fn edge_mut(&mut self, from: S, to: S) -> (&mut EdgeHandlers<S>, bool) {
        self.observe(&from);
        self.observe(&to);
        let targets = self.edges.entry(from).or_default();
        let added = !targets.contains_key(&to);
        (targets.entry(to).or_default(), added)
    }

    /// Remove the edges from `from` to each of `to`. Returns `true` if at
    /// least one edge existed. Handlers attached to removed edges are
    /// dropped; the endpoint states stay known.
    pub(crate) fn remove<'a, I>(&mut self, from: &S, to: I) -> bool
    where
        I: IntoIterator<Item = &'a S>,
    {
        let Some(targets) = self.edges.get_mut(from) else {
            return false;
        };
        let mut removed = false;
        for target in to {
            removed |= targets.remove(target).is_some();
        }
        if targets.is_empty() {
            self.edges.remove(from);
        }
        removed
    }

    pub(crate) fn contains(&self, from: &S, to: &S) -> bool {
        self.edges
            .get(from)
            .is_some_and(|targets| targets.contains_key(to))
    }

    /// Whether a move from `current` to `to` is legal. The first move, from
    /// no state, is unconstrained.
    pub(crate) fn allows(&self, current: Option<&S>, to: &S) -> bool {
        current.is_none_or(|from| self.contains(from, to))
    }

    pub(crate) fn handlers(&self, from: &S, to: &S) -> Vec<Entry<dyn TransitionHandler<S>>> {
        let mut out = Vec::new();
        if let Some(handlers) = self.edges.get(from).and_then(|targets| targets.get(to)) {
            handlers.snapshot_into(&mut out);
        }
        out
    }

    pub(crate) fn known_states(&self) -> impl Iterator<Item = &S> {
        self.known.iter()
    }

    #[cfg(test)]
    pub(crate) fn known_count(&self) -> usize {
        self.known.len()
    }

    pub(crate) fn targets_of(&self, from: &S) -> impl Iterator<Item = &S> {
        self.edges
            .get(from)
            .into_iter()
            .flat_map(|targets| targets.keys())
    }

    pub(crate) fn edges(&self) -> impl Iterator<Item = (&S, &S)> {
        self.edges
            .iter()
            .flat_map(|(from, targets)| targets.keys().map(move |to| (from, to)))
    }

    #[cfg(test)]
    pub(crate) fn edge_count(&self) -> usize {
        self.edges.values().map(HashMap::len).sum()
    }

    pub(crate) fn prune(&mut self) {
        for targets in self.edges.values_mut() {
            for handlers in targets.values_mut() {
                handlers.prune();
            }
        }
    }
}
