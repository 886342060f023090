//! Routers: callbacks that rewrite the destination of a transition in flight.
//!
//! Three hook points are available:
//!
//! - **after exiting** a given source state
//! - **on transition**, for one edge or for every edge
//! - **before entering** a given target state
//!
//! Resolution is a bounded fixed-point loop. Each pass applies, in order,
//! the after-exiting routers of the current state, the edge-specific and then
//! global on-transition routers, and the before-entering routers of the
//! target. Keyed tables are looked up when their scope is reached, so a
//! redirect made earlier in the pass selects which edge and before-entering
//! routers run. Every router receives the previous router's output. Passes
//! repeat until one leaves the target unchanged. A pass starting from a
//! target that an earlier pass started from is a cycle and fails, as does
//! exceeding the configured pass limit.

use crate::core::State;
use crate::handlers::{HandlerList, Registration};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Decides where an in-flight transition actually goes.
///
/// `current` is the state being left (`None` on the machine's first move)
/// and `next` the destination proposed so far. Returning `None`, or `next`
/// itself, leaves the destination unchanged.
pub trait StateRouter<S>: Send + Sync {
    fn route(&self, current: Option<&S>, next: &S) -> Option<S>;
}

impl<S, F> StateRouter<S> for F
where
    F: Fn(Option<&S>, &S) -> Option<S> + Send + Sync,
{
    fn route(&self, current: Option<&S>, next: &S) -> Option<S> {
        self(current, next)
    }
}

/// The router chain revisited a target or ran out of passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Diverged<S> {
    pub(crate) last: S,
    pub(crate) passes: usize,
}

type RouterList<S> = HandlerList<dyn StateRouter<S>>;

pub(crate) struct RouterChain<S: State> {
    after_exiting: HashMap<S, RouterList<S>>,
    on_transition: RouterList<S>,
    on_transition_edge: HashMap<(S, S), RouterList<S>>,
    before_entering: HashMap<S, RouterList<S>>,
}

impl<S: State> Default for RouterChain<S> {
    fn default() -> Self {
        Self {
            after_exiting: HashMap::new(),
            on_transition: HandlerList::default(),
            on_transition_edge: HashMap::new(),
            before_entering: HashMap::new(),
        }
    }
}

impl<S: State> RouterChain<S> {
    pub(crate) fn route_after_exiting(
        &mut self,
        from: S,
        router: Arc<dyn StateRouter<S>>,
    ) -> Registration {
        self.after_exiting.entry(from).or_default().push(router)
    }

    pub(crate) fn route_on_transition(&mut self, router: Arc<dyn StateRouter<S>>) -> Registration {
        self.on_transition.push(router)
    }

    pub(crate) fn route_on_transition_between(
        &mut self,
        from: S,
        to: S,
        router: Arc<dyn StateRouter<S>>,
    ) -> Registration {
        self.on_transition_edge
            .entry((from, to))
            .or_default()
            .push(router)
    }

    pub(crate) fn route_before_entering(
        &mut self,
        to: S,
        router: Arc<dyn StateRouter<S>>,
    ) -> Registration {
        self.before_entering.entry(to).or_default().push(router)
    }

    fn is_empty(&self) -> bool {
        self.on_transition.is_empty()
            && self.after_exiting.values().all(HandlerList::is_empty)
            && self.on_transition_edge.values().all(HandlerList::is_empty)
            && self.before_entering.values().all(HandlerList::is_empty)
    }

    /// Resolve the destination of a move from `current` toward `requested`.
    ///
    /// Fails when a pass starts from a target an earlier pass already
    /// started from, or when `max_passes` passes ran without settling.
    pub(crate) fn resolve(
        &self,
        current: Option<&S>,
        requested: &S,
        max_passes: Option<usize>,
    ) -> Result<S, Diverged<S>> {
        let mut target = requested.clone();
        if self.is_empty() {
            return Ok(target);
        }

        let mut seen = HashSet::new();
        let mut passes = 0;
        loop {
            if max_passes.is_some_and(|max| passes >= max) || !seen.insert(target.clone()) {
                return Err(Diverged {
                    last: target,
                    passes,
                });
            }
            passes += 1;
            let start = target.clone();

            if let Some(from) = current {
                target = apply(self.after_exiting.get(from), current, target);
                let edge = (from.clone(), target.clone());
                target = apply(self.on_transition_edge.get(&edge), current, target);
            }
            target = apply(Some(&self.on_transition), current, target);
            target = apply(self.before_entering.get(&target), current, target);

            if target == start {
                tracing::trace!(?requested, resolved = ?target, passes, "routing settled");
                return Ok(target);
            }
        }
    }

    /// Drop released routers and empty keyed tables.
    pub(crate) fn prune(&mut self) {
        self.on_transition.prune();
        prune_keyed(&mut self.after_exiting);
        prune_keyed(&mut self.on_transition_edge);
        prune_keyed(&mut self.before_entering);
    }
}

/// Feed `target` through every live router in `list`, in registration order.
fn apply<S: State>(list: Option<&RouterList<S>>, current: Option<&S>, mut target: S) -> S {
    let Some(list) = list else {
        return target;
    };
    for entry in list.live() {
        if let Some(next) = entry.handler.route(current, &target) {
            if next != target {
                tracing::trace!(
                    from = ?current,
                    proposed = ?target,
                    routed = ?next,
                    "router redirected"
                );
                target = next;
            }
        }
    }
    target
}

fn prune_keyed<K, S: State>(table: &mut HashMap<K, RouterList<S>>) {
    table.retain(|_, list| {
        list.prune();
        !list.is_empty()
    });
}
