//! Thread-safe handle to a state machine.

use crate::core::State;
use crate::handlers::{
    DispatchError, Registration, SequenceHandler, StateHandler, TransitionHandler,
};
use crate::machine::engine::StateMachine;
use crate::machine::error::{MachineError, TransitionError};
use crate::routing::StateRouter;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};

/// Last published current state and transition count.
struct Snapshot<S> {
    current: Option<S>,
    count: u64,
}

impl<S: State> Snapshot<S> {
    fn of(machine: &StateMachine<S>) -> Self {
        Self {
            current: machine.current_state().cloned(),
            count: machine.transition_count(),
        }
    }
}

/// Exclusive access to the machine that publishes a snapshot when dropped,
/// including when a handler unwinds.
struct Publishing<'a, S: State> {
    machine: MutexGuard<'a, StateMachine<S>>,
    snapshot: &'a RwLock<Snapshot<S>>,
}

impl<S: State> Drop for Publishing<'_, S> {
    fn drop(&mut self) {
        let snapshot = Snapshot::of(&self.machine);
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

/// Cloneable, thread-safe wrapper around a [`StateMachine`].
///
/// Every mutating call locks one mutex for its whole duration, handlers
/// included. `current_state` and `transition_count` read a snapshot published
/// at the end of each mutating call, even one cut short by a panicking
/// handler, and never wait on that mutex. The state and count are published
/// together.
///
/// Handlers run on the calling thread with the mutex held: a slow handler
/// delays every other mutating call, and a handler must not call back into
/// the same `SharedStateMachine`, which would deadlock.
///
/// # Example
///
/// ```rust
/// use switchyard::{SharedStateMachine, StateMachine};
/// use std::thread;
///
/// let mut machine = StateMachine::with_initial(0u8);
/// machine.add_transition(0, 1);
/// let shared = SharedStateMachine::new(machine);
///
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let shared = shared.clone();
///         thread::spawn(move || shared.transition(1).unwrap())
///     })
///     .collect();
/// let successes = handles
///     .into_iter()
///     .map(|h| h.join().unwrap())
///     .filter(|moved| *moved)
///     .count();
///
/// assert_eq!(successes, 1);
/// assert_eq!(shared.transition_count(), 1);
/// ```
pub struct SharedStateMachine<S: State> {
    machine: Arc<Mutex<StateMachine<S>>>,
    snapshot: Arc<RwLock<Snapshot<S>>>,
}

impl<S: State> Clone for SharedStateMachine<S> {
    fn clone(&self) -> Self {
        Self {
            machine: Arc::clone(&self.machine),
            snapshot: Arc::clone(&self.snapshot),
        }
    }
}

impl<S: State> From<StateMachine<S>> for SharedStateMachine<S> {
    fn from(machine: StateMachine<S>) -> Self {
        Self::new(machine)
    }
}

impl<S: State> SharedStateMachine<S> {
    pub fn new(machine: StateMachine<S>) -> Self {
        let snapshot = Snapshot::of(&machine);
        Self {
            machine: Arc::new(Mutex::new(machine)),
            snapshot: Arc::new(RwLock::new(snapshot)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StateMachine<S>> {
        // A panicking handler poisons the mutex; the machine itself is still
        // consistent up to the phase that panicked.
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the machine, then publish the
    /// resulting snapshot.
    pub fn with<R>(&self, f: impl FnOnce(&mut StateMachine<S>) -> R) -> R {
        let mut access = Publishing {
            machine: self.lock(),
            snapshot: &self.snapshot,
        };
        f(&mut access.machine)
    }

    fn snapshot(&self) -> RwLockReadGuard<'_, Snapshot<S>> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state as of the last completed mutating call.
    pub fn current_state(&self) -> Option<S> {
        self.snapshot().current.clone()
    }

    /// Transition count as of the last completed mutating call.
    pub fn transition_count(&self) -> u64 {
        self.snapshot().count
    }

    /// Current state and transition count, published together.
    pub fn snapshot_state(&self) -> (Option<S>, u64) {
        let snapshot = self.snapshot();
        (snapshot.current.clone(), snapshot.count)
    }

    pub fn initial_state(&self) -> Option<S> {
        self.lock().initial_state().cloned()
    }

    pub fn set_initial_state(&self, state: S) -> Result<(), MachineError> {
        self.with(|m| m.set_initial_state(state))
    }

    /// See [`StateMachine::transition`].
    pub fn transition(&self, target: S) -> Result<bool, DispatchError> {
        self.with(|m| m.transition(target))
    }

    /// See [`StateMachine::try_transition`].
    pub fn try_transition(&self, target: S) -> Result<S, TransitionError<S>> {
        self.with(|m| m.try_transition(target))
    }

    pub fn reset(&self) {
        self.with(StateMachine::reset);
    }

    pub fn add_transition(&self, from: S, to: S) -> bool {
        self.with(|m| m.add_transition(from, to))
    }

    pub fn add_transition_with<H>(&self, from: S, to: S, handler: H) -> bool
    where
        H: TransitionHandler<S> + 'static,
    {
        self.with(|m| m.add_transition_with(from, to, handler))
    }

    pub fn add_transitions<I>(&self, from: S, to: I) -> bool
    where
        I: IntoIterator<Item = S>,
    {
        self.with(|m| m.add_transitions(from, to))
    }

    pub fn add_transitions_with<I, H>(&self, from: S, to: I, handler: H) -> bool
    where
        I: IntoIterator<Item = S>,
        H: TransitionHandler<S> + 'static,
    {
        self.with(|m| m.add_transitions_with(from, to, handler))
    }

    pub fn add_all_transitions<I>(&self, states: I, include_self: bool)
    where
        I: IntoIterator<Item = S>,
    {
        self.with(|m| m.add_all_transitions(states, include_self));
    }

    pub fn remove_transitions(&self, from: &S, to: &[S]) -> bool {
        self.with(|m| m.remove_transitions(from, to))
    }

    pub fn on_entering<H>(&self, handler: H) -> Registration
    where
        H: StateHandler<S> + 'static,
    {
        self.with(|m| m.on_entering(handler))
    }

    pub fn on_entering_state<H>(&self, state: S, handler: H) -> Registration
    where
        H: StateHandler<S> + 'static,
    {
        self.with(|m| m.on_entering_state(state, handler))
    }

    pub fn on_exiting<H>(&self, handler: H) -> Registration
    where
        H: StateHandler<S> + 'static,
    {
        self.with(|m| m.on_exiting(handler))
    }

    pub fn on_exiting_state<H>(&self, state: S, handler: H) -> Registration
    where
        H: StateHandler<S> + 'static,
    {
        self.with(|m| m.on_exiting_state(state, handler))
    }

    pub fn on_transition<H>(&self, handler: H) -> Registration
    where
        H: TransitionHandler<S> + 'static,
    {
        self.with(|m| m.on_transition(handler))
    }

    pub fn on_transition_between<H>(&self, from: S, to: S, handler: H) -> Registration
    where
        H: TransitionHandler<S> + 'static,
    {
        self.with(|m| m.on_transition_between(from, to, handler))
    }

    pub fn on_sequence<I, H>(&self, pattern: I, handler: H) -> Result<Registration, MachineError>
    where
        I: IntoIterator<Item = S>,
        H: SequenceHandler<S> + 'static,
    {
        self.with(|m| m.on_sequence(pattern, handler))
    }

    pub fn route_on_transition<R>(&self, router: R) -> Registration
    where
        R: StateRouter<S> + 'static,
    {
        self.with(|m| m.route_on_transition(router))
    }

    pub fn route_on_transition_between<R>(&self, from: S, to: S, router: R) -> Registration
    where
        R: StateRouter<S> + 'static,
    {
        self.with(|m| m.route_on_transition_between(from, to, router))
    }

    pub fn route_before_entering<R>(&self, to: S, router: R) -> Registration
    where
        R: StateRouter<S> + 'static,
    {
        self.with(|m| m.route_before_entering(to, router))
    }

    pub fn route_after_exiting<R>(&self, from: S, router: R) -> Registration
    where
        R: StateRouter<S> + 'static,
    {
        self.with(|m| m.route_after_exiting(from, router))
    }
}
