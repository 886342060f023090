//! Revocable registration handles and the lists they index into.

use super::error::{DispatchError, HandlerResult, Phase};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_REGISTRATION_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned by every handler and router registration.
///
/// Holding the handle is the only way to remove the registered callback.
/// Clones share the same registration, so releasing any clone releases it.
/// Release takes effect immediately: a released callback is skipped even if
/// the transition currently being dispatched has not reached it yet.
///
/// # Example
///
/// ```rust
/// use switchyard::{HandlerResult, StateMachine};
///
/// let mut machine = StateMachine::new();
/// let registration = machine.on_entering(|_: &u8| -> HandlerResult { Ok(()) });
///
/// assert!(registration.release());
/// assert!(!registration.release()); // already released
/// assert!(!registration.is_active());
/// ```
#[derive(Clone, Debug)]
pub struct Registration {
    id: u64,
    active: Arc<AtomicBool>,
}

impl Registration {
    pub(crate) fn new() -> Self {
        Self {
            id: NEXT_REGISTRATION_ID.fetch_add(1, Ordering::Relaxed),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Deregister the callback.
    ///
    /// Returns `true` if this call performed the release, `false` if the
    /// registration had already been released.
    pub fn release(&self) -> bool {
        let released = self.active.swap(false, Ordering::AcqRel);
        if released {
            tracing::trace!(registration = self.id, "registration released");
        }
        released
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Process-unique identifier of this registration.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for Registration {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Registration {}

impl Hash for Registration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A registered callback together with its liveness handle.
pub(crate) struct Entry<H: ?Sized> {
    pub(crate) registration: Registration,
    pub(crate) handler: Arc<H>,
}

impl<H: ?Sized> Clone for Entry<H> {
    fn clone(&self) -> Self {
        Self {
            registration: self.registration.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H: ?Sized> Entry<H> {
    pub(crate) fn is_active(&self) -> bool {
        self.registration.is_active()
    }
}

/// Callbacks of one kind, in registration order.
pub(crate) struct HandlerList<H: ?Sized> {
    entries: Vec<Entry<H>>,
}

impl<H: ?Sized> Default for HandlerList<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H: ?Sized> HandlerList<H> {
    pub(crate) fn push(&mut self, handler: Arc<H>) -> Registration {
        let registration = Registration::new();
        self.push_entry(Entry {
            registration: registration.clone(),
            handler,
        });
        registration
    }

    pub(crate) fn push_entry(&mut self, entry: Entry<H>) {
        self.prune();
        self.entries.push(entry);
    }

    /// Drop released entries.
    pub(crate) fn prune(&mut self) {
        self.entries.retain(Entry::is_active);
    }

    pub(crate) fn is_empty(&self) -> bool {
        !self.entries.iter().any(Entry::is_active)
    }

    pub(crate) fn live(&self) -> impl Iterator<Item = &Entry<H>> {
        self.entries.iter().filter(|e| e.is_active())
    }

    /// Append clones of the live entries to `out`.
    pub(crate) fn snapshot_into(&self, out: &mut Vec<Entry<H>>) {
        out.extend(self.live().cloned());
    }
}

/// Invoke each entry still active at the moment it is reached.
///
/// Stops at the first failure and reports it against `phase`.
pub(crate) fn dispatch<H, F>(
    entries: &[Entry<H>],
    phase: Phase,
    mut call: F,
) -> Result<(), DispatchError>
where
    H: ?Sized,
    F: FnMut(&H) -> HandlerResult,
{
    for entry in entries {
        if !entry.is_active() {
            continue;
        }
        call(&entry.handler).map_err(|source| DispatchError { phase, source })?;
    }
    Ok(())
}
