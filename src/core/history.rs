//! Transition record log.
//!
//! Every committed transition leaves a [`TransitionRecord`] in the machine's
//! [`StateHistory`]. The log is bounded: once it reaches capacity the oldest
//! record is dropped, and the number of dropped records is kept so that
//! sequence numbers stay meaningful.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single committed transition.
///
/// `requested` is the state the caller asked for; `to` is where routing
/// actually landed. They differ whenever a router redirected the move.
///
/// # Example
///
/// ```rust
/// use switchyard::core::TransitionRecord;
/// use chrono::Utc;
///
/// let record = TransitionRecord {
///     from: Some("idle"),
///     requested: "busy",
///     to: "busy",
///     timestamp: Utc::now(),
///     sequence: 1,
/// };
/// assert!(!record.was_routed());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord<S> {
    /// The state being left, `None` for the machine's first move
    pub from: Option<S>,
    /// The target passed to `transition`
    pub requested: S,
    /// The state actually entered
    pub to: S,
    /// When the transition committed
    pub timestamp: DateTime<Utc>,
    /// 1-based position of this transition since the last reset
    pub sequence: u64,
}

impl<S: PartialEq> TransitionRecord<S> {
    /// Whether a router redirected this transition.
    pub fn was_routed(&self) -> bool {
        self.requested != self.to
    }
}

/// Bounded, ordered log of committed transitions.
///
/// # Example
///
/// ```rust
/// use switchyard::core::{StateHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let mut history = StateHistory::with_capacity(8);
/// history.push(TransitionRecord {
///     from: Some("start"),
///     requested: "middle",
///     to: "middle",
///     timestamp: Utc::now(),
///     sequence: 1,
/// });
/// history.push(TransitionRecord {
///     from: Some("middle"),
///     requested: "end",
///     to: "end",
///     timestamp: Utc::now(),
///     sequence: 2,
/// });
///
/// let path = history.get_path();
/// assert_eq!(path, vec![&"start", &"middle", &"end"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory<S> {
    records: VecDeque<TransitionRecord<S>>,
    #[serde(deserialize_with = "at_least_one")]
    capacity: usize,
    dropped: u64,
}

impl<S> StateHistory<S> {
    /// Create an empty history retaining at most `capacity` records.
    ///
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity.min(64)),
            capacity,
            dropped: 0,
        }
    }

    /// Append a record, evicting the oldest ones while full.
    pub fn push(&mut self, record: TransitionRecord<S>) {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
            self.dropped += 1;
        }
        self.records.push_back(record);
    }

    /// Remove every record and forget the eviction count.
    pub fn clear(&mut self) {
        self.records.clear();
        self.dropped = 0;
    }

    /// Get the path of states traversed by the retained records.
    ///
    /// Starts with the `from` of the oldest retained record (when it has
    /// one), followed by the `to` of every record.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(from) = self.records.front().and_then(|r| r.from.as_ref()) {
            path.push(from);
        }
        path.extend(self.records.iter().map(|r| &r.to));
        path
    }

    /// Time between the oldest and newest retained records.
    ///
    /// Returns `None` if the history is empty.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// Iterate over retained records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TransitionRecord<S>> {
        self.records.iter()
    }

    /// The most recent record.
    pub fn last(&self) -> Option<&TransitionRecord<S>> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records evicted since the last clear.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Deserialized capacities get the same floor as [`StateHistory::with_capacity`].
fn at_least_one<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    usize::deserialize(deserializer).map(|capacity| capacity.max(1))
}
