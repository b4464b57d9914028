//! Record of completed transitions.
//!
//! The sequencer appends one record per transition whose exit and enter
//! phases both finished. Aborted transitions are not recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// A completed transition.
///
/// # Example
///
/// ```rust
/// use statetree::core::TransitionRecord;
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// let now = Utc::now();
/// let record = TransitionRecord {
///     id: Uuid::new_v4(),
///     from: "menu",
///     to: "game",
///     lca: Some("root"),
///     started_at: now,
///     completed_at: now,
/// };
///
/// assert_eq!(record.elapsed(), std::time::Duration::ZERO);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord<K> {
    /// Identifier shared with the transition's log fields
    pub id: Uuid,
    /// State whose request started the transition
    pub from: K,
    /// Target state
    pub to: K,
    /// Least common ancestor of `from` and `to`
    pub lca: Option<K>,
    /// When the exit phase began
    pub started_at: DateTime<Utc>,
    /// When the enter phase finished
    pub completed_at: DateTime<Utc>,
}

impl<K> TransitionRecord<K> {
    /// Wall-clock time spent across both phases.
    pub fn elapsed(&self) -> Duration {
        self.completed_at
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Ordered history of completed transitions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionHistory<K> {
    records: Vec<TransitionRecord<K>>,
}

impl<K> Default for TransitionHistory<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> TransitionHistory<K> {
    /// Create an empty history.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a completed transition.
    pub fn record(&mut self, record: TransitionRecord<K>) {
        self.records.push(record);
    }

    /// All recorded transitions, oldest first.
    pub fn records(&self) -> &[TransitionRecord<K>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent transition.
    pub fn last(&self) -> Option<&TransitionRecord<K>> {
        self.records.last()
    }

    /// States visited: the first transition's source, then every target.
    pub fn path(&self) -> Vec<&K> {
        let mut path = Vec::new();
        if let Some(first) = self.records.first() {
            path.push(&first.from);
        }
        for record in &self.records {
            path.push(&record.to);
        }
        path
    }

    /// Time from the start of the first transition to the end of the last.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.first()?, self.records.last()?);
        last.completed_at
            .signed_duration_since(first.started_at)
            .to_std()
            .ok()
    }
}
