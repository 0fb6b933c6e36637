use crate::store::HistoryStore;
use crate::util::mean;
use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::io;

/// Default size of the trailing-average window.
pub const DEFAULT_TRAILING_WINDOW: usize = 10;

/// Outcome of one finished session. Created once, never mutated.
///
/// Serialized as `{"wpm": .., "accuracy": .., "completedAt": ..}` with an
/// RFC 3339 timestamp; this is the on-disk layout of the history slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub wpm: u32,
    pub accuracy: u8,
    pub completed_at: DateTime<Local>,
}

/// Sort order for history views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display)]
pub enum SortKey {
    /// Most recent first.
    Recency,
    /// Highest wpm first, ties broken by recency.
    Score,
}

/// Which entries an aggregate ranges over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    All,
    /// The trailing N entries by insertion order.
    Last(usize),
}

/// Append-only log of finished sessions plus derived aggregates.
///
/// Entries are kept oldest-first. The backing store is written on every
/// append; a store failure degrades to an in-memory history rather than
/// surfacing an error, matching the availability-first policy of the rest
/// of the core.
pub struct History {
    entries: Vec<SessionResult>,
    store: Box<dyn HistoryStore>,
}

impl History {
    /// Load whatever the store holds; absence and corruption both come back
    /// from the store as an empty sequence.
    pub fn open(store: Box<dyn HistoryStore>) -> Self {
        let entries = store.load();
        Self { entries, store }
    }

    pub fn entries(&self) -> &[SessionResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn append(&mut self, result: SessionResult) {
        self.entries.push(result);
        let _ = self.store.save(&self.entries);
    }

    /// Empty the history and its persisted slot.
    pub fn clear(&mut self) {
        self.entries.clear();
        let _ = self.store.clear();
    }

    /// Lazily-sorted view; the underlying order stays insertion order.
    pub fn list(&self, sort: SortKey) -> Vec<&SessionResult> {
        match sort {
            SortKey::Recency => self
                .entries
                .iter()
                .sorted_by(|a, b| b.completed_at.cmp(&a.completed_at))
                .collect(),
            SortKey::Score => self
                .entries
                .iter()
                .sorted_by(|a, b| {
                    b.wpm
                        .cmp(&a.wpm)
                        .then(b.completed_at.cmp(&a.completed_at))
                })
                .collect(),
        }
    }

    fn scoped(&self, scope: Scope) -> &[SessionResult] {
        match scope {
            Scope::All => &self.entries,
            Scope::Last(n) => {
                let start = self.entries.len().saturating_sub(n);
                &self.entries[start..]
            }
        }
    }

    pub fn average_wpm(&self, scope: Scope) -> Option<u32> {
        let values: Vec<f64> = self.scoped(scope).iter().map(|r| f64::from(r.wpm)).collect();
        mean(&values).map(|m| m.round() as u32)
    }

    pub fn average_accuracy(&self, scope: Scope) -> Option<u8> {
        let values: Vec<f64> = self
            .scoped(scope)
            .iter()
            .map(|r| f64::from(r.accuracy))
            .collect();
        mean(&values).map(|m| m.round() as u8)
    }

    /// Entry with the greatest `completed_at`.
    pub fn latest(&self) -> Option<&SessionResult> {
        self.entries.iter().max_by_key(|r| r.completed_at)
    }

    /// Entry with the greatest wpm, ties broken by `completed_at`.
    pub fn fastest(&self) -> Option<&SessionResult> {
        self.entries
            .iter()
            .max_by(|a, b| a.wpm.cmp(&b.wpm).then(a.completed_at.cmp(&b.completed_at)))
    }

    /// Write the full history as CSV, oldest first.
    pub fn export_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["wpm", "accuracy", "completed_at"])?;
        for r in &self.entries {
            wtr.write_record([
                r.wpm.to_string(),
                r.accuracy.to_string(),
                r.completed_at.to_rfc3339(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}
