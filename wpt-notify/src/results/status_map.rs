// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use indexmap::IndexMap;
use std::{collections::BTreeSet, fmt};
use wpt_notify_metadata::Status;

/// Whether a status was observed before or after the change under evaluation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RunPhase {
    /// The baseline run, without the change.
    Before,

    /// The run with the change applied.
    After,
}

impl RunPhase {
    /// Returns the phase for an `is_after` flag, as found in the raw CI feed.
    pub fn from_is_after(is_after: bool) -> Self {
        if is_after { Self::After } else { Self::Before }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

/// The key a [`StatusRecord`] is stored under.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StatusKey {
    /// The product (browser) the status was observed in.
    pub product: String,

    /// Where the run came from, e.g. `"GitHub"` or `"Treeherder"`.
    pub run_origin: String,

    /// Before or after the change.
    pub phase: RunPhase,
}

impl StatusKey {
    /// Creates a new key.
    pub fn new(product: impl Into<String>, run_origin: impl Into<String>, phase: RunPhase) -> Self {
        Self {
            product: product.into(),
            run_origin: run_origin.into(),
            phase,
        }
    }
}

/// A single observed status, along with the statuses known to be intermittent for it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusRecord {
    status: Status,
    known_intermittent: BTreeSet<Status>,
}

impl StatusRecord {
    /// Creates a new record.
    pub fn new(status: Status, known_intermittent: impl IntoIterator<Item = Status>) -> Self {
        Self {
            status,
            known_intermittent: known_intermittent.into_iter().collect(),
        }
    }

    /// The observed status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Statuses this result is known to flip between.
    pub fn known_intermittent(&self) -> &BTreeSet<Status> {
        &self.known_intermittent
    }

    /// Returns true if the status is passing or one of the known intermittent statuses.
    pub fn is_expected(&self) -> bool {
        self.status.is_passing() || self.known_intermittent.contains(&self.status)
    }
}

/// Status records for one test or subtest, keyed by [`StatusKey`].
///
/// Writing a record under a key that is already present replaces the old record; records are
/// never merged. The map also remembers write order, so [`latest`](Self::latest) returns the most
/// recent write for a product and phase even when several run origins reported it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StatusMap {
    records: IndexMap<StatusKey, StatusRecord>,
}

impl StatusMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a record, returning the record it replaced, if any.
    pub fn upsert(&mut self, key: StatusKey, record: StatusRecord) -> Option<StatusRecord> {
        // Remove first so the key moves to the end, marking it as the latest write.
        let previous = self.records.shift_remove(&key);
        self.records.insert(key, record);
        previous
    }

    /// Removes the record for a key, returning it if present.
    pub fn remove(&mut self, key: &StatusKey) -> Option<StatusRecord> {
        self.records.shift_remove(key)
    }

    /// Returns the record for an exact key.
    pub fn get(&self, key: &StatusKey) -> Option<&StatusRecord> {
        self.records.get(key)
    }

    /// Returns the most recently written record for a product and phase, across run origins.
    pub fn latest(&self, product: &str, phase: RunPhase) -> Option<&StatusRecord> {
        self.records
            .iter()
            .rev()
            .find(|(key, _)| key.product == product && key.phase == phase)
            .map(|(_, record)| record)
    }

    /// Iterates over records in write order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (&StatusKey, &StatusRecord)> + '_ {
        self.records.iter()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
