// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Skipping entries that are already tracked by a filed bug.

use crate::{classify::FlaggedEntry, results::Results};
use tracing::debug;

/// Removes flagged entries covered by an existing tracking link.
#[derive(Clone, Debug)]
pub struct MetadataDedup {
    owning_product: String,
}

impl MetadataDedup {
    /// Creates a filter for links belonging to the owning product.
    pub fn new(owning_product: impl Into<String>) -> Self {
        Self {
            owning_product: owning_product.into(),
        }
    }

    /// Returns true if an existing link in `results` covers the entry.
    ///
    /// Any owning-product link for the entry's subtest covers a `WORSE_AFTER` entry, so a test
    /// never gets a second link. A `CRASH_ELEVATED` entry is only covered by an unscoped link or
    /// one scoped to `CRASH`.
    pub fn is_covered(&self, results: &Results, entry: &FlaggedEntry) -> bool {
        let Some(test_result) = results.get(&entry.test_id) else {
            return false;
        };
        match test_result.covering_link(
            &self.owning_product,
            entry.subtest.as_deref(),
            entry.regression.elevated_status(),
        ) {
            Some(link) => {
                debug!(
                    "{} ({}) already tracked by {}",
                    entry.test_id,
                    entry.subtest.as_deref().unwrap_or("<harness>"),
                    link.url(),
                );
                true
            }
            None => false,
        }
    }

    /// Removes entries that are already covered.
    pub fn uncovered(
        &self,
        results: &Results,
        mut entries: Vec<FlaggedEntry>,
    ) -> Vec<FlaggedEntry> {
        let before = entries.len();
        entries.retain(|entry| !self.is_covered(results, entry));
        if entries.len() < before {
            debug!("{} entries are already tracked", before - entries.len());
        }
        entries
    }
}
