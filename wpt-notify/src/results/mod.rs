// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory store of per-test, per-subtest status observations.
//!
//! [`Results`] is built fresh for every notify run, either by calling
//! [`Results::upsert`] for each observation or by parsing a raw CI feed with
//! [`Results::from_feed_json`]. It is never persisted.

mod feed;
mod status_map;

pub use status_map::*;

use crate::{errors::MetadataReadError, metadata::MetadataStore};
use indexmap::IndexMap;
use tracing::debug;
use wpt_notify_metadata::{Status, TrackingLink};

/// All results for a single test, across subtests, products and phases.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestResult {
    // Always contains the `None` (harness-level) slot.
    subtests: IndexMap<Option<String>, StatusMap>,
    links: Vec<TrackingLink>,
}

impl Default for TestResult {
    fn default() -> Self {
        Self::new()
    }
}

impl TestResult {
    /// Creates a new result with an empty harness-level slot.
    pub fn new() -> Self {
        let mut subtests = IndexMap::new();
        subtests.insert(None, StatusMap::new());
        Self {
            subtests,
            links: Vec::new(),
        }
    }

    /// Records a status for a subtest (`None` for the whole test).
    pub fn set_status(&mut self, subtest: Option<&str>, key: StatusKey, record: StatusRecord) {
        self.subtests
            .entry(subtest.map(str::to_owned))
            .or_default()
            .upsert(key, record);
    }

    /// Clears the status stored under a key, leaving the key absent.
    pub fn clear_status(&mut self, subtest: Option<&str>, key: &StatusKey) {
        if let Some(statuses) = self.subtests.get_mut(&subtest.map(str::to_owned)) {
            statuses.remove(key);
        }
    }

    /// Returns the statuses for a subtest (`None` for the whole test).
    pub fn statuses(&self, subtest: Option<&str>) -> Option<&StatusMap> {
        self.subtests.get(&subtest.map(str::to_owned))
    }

    /// Iterates over subtests, harness-level slot first, then in insertion order.
    pub fn iter_subtests(&self) -> impl Iterator<Item = (Option<&str>, &StatusMap)> + '_ {
        self.subtests
            .iter()
            .map(|(subtest, statuses)| (subtest.as_deref(), statuses))
    }

    /// Tracking links already associated with this test.
    pub fn links(&self) -> &[TrackingLink] {
        &self.links
    }

    /// Associates a tracking link with this test. Identical links are only stored once.
    pub fn add_link(&mut self, link: TrackingLink) {
        if !self.links.contains(&link) {
            self.links.push(link);
        }
    }

    /// Returns the first link for this product and subtest, if any.
    ///
    /// With `status` set, only links that are unscoped or scoped to that status count.
    pub fn covering_link(
        &self,
        product: &str,
        subtest: Option<&str>,
        status: Option<Status>,
    ) -> Option<&TrackingLink> {
        self.links.iter().find(|link| match status {
            Some(status) => link.covers(product, subtest, status),
            None => link.product() == product && link.subtest() == subtest,
        })
    }
}

/// Information about the CI runs that produced a set of results.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunContext {
    /// The upstream wpt revision that was tested.
    pub wpt_revision: Option<String>,

    /// A link to the CI run.
    pub ci_url: Option<String>,

    /// The originating change, e.g. a pull request number.
    pub change_id: Option<String>,
}

/// Results for all tests in a run, keyed by test id.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Results {
    test_results: IndexMap<String, TestResult>,

    /// Context for the runs these results came from.
    pub context: RunContext,
}

impl Results {
    /// Creates an empty set of results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a status for a test and subtest, replacing any record under the same key.
    pub fn upsert(
        &mut self,
        test_id: &str,
        subtest: Option<&str>,
        key: StatusKey,
        record: StatusRecord,
    ) {
        self.test_result_mut(test_id).set_status(subtest, key, record);
    }

    /// Records a status given as raw harness strings.
    ///
    /// An unrecognized status is treated as missing data: whatever was previously recorded under
    /// the key is cleared, and the observation is otherwise ignored. Unrecognized intermittent
    /// statuses are skipped.
    pub fn upsert_raw(
        &mut self,
        test_id: &str,
        subtest: Option<&str>,
        key: StatusKey,
        status: &str,
        known_intermittent: &[impl AsRef<str>],
    ) {
        let test_result = self.test_result_mut(test_id);
        let status = match status.parse::<Status>() {
            Ok(status) => status,
            Err(error) => {
                debug!(
                    "treating {test_id} ({}) status for {} as missing: {error}",
                    subtest.unwrap_or("<harness>"),
                    key.product,
                );
                test_result.clear_status(subtest, &key);
                return;
            }
        };
        let known_intermittent = known_intermittent
            .iter()
            .filter_map(|s| s.as_ref().parse::<Status>().ok());
        test_result.set_status(subtest, key, StatusRecord::new(status, known_intermittent));
    }

    /// Returns the result for a test, creating an empty one if it doesn't exist.
    pub fn test_result_mut(&mut self, test_id: &str) -> &mut TestResult {
        self.test_results.entry(test_id.to_owned()).or_default()
    }

    /// Returns the result for a test.
    pub fn get(&self, test_id: &str) -> Option<&TestResult> {
        self.test_results.get(test_id)
    }

    /// Iterates over tests in the order they were first seen.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TestResult)> + '_ {
        self.test_results
            .iter()
            .map(|(test_id, result)| (test_id.as_str(), result))
    }

    /// Returns the number of tests.
    pub fn len(&self) -> usize {
        self.test_results.len()
    }

    /// Returns true if there are no tests.
    pub fn is_empty(&self) -> bool {
        self.test_results.is_empty()
    }

    /// Loads existing tracking links for the given tests from the store.
    ///
    /// Tests not present in the results are skipped.
    pub fn attach_links<'a>(
        &mut self,
        test_ids: impl IntoIterator<Item = &'a str>,
        store: &impl MetadataStore,
    ) -> Result<(), MetadataReadError> {
        for test_id in test_ids {
            let Some(test_result) = self.test_results.get_mut(test_id) else {
                continue;
            };
            for link in store.links_for_test(test_id)? {
                test_result.add_link(link);
            }
        }
        Ok(())
    }
}
