// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
};
use wpt_notify::{
    errors::{FilingError, OracleError},
    oracle::OwnershipOracle,
    paths::TestPaths,
    results::{Results, RunPhase, StatusKey, StatusRecord},
    tracker::{BugId, BugTracker, NewBug},
};
use wpt_notify_metadata::{BugComponent, Status};

pub(crate) const FEED: &str = r#"{
  "wpt-revision": "abcdef",
  "ci-url": "https://treeherder.mozilla.org",
  "change-id": "1234",
  "results": [
    { "test": "/test/test.html", "product": "firefox", "origin": "GitHub",
      "after": false, "status": "PASS", "known-intermittent": ["PASS"] },
    { "test": "/test/test.html", "product": "firefox", "origin": "GitHub",
      "after": true, "status": "FAIL", "known-intermittent": ["PASS"] },
    { "test": "/test/test.html", "product": "chrome", "origin": "GitHub",
      "after": false, "status": "PASS" },
    { "test": "/test/test.html", "product": "chrome", "origin": "GitHub",
      "after": true, "status": "PASS" },
    { "test": "/test/ok.html", "product": "firefox", "origin": "GitHub",
      "after": true, "status": "OK" }
  ]
}"#;

pub(crate) fn wpt_component() -> BugComponent {
    BugComponent::new("Testing", "web-platform-tests")
}

/// Adds a crash to results parsed from [`FEED`].
pub(crate) fn add_crash(results: &mut Results, test_id: &str) {
    results.upsert(
        test_id,
        None,
        StatusKey::new("firefox", "GitHub", RunPhase::Before),
        StatusRecord::new(Status::Pass, []),
    );
    results.upsert(
        test_id,
        None,
        StatusKey::new("firefox", "GitHub", RunPhase::After),
        StatusRecord::new(Status::Crash, []),
    );
}

/// An oracle that can't map test ids, and assigns every path under `testing/web-platform` to a
/// single component.
pub(crate) struct WptOracle {
    pub(crate) component_calls: Cell<usize>,
}

impl WptOracle {
    pub(crate) fn new() -> Self {
        Self {
            component_calls: Cell::new(0),
        }
    }
}

impl OwnershipOracle for WptOracle {
    fn test_paths(&self, _test_ids: &[String]) -> Result<TestPaths, OracleError> {
        Err(OracleError::new("mach is not available"))
    }

    fn components_for_paths(
        &self,
        paths: &[Utf8PathBuf],
    ) -> Result<BTreeMap<BugComponent, Vec<Utf8PathBuf>>, OracleError> {
        self.component_calls.set(self.component_calls.get() + 1);
        let owned: Vec<_> = paths
            .iter()
            .filter(|path| path.starts_with("testing/web-platform"))
            .cloned()
            .collect();
        let mut components = BTreeMap::new();
        if !owned.is_empty() {
            components.insert(wpt_component(), owned);
        }
        Ok(components)
    }
}

/// A tracker that hands out sequential ids and remembers titles and bodies.
pub(crate) struct SequentialTracker {
    next_id: Cell<u64>,
    pub(crate) bugs: RefCell<Vec<(BugId, String, String)>>,
}

impl SequentialTracker {
    pub(crate) fn new(first_id: u64) -> Self {
        Self {
            next_id: Cell::new(first_id),
            bugs: RefCell::new(Vec::new()),
        }
    }
}

impl BugTracker for SequentialTracker {
    fn create_bug(&self, bug: &NewBug<'_>) -> Result<BugId, FilingError> {
        let id = BugId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.bugs
            .borrow_mut()
            .push((id, bug.title.to_owned(), bug.body.to_owned()));
        Ok(id)
    }
}
