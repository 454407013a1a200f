// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for the pipeline's external collaborators.

use crate::{
    classify::{FlaggedEntry, Regression},
    errors::{FilingError, MetadataReadError, MetadataWriteError, OracleError},
    metadata::MetadataStore,
    oracle::OwnershipOracle,
    paths::TestPaths,
    tracker::{BugId, BugTracker, BugType, NewBug},
};
use camino::Utf8PathBuf;
use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, BTreeSet},
    io,
};
use wpt_notify_metadata::{BugComponent, Status, TrackingLink};

/// Returns a flagged entry with a status matching the regression and no comparators.
pub(crate) fn flagged(test_id: &str, subtest: Option<&str>, regression: Regression) -> FlaggedEntry {
    FlaggedEntry {
        test_id: test_id.to_owned(),
        subtest: subtest.map(str::to_owned),
        regression,
        after_status: match regression {
            Regression::WorseAfter => Status::Fail,
            Regression::CrashElevated => Status::Crash,
        },
        comparators: Vec::new(),
    }
}

/// An in-memory [`MetadataStore`].
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    links: Vec<TrackingLink>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    pub(crate) fn with_links(links: impl IntoIterator<Item = TrackingLink>) -> Self {
        Self {
            links: links.into_iter().collect(),
            ..Self::default()
        }
    }

    pub(crate) fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub(crate) fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub(crate) fn links(&self) -> &[TrackingLink] {
        &self.links
    }
}

impl MetadataStore for MemoryStore {
    fn links_for_test(&self, test_id: &str) -> Result<Vec<TrackingLink>, MetadataReadError> {
        if self.fail_reads {
            return Err(MetadataReadError::Read {
                path: "<memory>".into(),
                error: io::Error::other("read failed"),
            });
        }
        Ok(self
            .links
            .iter()
            .filter(|link| link.test_id() == test_id)
            .cloned()
            .collect())
    }

    fn append_link(&mut self, link: TrackingLink) -> Result<(), MetadataWriteError> {
        if self.fail_writes {
            return Err(MetadataWriteError::Write {
                path: "<memory>".into(),
                error: io::Error::other("write failed"),
            });
        }
        if !self.links.contains(&link) {
            self.links.push(link);
        }
        Ok(())
    }
}

/// An [`OwnershipOracle`] answering from fixed data.
///
/// By default the path query fails, so callers use their fallback, and no path has an owner.
#[derive(Debug, Default)]
pub(crate) struct FakeOracle {
    test_paths: Option<TestPaths>,
    components: BTreeMap<BugComponent, Vec<Utf8PathBuf>>,
    fail_components: bool,
    path_calls: Cell<usize>,
    component_calls: Cell<usize>,
}

impl FakeOracle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_test_paths(mut self, test_paths: TestPaths) -> Self {
        self.test_paths = Some(test_paths);
        self
    }

    pub(crate) fn failing_test_paths(mut self) -> Self {
        self.test_paths = None;
        self
    }

    pub(crate) fn with_components(
        mut self,
        components: BTreeMap<BugComponent, Vec<Utf8PathBuf>>,
    ) -> Self {
        self.components = components;
        self
    }

    pub(crate) fn failing_components(mut self) -> Self {
        self.fail_components = true;
        self
    }

    pub(crate) fn path_calls(&self) -> usize {
        self.path_calls.get()
    }

    pub(crate) fn component_calls(&self) -> usize {
        self.component_calls.get()
    }
}

impl OwnershipOracle for FakeOracle {
    fn test_paths(&self, test_ids: &[String]) -> Result<TestPaths, OracleError> {
        self.path_calls.set(self.path_calls.get() + 1);
        let known = self
            .test_paths
            .as_ref()
            .ok_or_else(|| OracleError::new("test paths query failed"))?;

        let mut paths = TestPaths::new();
        for test_id in test_ids {
            if let Some(path) = known.path_for_test(test_id) {
                paths.insert(path, test_id.clone());
            }
        }
        Ok(paths)
    }

    fn components_for_paths(
        &self,
        paths: &[Utf8PathBuf],
    ) -> Result<BTreeMap<BugComponent, Vec<Utf8PathBuf>>, OracleError> {
        self.component_calls.set(self.component_calls.get() + 1);
        if self.fail_components {
            return Err(OracleError::new("components query failed"));
        }

        Ok(self
            .components
            .iter()
            .filter_map(|(component, owned)| {
                let owned: Vec<_> = owned
                    .iter()
                    .filter(|path| paths.contains(path))
                    .cloned()
                    .collect();
                (!owned.is_empty()).then(|| (component.clone(), owned))
            })
            .collect())
    }
}

/// A bug created through [`RecordingTracker`].
#[derive(Clone, Debug)]
pub(crate) struct CreatedBug {
    pub(crate) id: BugId,
    pub(crate) title: String,
    pub(crate) body: String,
    pub(crate) component: BugComponent,
    pub(crate) bug_type: BugType,
}

/// A [`BugTracker`] that records the bugs it creates.
///
/// Ids are handed out sequentially, and only used up by successful filings.
#[derive(Debug)]
pub(crate) struct RecordingTracker {
    next_id: Cell<u64>,
    failing: BTreeSet<BugComponent>,
    created: RefCell<Vec<CreatedBug>>,
}

impl RecordingTracker {
    pub(crate) fn new(first_id: u64) -> Self {
        Self {
            next_id: Cell::new(first_id),
            failing: BTreeSet::new(),
            created: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn failing_for(mut self, component: BugComponent) -> Self {
        self.failing.insert(component);
        self
    }

    pub(crate) fn created(&self) -> Vec<CreatedBug> {
        self.created.borrow().clone()
    }
}

impl BugTracker for RecordingTracker {
    fn create_bug(&self, bug: &NewBug<'_>) -> Result<BugId, FilingError> {
        if self.failing.contains(bug.component) {
            return Err(FilingError::with_source(
                bug.component.clone(),
                "tracker rejected the request",
                io::Error::other("HTTP 500"),
            ));
        }

        let id = BugId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.created.borrow_mut().push(CreatedBug {
            id,
            title: bug.title.to_owned(),
            body: bug.body.to_owned(),
            component: bug.component.clone(),
            bug_type: bug.bug_type,
        });
        Ok(id)
    }
}
