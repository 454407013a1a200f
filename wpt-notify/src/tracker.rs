// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filing bugs and recording tracking links for them.
//!
//! The tracker itself is reached through the [`BugTracker`] trait. [`BugFiler`] files a composed
//! [`BugReport`] and writes one tracking link per covered entry.

use crate::{
    classify::FlaggedEntry,
    errors::{DisplayErrorChain, FilingError, MetadataWriteError},
    metadata::MetadataStore,
    report::BugReport,
};
use std::fmt;
use tracing::{error, info};
use wpt_notify_metadata::{BugComponent, TrackingLink};

/// A bug number in the tracker.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BugId(pub u64);

impl fmt::Display for BugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of bug being filed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BugType {
    /// Something is broken.
    Defect,
}

impl BugType {
    /// The name used by the tracker.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Defect => "defect",
        }
    }
}

impl fmt::Display for BugType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bug to be created.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NewBug<'a> {
    /// The title.
    pub title: &'a str,

    /// The description.
    pub body: &'a str,

    /// The component to file in.
    pub component: &'a BugComponent,

    /// The bug type.
    pub bug_type: BugType,
}

/// A bug tracker that can create bugs.
pub trait BugTracker {
    /// Creates a bug and returns its id.
    fn create_bug(&self, bug: &NewBug<'_>) -> Result<BugId, FilingError>;
}

impl<T: BugTracker + ?Sized> BugTracker for &T {
    fn create_bug(&self, bug: &NewBug<'_>) -> Result<BugId, FilingError> {
        (**self).create_bug(bug)
    }
}

/// Returns the URL of a bug, as stored in tracking links.
pub fn show_bug_url(tracker_url: &str, bug_id: BugId) -> String {
    format!("{}/show_bug.cgi?id={bug_id}", tracker_url.trim_end_matches('/'))
}

/// A bug that was filed, along with the links recorded for it.
#[derive(Debug)]
pub struct FiledBug {
    /// The new bug's id.
    pub bug_id: BugId,

    /// The component it was filed in.
    pub component: BugComponent,

    /// The entries it covers.
    pub entries: Vec<FlaggedEntry>,

    /// Links that were written to the metadata store.
    pub links: Vec<TrackingLink>,

    /// Failures to write links. Entries without a link will be filed again by the next run.
    pub link_errors: Vec<MetadataWriteError>,
}

impl FiledBug {
    /// Returns true if a link was recorded for every entry.
    pub fn is_fully_linked(&self) -> bool {
        self.link_errors.is_empty()
    }
}

/// Files bug reports and records tracking links for them.
#[derive(Clone, Debug)]
pub struct BugFiler {
    tracker_url: String,
    owning_product: String,
}

impl BugFiler {
    /// Creates a filer for the given tracker and owning product.
    pub fn new(tracker_url: impl Into<String>, owning_product: impl Into<String>) -> Self {
        Self {
            tracker_url: tracker_url.into(),
            owning_product: owning_product.into(),
        }
    }

    /// Files a report, then appends a tracking link for each entry it covers.
    ///
    /// If filing fails, no links are written. Link write failures don't undo the filing: they
    /// are collected in [`FiledBug::link_errors`].
    pub fn file(
        &self,
        report: BugReport,
        tracker: &impl BugTracker,
        store: &mut impl MetadataStore,
    ) -> Result<FiledBug, FilingError> {
        let BugReport {
            title,
            body,
            component,
            entries,
        } = report;

        let new_bug = NewBug {
            title: &title,
            body: &body,
            component: &component,
            bug_type: BugType::Defect,
        };
        info!(
            "creating a bug in component {component} (type: {})",
            new_bug.bug_type
        );
        let bug_id = tracker.create_bug(&new_bug)?;
        info!("filed bug {bug_id} in {component} covering {} entries", entries.len());

        let url = show_bug_url(&self.tracker_url, bug_id);
        let mut links = Vec::with_capacity(entries.len());
        let mut link_errors = Vec::new();
        for entry in &entries {
            let link = TrackingLink::new(
                url.clone(),
                self.owning_product.clone(),
                entry.test_id.clone(),
                entry.subtest.clone(),
                entry.regression.elevated_status(),
            );
            match store.append_link(link.clone()) {
                Ok(()) => links.push(link),
                Err(err) => {
                    error!(
                        "bug {bug_id} was filed, but recording its link for {} failed \
                         (the next run may file a duplicate): {}",
                        entry.test_id,
                        DisplayErrorChain(&err),
                    );
                    link_errors.push(err);
                }
            }
        }

        Ok(FiledBug {
            bug_id,
            component,
            entries,
            links,
            link_errors,
        })
    }
}
