// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writing bug reports for flagged entries.

use crate::classify::{FlaggedEntry, Regression};
use itertools::Itertools;
use swrite::{SWrite, swrite, swriteln};
use wpt_notify_metadata::BugComponent;

/// A bug ready to be filed, covering a set of flagged entries in one component.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BugReport {
    /// The bug title.
    pub title: String,

    /// The bug description.
    pub body: String,

    /// The component the bug will be filed in.
    pub component: BugComponent,

    /// The entries the bug covers. Never empty.
    pub entries: Vec<FlaggedEntry>,
}

/// Composes [`BugReport`]s.
#[derive(Clone, Debug)]
pub struct ReportComposer {
    metadata_url: String,
}

impl ReportComposer {
    /// Creates a composer whose reports point at the given metadata repository.
    pub fn new(metadata_url: impl Into<String>) -> Self {
        Self {
            metadata_url: metadata_url.into(),
        }
    }

    /// Composes a report for the entries in a component.
    ///
    /// Returns `None` if there are no entries.
    pub fn compose(
        &self,
        change_id: &str,
        tracking_bug: &str,
        component: &BugComponent,
        entries: Vec<FlaggedEntry>,
    ) -> Option<BugReport> {
        if entries.is_empty() {
            return None;
        }

        let (crashes, worse): (Vec<_>, Vec<_>) = entries
            .iter()
            .partition(|entry| entry.regression == Regression::CrashElevated);

        let mut body = String::new();
        swriteln!(
            body,
            "The following tests have untriaged failures in the CI runs for wpt PR {change_id}:"
        );
        body.push('\n');
        write_section(&mut body, "Tests with a Worse Result After Changes", worse);
        write_section(&mut body, "Tests that Crash After Changes", crashes);

        swriteln!(
            body,
            "These updates will be on mozilla-central once bug {tracking_bug} lands."
        );
        body.push('\n');
        body.push_str("Note: this bug is for tracking fixing the issues and is not\n");
        body.push_str(
            "owned by the wpt sync bot. It is associated with the test failures via metadata\n",
        );
        swriteln!(body, "stored in {}.", self.metadata_url);
        body.push('\n');
        body.push_str("If this bug is split into multiple bugs, please also update the\n");
        body.push_str("relevant metadata, otherwise we are unable to track which wpt issues\n");
        body.push_str("are triaged. The metadata link will be automatically removed when this\n");
        body.push_str("bug is resolved.\n");

        Some(BugReport {
            title: format!("New wpt failures from PR {change_id}"),
            body,
            component: component.clone(),
            entries,
        })
    }
}

/// Writes a section with one line per entry. Empty sections are skipped.
fn write_section(out: &mut String, heading: &str, entries: Vec<&FlaggedEntry>) {
    if entries.is_empty() {
        return;
    }

    swriteln!(out, "### {heading}");
    for entry in entries
        .into_iter()
        .sorted_by(|a, b| (&a.test_id, &a.subtest).cmp(&(&b.test_id, &b.subtest)))
    {
        write_entry(out, entry);
    }
    out.push('\n');
}

fn write_entry(out: &mut String, entry: &FlaggedEntry) {
    swrite!(out, "{}", entry.test_id);
    if let Some(subtest) = &entry.subtest {
        swrite!(out, " | {subtest}");
    }
    swrite!(out, ": {}", entry.after_status);
    if !entry.comparators.is_empty() {
        let comparators = entry
            .comparators
            .iter()
            .map(|c| format!("{}: {}", capitalize(&c.product), c.status))
            .join(", ");
        swrite!(out, " ({comparators})");
    }
    out.push('\n');
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
