// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Regression detection and bug routing for the wpt sync.
//!
//! Given the results of CI runs before and after an upstream web-platform-tests change, this crate
//! decides which results are new failures, works out which bug tracker component owns each failing
//! test, skips anything already covered by a tracking link, and files one bug per component.
//!
//! The basic flow is:
//!
//! 1. Status observations are ingested into [`Results`](results::Results), either directly or from
//!    a raw CI feed.
//! 2. [`RegressionClassifier`](classify::RegressionClassifier) flags results that got worse or
//!    crashed.
//! 3. Flagged test ids are turned into repository paths, by the [`OwnershipOracle`] if it can,
//!    otherwise by the [`PathResolver`](paths::PathResolver) fallback.
//! 4. [`ComponentRouter`](routing::ComponentRouter) groups paths by component.
//! 5. [`MetadataDedup`](dedup::MetadataDedup) drops entries that already have a tracking link.
//! 6. [`ReportComposer`](report::ReportComposer) writes the bug, and
//!    [`BugFiler`](tracker::BugFiler) files it and records new links.
//!
//! [`Notifier`](notify::Notifier) drives all of the above.
//!
//! [`OwnershipOracle`]: oracle::OwnershipOracle

pub mod classify;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod metadata;
pub mod notify;
pub mod oracle;
pub mod paths;
pub mod report;
pub mod results;
pub mod routing;
#[cfg(test)]
mod test_helpers;
pub mod tracker;
