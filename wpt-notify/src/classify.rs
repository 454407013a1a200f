// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deciding which results are new failures.
//!
//! Only the owning product's statuses affect classification. Comparator products are carried
//! along so that reports can show them next to the owning product's status.

use crate::results::{Results, RunPhase, StatusMap};
use std::fmt;
use tracing::debug;
use wpt_notify_metadata::Status;

/// Why a result was flagged.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Regression {
    /// The result is worse than it was before the change, or is a new test that doesn't pass.
    WorseAfter,

    /// The result crashed after the change. Crashes are always flagged.
    CrashElevated,
}

impl Regression {
    /// The status a tracking link for this regression is scoped to, if any.
    pub fn elevated_status(self) -> Option<Status> {
        match self {
            Self::WorseAfter => None,
            Self::CrashElevated => Some(Status::Crash),
        }
    }
}

impl fmt::Display for Regression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorseAfter => write!(f, "worse after"),
            Self::CrashElevated => write!(f, "crash"),
        }
    }
}

/// The after-status of a comparator product, shown for context.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComparatorStatus {
    /// The comparator product.
    pub product: String,

    /// Its status after the change.
    pub status: Status,
}

/// A test or subtest that was flagged as a regression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlaggedEntry {
    /// The wire-level test id.
    pub test_id: String,

    /// The subtest, or `None` for the harness-level result.
    pub subtest: Option<String>,

    /// Why the entry was flagged.
    pub regression: Regression,

    /// The owning product's status after the change.
    pub after_status: Status,

    /// Comparator products' statuses after the change, in configured order. Comparators with no
    /// data are left out.
    pub comparators: Vec<ComparatorStatus>,
}

/// Flags regressions in the owning product.
#[derive(Clone, Debug)]
pub struct RegressionClassifier {
    owning_product: String,
    comparator_products: Vec<String>,
}

impl RegressionClassifier {
    /// Creates a classifier for the given owning and comparator products.
    pub fn new(
        owning_product: impl Into<String>,
        comparator_products: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            owning_product: owning_product.into(),
            comparator_products: comparator_products.into_iter().map(Into::into).collect(),
        }
    }

    /// The product whose regressions are flagged.
    pub fn owning_product(&self) -> &str {
        &self.owning_product
    }

    /// Classifies a single test or subtest.
    pub fn classify_statuses(&self, statuses: &StatusMap) -> Option<Regression> {
        let after = statuses.latest(&self.owning_product, RunPhase::After)?;
        if after.status() == Status::Crash {
            return Some(Regression::CrashElevated);
        }
        if after.is_expected() {
            return None;
        }

        match statuses.latest(&self.owning_product, RunPhase::Before) {
            Some(before) if before.is_expected() => Some(Regression::WorseAfter),
            Some(_) => None,
            // A new test that doesn't pass.
            None => Some(Regression::WorseAfter),
        }
    }

    /// Returns every flagged test and subtest in results order.
    pub fn flagged(&self, results: &Results) -> Vec<FlaggedEntry> {
        let mut entries = Vec::new();
        for (test_id, test_result) in results.iter() {
            for (subtest, statuses) in test_result.iter_subtests() {
                let Some(regression) = self.classify_statuses(statuses) else {
                    continue;
                };
                // classify_statuses only flags results with an owning after-status.
                let Some(after) = statuses.latest(&self.owning_product, RunPhase::After) else {
                    continue;
                };

                debug!(
                    "flagged {test_id} ({}): {regression}, {} after",
                    subtest.unwrap_or("<harness>"),
                    after.status(),
                );

                let comparators = self
                    .comparator_products
                    .iter()
                    .filter_map(|product| {
                        statuses
                            .latest(product, RunPhase::After)
                            .map(|record| ComparatorStatus {
                                product: product.clone(),
                                status: record.status(),
                            })
                    })
                    .collect();

                entries.push(FlaggedEntry {
                    test_id: test_id.to_owned(),
                    subtest: subtest.map(str::to_owned),
                    regression,
                    after_status: after.status(),
                    comparators,
                });
            }
        }
        entries
    }
}
