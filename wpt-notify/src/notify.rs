// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running the whole notify step for one sync.

use crate::{
    classify::{FlaggedEntry, RegressionClassifier},
    config::NotifyConfig,
    dedup::MetadataDedup,
    errors::{DisplayErrorChain, FilingError, NotifyError},
    metadata::MetadataStore,
    oracle::OwnershipOracle,
    paths::{PathResolver, TestPaths},
    report::ReportComposer,
    results::Results,
    routing::{ComponentRouter, DroppedPath},
    tracker::{BugFiler, BugId, BugTracker, FiledBug},
};
use camino::Utf8PathBuf;
use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use wpt_notify_metadata::BugComponent;

/// Identifies the sync a notify step runs for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncContext {
    /// The sync process name, which also scopes its metadata lock.
    pub process_name: String,

    /// The originating change, e.g. an upstream pull request number.
    pub change_id: String,

    /// The bug tracking the sync itself.
    pub tracking_bug: String,
}

/// A component whose bug couldn't be filed.
#[derive(Debug)]
pub struct ComponentFailure {
    /// The component.
    pub component: BugComponent,

    /// The entries that stay unfiled.
    pub entries: Vec<FlaggedEntry>,

    /// Why filing failed.
    pub error: FilingError,
}

/// What a notify step did.
#[derive(Debug, Default)]
pub struct NotifyOutcome {
    /// Bugs filed, by id.
    pub filed: BTreeMap<BugId, FiledBug>,

    /// Components for which filing failed.
    pub failed: Vec<ComponentFailure>,

    /// Paths owned by components not eligible for automatic filing.
    pub dropped: Vec<DroppedPath>,

    /// Paths with no owning component.
    pub unowned: Vec<Utf8PathBuf>,
}

impl NotifyOutcome {
    /// Returns true if nothing was filed and nothing failed.
    pub fn is_empty(&self) -> bool {
        self.filed.is_empty() && self.failed.is_empty()
    }
}

/// Runs the notify step.
#[derive(Clone, Debug)]
pub struct Notifier {
    classifier: RegressionClassifier,
    resolver: PathResolver,
    router: ComponentRouter,
    dedup: MetadataDedup,
    composer: ReportComposer,
    filer: BugFiler,
}

impl Notifier {
    /// Creates a notifier from configuration.
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            classifier: RegressionClassifier::new(
                config.owning_product.clone(),
                config.comparator_products.iter().cloned(),
            ),
            resolver: PathResolver::new(&config.paths),
            router: ComponentRouter::new(&config.components),
            dedup: MetadataDedup::new(config.owning_product.clone()),
            composer: ReportComposer::new(config.metadata_url.clone()),
            filer: BugFiler::new(config.tracker_url.clone(), config.owning_product.clone()),
        }
    }

    /// Files bugs for new failures in `results`.
    ///
    /// The caller is expected to hold the sync's metadata lock for the duration, e.g. by passing
    /// a [`LockedMetadata`](crate::metadata::LockedMetadata) as `store`.
    ///
    /// Oracle and metadata read failures abort the step before anything is filed. Filing
    /// failures only affect their own component and are reported in
    /// [`NotifyOutcome::failed`].
    pub fn notify(
        &self,
        sync: &SyncContext,
        results: &mut Results,
        oracle: &impl OwnershipOracle,
        tracker: &impl BugTracker,
        store: &mut impl MetadataStore,
    ) -> Result<NotifyOutcome, NotifyError> {
        let test_ids: Vec<String> = results.iter().map(|(id, _)| id.to_owned()).collect();
        results
            .attach_links(test_ids.iter().map(String::as_str), &*store)
            .map_err(NotifyError::MetadataRead)?;

        let flagged = self.classifier.flagged(results);
        if flagged.is_empty() {
            info!("{}: no new failures to file", sync.process_name);
            return Ok(NotifyOutcome::default());
        }
        debug!(
            "{}: {} flagged results (wpt revision: {}, CI run: {})",
            sync.process_name,
            flagged.len(),
            results.context.wpt_revision.as_deref().unwrap_or("unknown"),
            results.context.ci_url.as_deref().unwrap_or("unknown"),
        );

        // Already-tracked entries never reach the oracle.
        let flagged = self.dedup.uncovered(results, flagged);
        if flagged.is_empty() {
            info!("{}: all new failures are already tracked", sync.process_name);
            return Ok(NotifyOutcome::default());
        }

        let flagged_ids: Vec<String> = flagged
            .iter()
            .map(|entry| entry.test_id.clone())
            .unique()
            .collect();
        let paths = self.test_paths(&flagged_ids, oracle);

        let routing = self
            .router
            .route(&paths, oracle)
            .map_err(NotifyError::OracleUnavailable)?;
        let by_component = routing.entries_by_component(&paths, &flagged);

        let mut outcome = NotifyOutcome {
            dropped: routing.dropped,
            unowned: routing.unowned,
            ..NotifyOutcome::default()
        };

        for (component, entries) in by_component {
            let Some(report) = self.composer.compose(
                &sync.change_id,
                &sync.tracking_bug,
                &component,
                entries,
            ) else {
                continue;
            };
            let entries = report.entries.clone();

            match self.filer.file(report, tracker, store) {
                Ok(filed) => {
                    outcome.filed.insert(filed.bug_id, filed);
                }
                Err(error) => {
                    warn!(
                        "{}: failed to file bug in {component}, {} entries remain untracked: {}",
                        sync.process_name,
                        entries.len(),
                        DisplayErrorChain(&error),
                    );
                    outcome.failed.push(ComponentFailure {
                        component,
                        entries,
                        error,
                    });
                }
            }
        }

        Ok(outcome)
    }

    /// Maps test ids to paths, falling back to the built-in heuristic if the oracle can't.
    fn test_paths(&self, test_ids: &[String], oracle: &impl OwnershipOracle) -> TestPaths {
        let from_oracle = match oracle.test_paths(test_ids) {
            Ok(paths) => paths,
            Err(error) => {
                warn!(
                    "falling back to heuristic test paths: {}",
                    DisplayErrorChain(&error)
                );
                return self.resolver.resolve_all(test_ids.iter().map(String::as_str));
            }
        };

        // Ids the oracle didn't know about still need a path.
        let missing: Vec<&str> = test_ids
            .iter()
            .map(String::as_str)
            .filter(|id| from_oracle.path_for_test(id).is_none())
            .collect();
        if missing.is_empty() {
            return from_oracle;
        }
        debug!("oracle had no path for {} test ids", missing.len());
        let mut paths = from_oracle;
        for test_id in missing {
            paths.insert(self.resolver.resolve(test_id), test_id);
        }
        paths
    }
}
