// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grouping flagged paths by the component that owns them.

use crate::{
    classify::FlaggedEntry, errors::OracleError, oracle::OwnershipOracle, paths::TestPaths,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};
use wpt_notify_metadata::BugComponent;

/// A path owned by a component that isn't eligible for automatic filing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DroppedPath {
    /// The repository path.
    pub path: Utf8PathBuf,

    /// The component that owns it.
    pub component: BugComponent,
}

/// The result of routing paths to components.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Routing {
    /// Paths grouped by eligible component.
    pub components: BTreeMap<BugComponent, Vec<Utf8PathBuf>>,

    /// Paths whose component isn't eligible.
    pub dropped: Vec<DroppedPath>,

    /// Paths the oracle didn't assign to any component.
    pub unowned: Vec<Utf8PathBuf>,
}

impl Routing {
    /// Groups flagged entries by the component owning their path.
    ///
    /// Entries keep their relative order. Entries whose path wasn't routed to an eligible
    /// component are left out.
    pub fn entries_by_component(
        &self,
        paths: &TestPaths,
        entries: &[FlaggedEntry],
    ) -> BTreeMap<BugComponent, Vec<FlaggedEntry>> {
        let owners: HashMap<&Utf8Path, &BugComponent> = self
            .components
            .iter()
            .flat_map(|(component, paths)| {
                paths.iter().map(move |path| (path.as_path(), component))
            })
            .collect();

        let mut by_component: BTreeMap<BugComponent, Vec<FlaggedEntry>> = BTreeMap::new();
        for entry in entries {
            let Some(component) = paths
                .path_for_test(&entry.test_id)
                .and_then(|path| owners.get(path))
            else {
                continue;
            };
            by_component
                .entry((*component).clone())
                .or_default()
                .push(entry.clone());
        }
        by_component
    }
}

/// Routes paths to components, restricted to an allow-list.
#[derive(Clone, Debug)]
pub struct ComponentRouter {
    eligible: BTreeSet<BugComponent>,
}

impl ComponentRouter {
    /// Creates a router that only routes to the given components.
    pub fn new(eligible: &BTreeSet<BugComponent>) -> Self {
        Self {
            eligible: eligible.clone(),
        }
    }

    /// Routes every path in `paths` with a single oracle query.
    ///
    /// If the oracle fails, nothing is routed.
    pub fn route(
        &self,
        paths: &TestPaths,
        oracle: &impl OwnershipOracle,
    ) -> Result<Routing, OracleError> {
        let all_paths: Vec<Utf8PathBuf> = paths.paths().map(Utf8Path::to_path_buf).collect();
        if all_paths.is_empty() {
            return Ok(Routing::default());
        }

        let owned = oracle.components_for_paths(&all_paths)?;

        let mut routing = Routing::default();
        let mut seen = BTreeSet::new();
        for (component, component_paths) in owned {
            // Only route paths that were asked about.
            let component_paths: Vec<_> = component_paths
                .into_iter()
                .filter(|path| paths.ids_for(path).is_some() && seen.insert(path.clone()))
                .collect();
            if component_paths.is_empty() {
                continue;
            }

            if self.eligible.contains(&component) {
                debug!(
                    "routing {} paths to component {component}",
                    component_paths.len()
                );
                routing
                    .components
                    .entry(component)
                    .or_default()
                    .extend(component_paths);
            } else {
                warn!(
                    "not filing for {} paths owned by component {component}, \
                     which is not eligible for automatic filing",
                    component_paths.len(),
                );
                routing
                    .dropped
                    .extend(component_paths.into_iter().map(|path| DroppedPath {
                        path,
                        component: component.clone(),
                    }));
            }
        }

        routing.unowned = all_paths
            .into_iter()
            .filter(|path| !seen.contains(path))
            .collect();
        if !routing.unowned.is_empty() {
            debug!("{} paths have no owning component", routing.unowned.len());
        }

        Ok(routing)
    }
}
