// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The build ownership oracle.
//!
//! The oracle knows which bug tracker component owns each file in the repository, and usually
//! how test ids map to files too. Talking to it is left to implementors of [`OwnershipOracle`].

use crate::{errors::OracleError, paths::TestPaths};
use camino::Utf8PathBuf;
use std::collections::BTreeMap;
use wpt_notify_metadata::BugComponent;

/// Answers ownership queries about repository paths.
///
/// Both methods are batched: callers pass every path or test id they care about in a single call.
pub trait OwnershipOracle {
    /// Maps test ids to the source files they were generated from.
    fn test_paths(&self, test_ids: &[String]) -> Result<TestPaths, OracleError>;

    /// Groups paths by the component that owns them.
    ///
    /// Paths without an owner are left out of the result.
    fn components_for_paths(
        &self,
        paths: &[Utf8PathBuf],
    ) -> Result<BTreeMap<BugComponent, Vec<Utf8PathBuf>>, OracleError>;
}

impl<T: OwnershipOracle + ?Sized> OwnershipOracle for &T {
    fn test_paths(&self, test_ids: &[String]) -> Result<TestPaths, OracleError> {
        (**self).test_paths(test_ids)
    }

    fn components_for_paths(
        &self,
        paths: &[Utf8PathBuf],
    ) -> Result<BTreeMap<BugComponent, Vec<Utf8PathBuf>>, OracleError> {
        (**self).components_for_paths(paths)
    }
}
