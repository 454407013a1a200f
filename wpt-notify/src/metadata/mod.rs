// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent storage of tracking links.
//!
//! The pipeline only talks to the [`MetadataStore`] trait. [`MetadataDir`] is the on-disk
//! implementation: a directory holding one links file per sync process, each guarded by an
//! exclusive lock that is held for the duration of a notify run.

mod dir;

pub use dir::*;

use crate::errors::{MetadataReadError, MetadataWriteError};
use wpt_notify_metadata::TrackingLink;

/// Read and append access to tracking links for one sync process.
pub trait MetadataStore {
    /// Returns all links recorded for a test id.
    fn links_for_test(&self, test_id: &str) -> Result<Vec<TrackingLink>, MetadataReadError>;

    /// Appends a link.
    ///
    /// Appending a link identical to one already stored must not create a second copy.
    fn append_link(&mut self, link: TrackingLink) -> Result<(), MetadataWriteError>;
}
