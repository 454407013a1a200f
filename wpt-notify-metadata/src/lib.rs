// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Serializable types shared between wpt-notify and the persistent wpt metadata store.
//!
//! The types in this crate describe what ends up on disk: the harness [`Status`] values, the
//! [`BugComponent`] a failure is routed to, and the [`TrackingLink`] recorded once a bug has been
//! filed.

mod component;
mod errors;
mod link;
mod status;

pub use component::*;
pub use errors::*;
pub use link::*;
pub use status::*;
