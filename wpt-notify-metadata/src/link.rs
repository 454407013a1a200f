// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::Status;
use serde::{Deserialize, Serialize};

/// A record stating that a (product, test, subtest) is already covered by a filed bug.
///
/// Links are immutable once created. A link without a status covers the test or subtest whatever
/// status it shows; a link with a status only covers results with that status.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TrackingLink {
    url: String,
    product: String,
    test_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subtest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<Status>,
}

impl TrackingLink {
    /// Creates a new tracking link.
    pub fn new(
        url: impl Into<String>,
        product: impl Into<String>,
        test_id: impl Into<String>,
        subtest: Option<String>,
        status: Option<Status>,
    ) -> Self {
        Self {
            url: url.into(),
            product: product.into(),
            test_id: test_id.into(),
            subtest,
            status,
        }
    }

    /// The URL of the bug this link points to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The product (browser) the link applies to.
    pub fn product(&self) -> &str {
        &self.product
    }

    /// The wire-level test id.
    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    /// The subtest, or `None` if the link is for the harness-level result.
    pub fn subtest(&self) -> Option<&str> {
        self.subtest.as_deref()
    }

    /// The status this link is scoped to, if any.
    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// Returns true if this link covers a result with the given product, subtest and status.
    pub fn covers(&self, product: &str, subtest: Option<&str>, status: Status) -> bool {
        self.product == product
            && self.subtest.as_deref() == subtest
            && self.status.is_none_or(|scoped| scoped == status)
    }
}
