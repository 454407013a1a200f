// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::BugComponentParseError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A bug tracker ownership bucket: a product and a component within it.
///
/// The textual form is `"Product :: Component"`, which is also how this type is serialized.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BugComponent {
    product: String,
    component: String,
}

impl BugComponent {
    /// The separator between the product and component in the textual form.
    pub const SEPARATOR: &'static str = "::";

    /// Creates a new `BugComponent`.
    pub fn new(product: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            component: component.into(),
        }
    }

    /// Returns the product area.
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Returns the component name within the product.
    pub fn component(&self) -> &str {
        &self.component
    }
}

impl fmt::Display for BugComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.product, Self::SEPARATOR, self.component)
    }
}

impl FromStr for BugComponent {
    type Err = BugComponentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (product, component) = s
            .split_once(Self::SEPARATOR)
            .ok_or_else(|| BugComponentParseError::new(s))?;
        let (product, component) = (product.trim(), component.trim());
        if product.is_empty() || component.is_empty() || component.contains(Self::SEPARATOR) {
            return Err(BugComponentParseError::new(s));
        }
        Ok(Self::new(product, component))
    }
}

impl TryFrom<String> for BugComponent {
    type Error = BugComponentParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BugComponent> for String {
    fn from(value: BugComponent) -> Self {
        value.to_string()
    }
}
