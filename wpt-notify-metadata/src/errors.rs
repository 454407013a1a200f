// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::Status;
use std::{error, fmt};

/// An error that occurs while parsing a [`Status`] from a string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusParseError {
    input: String,
}

impl StatusParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Returns the input that could not be parsed.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for StatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let known: Vec<_> = Status::ALL.iter().map(|status| status.as_str()).collect();
        write!(
            f,
            "unrecognized test status: {}\n(known values: {})",
            self.input,
            known.join(", ")
        )
    }
}

impl error::Error for StatusParseError {}

/// An error that occurs while parsing a [`BugComponent`](crate::BugComponent) from a string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BugComponentParseError {
    input: String,
}

impl BugComponentParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Returns the input that could not be parsed.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for BugComponentParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid bug component `{}` (expected the form \"Product :: Component\")",
            self.input
        )
    }
}

impl error::Error for BugComponentParseError {}
