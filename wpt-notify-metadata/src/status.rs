// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::StatusParseError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A test or subtest status as reported by the wpt harness.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// The subtest passed.
    Pass,

    /// The test harness completed without errors.
    Ok,

    /// The subtest failed an assertion.
    Fail,

    /// The test harness hit an error.
    Error,

    /// The test did not complete in time.
    Timeout,

    /// The browser crashed while running the test.
    Crash,

    /// The subtest never ran, typically because an earlier subtest timed out.
    #[serde(rename = "NOTRUN", alias = "NOT_RUN")]
    NotRun,

    /// A precondition of the test wasn't met.
    PreconditionFailed,

    /// The test was skipped.
    Skip,
}

impl Status {
    /// All known statuses, in declaration order.
    pub const ALL: &'static [Status] = &[
        Status::Pass,
        Status::Ok,
        Status::Fail,
        Status::Error,
        Status::Timeout,
        Status::Crash,
        Status::NotRun,
        Status::PreconditionFailed,
        Status::Skip,
    ];

    /// Returns the wire representation of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Ok => "OK",
            Self::Fail => "FAIL",
            Self::Error => "ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Crash => "CRASH",
            Self::NotRun => "NOTRUN",
            Self::PreconditionFailed => "PRECONDITION_FAILED",
            Self::Skip => "SKIP",
        }
    }

    /// Returns true if this status is a success for either a subtest or a harness.
    pub fn is_passing(self) -> bool {
        matches!(self, Self::Pass | Self::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "NOTRUN" is the harness spelling, but "NOT_RUN" shows up in hand-written metadata too.
        if s == "NOT_RUN" {
            return Ok(Self::NotRun);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusParseError::new(s))
    }
}
