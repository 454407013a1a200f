// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of the raw CI result feed.

use super::{Results, RunContext, RunPhase, StatusKey};
use crate::errors::FeedParseError;
use camino::Utf8Path;
use serde::Deserialize;
use tracing::debug;

/// The raw feed as produced by the result collector.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawFeed {
    #[serde(default)]
    wpt_revision: Option<String>,
    #[serde(default)]
    ci_url: Option<String>,
    #[serde(default)]
    change_id: Option<String>,
    #[serde(default)]
    results: Vec<RawObservation>,
}

/// A single status observation. Statuses are kept as strings so that unknown values can be
/// treated as missing data rather than failing the whole feed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawObservation {
    test: String,
    #[serde(default)]
    subtest: Option<String>,
    product: String,
    origin: String,
    after: bool,
    status: String,
    #[serde(default)]
    known_intermittent: Vec<String>,
}

impl Results {
    /// Builds results from a JSON feed, applying each observation in order.
    ///
    /// ```json
    /// {
    ///   "wpt-revision": "abcdef",
    ///   "change-id": "1234",
    ///   "results": [
    ///     { "test": "/a.html", "product": "firefox", "origin": "GitHub",
    ///       "after": true, "status": "FAIL", "known-intermittent": ["PASS"] }
    ///   ]
    /// }
    /// ```
    pub fn from_feed_json(json: &str) -> Result<Self, FeedParseError> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let feed: RawFeed = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|error| FeedParseError::Parse { error })?;
        deserializer
            .end()
            .map_err(|error| FeedParseError::TrailingInput { error })?;

        let mut results = Results {
            context: RunContext {
                wpt_revision: feed.wpt_revision,
                ci_url: feed.ci_url,
                change_id: feed.change_id,
            },
            ..Results::default()
        };

        for observation in feed.results {
            let key = StatusKey::new(
                observation.product,
                observation.origin,
                RunPhase::from_is_after(observation.after),
            );
            results.upsert_raw(
                &observation.test,
                observation.subtest.as_deref(),
                key,
                &observation.status,
                &observation.known_intermittent,
            );
        }

        debug!("loaded results for {} tests from feed", results.len());
        Ok(results)
    }

    /// Reads and parses a JSON feed from disk.
    pub fn from_feed_path(path: &Utf8Path) -> Result<Self, FeedParseError> {
        let json = std::fs::read_to_string(path).map_err(|error| FeedParseError::Read {
            path: path.to_owned(),
            error,
        })?;
        Self::from_feed_json(&json)
    }
}
