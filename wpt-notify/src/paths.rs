// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping wire-level test ids to source files in the repository.
//!
//! The harness expands some authored files into several tests: `foo.any.js` becomes
//! `foo.any.html`, `foo.any.worker.html` and so on. [`PathResolver`] folds those back into the
//! file they were generated from. It's a heuristic, used when the ownership oracle can't supply
//! the mapping itself.

use crate::config::PathsConfig;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

/// Test ids in this namespace live in the mozilla-specific test tree.
pub const MOZILLA_MARKER: &str = "/_mozilla/";

/// Filename tags that mark a test generated from a multi-global `.js` file.
pub const VARIANT_TAGS: &[&str] = &["any", "worker", "window", "sharedworker", "serviceworker"];

/// Source paths along with the test ids generated from each.
///
/// Every test id appears in exactly one bucket, and buckets are kept in the order their first
/// test id was inserted.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TestPaths {
    paths: IndexMap<Utf8PathBuf, Vec<String>>,
}

impl TestPaths {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `test_id` was generated from `path`.
    ///
    /// Inserting a test id that is already present under any path does nothing.
    pub fn insert(&mut self, path: impl Into<Utf8PathBuf>, test_id: impl Into<String>) {
        let test_id = test_id.into();
        if self.path_for_test(&test_id).is_some() {
            return;
        }
        self.paths.entry(path.into()).or_default().push(test_id);
    }

    /// Iterates over paths and their test ids.
    pub fn iter(&self) -> impl Iterator<Item = (&Utf8Path, &[String])> + '_ {
        self.paths
            .iter()
            .map(|(path, ids)| (path.as_path(), ids.as_slice()))
    }

    /// Iterates over paths.
    pub fn paths(&self) -> impl Iterator<Item = &Utf8Path> + '_ {
        self.paths.keys().map(Utf8PathBuf::as_path)
    }

    /// Returns the test ids generated from a path.
    pub fn ids_for(&self, path: &Utf8Path) -> Option<&[String]> {
        self.paths.get(path).map(Vec::as_slice)
    }

    /// Returns the path a test id was generated from.
    pub fn path_for_test(&self, test_id: &str) -> Option<&Utf8Path> {
        self.paths
            .iter()
            .find(|(_, ids)| ids.iter().any(|id| id == test_id))
            .map(|(path, _)| path.as_path())
    }

    /// Returns the number of paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if there are no paths.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<P: Into<Utf8PathBuf>, S: Into<String>> FromIterator<(P, S)> for TestPaths {
    fn from_iter<I: IntoIterator<Item = (P, S)>>(iter: I) -> Self {
        let mut paths = Self::new();
        for (path, test_id) in iter {
            paths.insert(path, test_id);
        }
        paths
    }
}

/// Resolves test ids to repository paths without consulting the ownership oracle.
#[derive(Clone, Debug)]
pub struct PathResolver {
    wpt_root: Utf8PathBuf,
    mozilla_root: Utf8PathBuf,
}

impl PathResolver {
    /// Creates a resolver rooted at the configured test trees.
    pub fn new(config: &PathsConfig) -> Self {
        Self {
            wpt_root: config.wpt_root.clone(),
            mozilla_root: config.mozilla_root.clone(),
        }
    }

    /// Resolves a single test id.
    pub fn resolve(&self, test_id: &str) -> Utf8PathBuf {
        let test_id = strip_variant_query(test_id);
        if let Some(rest) = test_id.strip_prefix(MOZILLA_MARKER) {
            return self.mozilla_root.join(rest);
        }

        let rest = test_id.trim_start_matches('/');
        let (dir, file_name) = match rest.rsplit_once('/') {
            Some((dir, file_name)) => (Some(dir), file_name),
            None => (None, rest),
        };
        let file_name = fold_multi_global(file_name);
        match dir {
            Some(dir) => self.wpt_root.join(dir).join(file_name),
            None => self.wpt_root.join(file_name),
        }
    }

    /// Resolves test ids, grouping the ones that come from the same file.
    pub fn resolve_all<'a>(&self, test_ids: impl IntoIterator<Item = &'a str>) -> TestPaths {
        test_ids
            .into_iter()
            .map(|test_id| (self.resolve(test_id), test_id))
            .collect()
    }
}

/// Strips `?query` and `#fragment` suffixes, which the harness uses for variants of one file.
fn strip_variant_query(test_id: &str) -> &str {
    match test_id.find(['?', '#']) {
        Some(index) => &test_id[..index],
        None => test_id,
    }
}

/// Maps a generated test file name to the file it came from.
///
/// `foo.any.worker.html` and `foo.any.html` both become `foo.any.js`, `foo.https.window.html`
/// becomes `foo.https.window.js`. Anything else is returned unchanged.
fn fold_multi_global(file_name: &str) -> String {
    let Some(stem) = file_name.strip_suffix(".html") else {
        return file_name.to_owned();
    };
    let Some((rest, tag)) = stem.rsplit_once('.') else {
        return file_name.to_owned();
    };
    if !VARIANT_TAGS.contains(&tag) {
        return file_name.to_owned();
    }

    if tag != "any" && rest.rsplit_once('.').is_some_and(|(_, prev)| prev == "any") {
        format!("{rest}.js")
    } else {
        format!("{stem}.js")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifyConfig;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use test_case::test_case;
    use test_strategy::proptest;

    fn resolver() -> PathResolver {
        PathResolver::new(&NotifyConfig::from_defaults().paths)
    }

    #[test_case("foo.any.html" => "foo.any.js"; "any")]
    #[test_case("foo.any.worker.html" => "foo.any.js"; "any worker")]
    #[test_case("foo.any.serviceworker.html" => "foo.any.js"; "any serviceworker")]
    #[test_case("foo.any.sharedworker.html" => "foo.any.js"; "any sharedworker")]
    #[test_case("foo.worker.html" => "foo.worker.js"; "worker")]
    #[test_case("foo.tentative.https.window.html" => "foo.tentative.https.window.js"; "qualifiers kept")]
    #[test_case("foo-003.html" => "foo-003.html"; "plain html")]
    #[test_case("foo.https.html" => "foo.https.html"; "qualifier only")]
    #[test_case("anyworker.html" => "anyworker.html"; "no tag separator")]
    #[test_case("foo.any.js" => "foo.any.js"; "already folded")]
    fn fold(file_name: &str) -> String {
        fold_multi_global(file_name)
    }

    #[test]
    fn resolve_all_groups_variants() {
        let ids = [
            "/IndexedDB/key-generators/reading-autoincrement-indexes.any.html",
            "/IndexedDB/key-generators/reading-autoincrement-indexes.any.serviceworker.html",
            "/cookie-store/cookieStore_event_arguments.tentative.https.window.html",
            "/css/geometry/DOMMatrix-css-string.worker.html",
            "/css/geometry/DOMMatrix-003.html",
            "/_mozilla/tests/example.html",
        ];
        let paths = resolver().resolve_all(ids);

        let expected: TestPaths = [
            (
                "testing/web-platform/tests/IndexedDB/key-generators/reading-autoincrement-indexes.any.js",
                ids[0],
            ),
            (
                "testing/web-platform/tests/IndexedDB/key-generators/reading-autoincrement-indexes.any.js",
                ids[1],
            ),
            (
                "testing/web-platform/tests/cookie-store/cookieStore_event_arguments.tentative.https.window.js",
                ids[2],
            ),
            (
                "testing/web-platform/tests/css/geometry/DOMMatrix-css-string.worker.js",
                ids[3],
            ),
            ("testing/web-platform/tests/css/geometry/DOMMatrix-003.html", ids[4]),
            ("testing/web-platform/mozilla/tests/tests/example.html", ids[5]),
        ]
        .into_iter()
        .collect();
        assert_eq!(paths, expected);
        assert_eq!(paths.len(), 5);
        assert_eq!(
            paths.ids_for(Utf8Path::new(
                "testing/web-platform/tests/IndexedDB/key-generators/reading-autoincrement-indexes.any.js"
            )),
            Some(&[ids[0].to_owned(), ids[1].to_owned()][..])
        );
    }

    #[test]
    fn query_variants_fold_together() {
        let paths = resolver().resolve_all([
            "/websockets/send.any.html?wss",
            "/websockets/send.any.worker.html?wpt_flags=h2",
            "/dom/events.html#fragment",
        ]);
        let buckets: Vec<_> = paths
            .iter()
            .map(|(path, ids)| (path.as_str(), ids.len()))
            .collect();
        assert_eq!(
            buckets,
            [
                ("testing/web-platform/tests/websockets/send.any.js", 2),
                ("testing/web-platform/tests/dom/events.html", 1),
            ]
        );
    }

    #[test]
    fn mozilla_marker_skips_folding() {
        assert_eq!(
            resolver().resolve("/_mozilla/dom/thing.any.worker.html"),
            "testing/web-platform/mozilla/tests/dom/thing.any.worker.html"
        );
    }

    fn test_id_strategy() -> impl Strategy<Value = String> {
        (
            prop::sample::select(&["", "/_mozilla"][..]),
            prop::collection::vec("[a-z]{1,4}", 0..3),
            "[a-z0-9-]{1,6}",
            prop::collection::vec(
                prop::sample::select(
                    &["any", "worker", "window", "https", "tentative", "serviceworker"][..],
                ),
                0..3,
            ),
            prop::sample::select(&[".html", ".js", ".htm"][..]),
        )
            .prop_map(|(prefix, dirs, stem, tags, ext)| {
                let mut id = prefix.to_owned();
                for dir in dirs {
                    id.push('/');
                    id.push_str(&dir);
                }
                id.push('/');
                id.push_str(&stem);
                for tag in tags {
                    id.push('.');
                    id.push_str(tag);
                }
                id.push_str(ext);
                id
            })
    }

    #[proptest(cases = 256)]
    fn fold_is_idempotent(#[strategy(test_id_strategy())] test_id: String) {
        let file_name = test_id.rsplit('/').next().unwrap_or_default();
        let once = fold_multi_global(file_name);
        prop_assert_eq!(fold_multi_global(&once), once);
    }

    #[proptest(cases = 64)]
    fn resolve_all_is_lossless(
        #[strategy(prop::collection::vec(test_id_strategy(), 0..16))] test_ids: Vec<String>,
    ) {
        let resolver = resolver();
        let paths = resolver.resolve_all(test_ids.iter().map(String::as_str));

        let unique: BTreeSet<&str> = test_ids.iter().map(String::as_str).collect();
        let total: usize = paths.iter().map(|(_, ids)| ids.len()).sum();
        prop_assert_eq!(total, unique.len());

        for test_id in &unique {
            let resolved = resolver.resolve(test_id);
            prop_assert_eq!(paths.path_for_test(test_id), Some(resolved.as_path()));
        }

        // Resolving the same ids again gives the same grouping.
        let again = resolver.resolve_all(test_ids.iter().map(String::as_str));
        prop_assert_eq!(again, paths);
    }
}
