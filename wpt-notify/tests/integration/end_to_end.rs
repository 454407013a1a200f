// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::{Result, ensure};
use indoc::indoc;
use pretty_assertions::assert_eq;
use wpt_notify::{
    config::{ConfigLocation, NotifyConfig},
    metadata::{MetadataDir, MetadataStore},
    notify::{Notifier, SyncContext},
    results::Results,
    tracker::BugId,
};
use wpt_notify_metadata::{Status, TrackingLink};

fn sync_context() -> SyncContext {
    SyncContext {
        process_name: "sync/downstream/1234".to_owned(),
        change_id: "1234".to_owned(),
        tracking_bug: "100000".to_owned(),
    }
}

fn load_config(temp_dir: &Utf8TempDir) -> Result<NotifyConfig> {
    let config_path = temp_dir.path().join("notify.toml");
    std::fs::write(
        &config_path,
        indoc! {r#"
            [notify]
            tracker-url = "https://bugzilla.example.org/"
            components = "Foo :: Bar, Testing :: web-platform-tests"
        "#},
    )?;
    Ok(NotifyConfig::load(ConfigLocation::Explicit(&config_path))?)
}

#[test]
fn files_once_and_links() -> Result<()> {
    let temp_dir = Utf8TempDir::new()?;
    let config = load_config(&temp_dir)?;
    let notifier = Notifier::new(&config);
    let metadata = MetadataDir::new(temp_dir.path().join("metadata"))?;

    let feed_path = temp_dir.path().join("feed.json");
    std::fs::write(&feed_path, FEED)?;

    let tracker = SequentialTracker::new(500);
    let oracle = WptOracle::new();
    {
        let mut results = Results::from_feed_path(&feed_path)?;
        let mut locked = metadata.lock_exclusive(&sync_context().process_name)?;
        let outcome =
            notifier.notify(&sync_context(), &mut results, &oracle, &tracker, &mut locked)?;

        ensure!(outcome.failed.is_empty(), "no filing failures");
        assert_eq!(outcome.filed.keys().copied().collect::<Vec<_>>(), [BugId(500)]);
        assert_eq!(
            locked.links_for_test("/test/test.html")?,
            [TrackingLink::new(
                "https://bugzilla.example.org/show_bug.cgi?id=500",
                "firefox",
                "/test/test.html",
                None,
                None,
            )]
        );
    }

    let bugs = tracker.bugs.borrow().clone();
    assert_eq!(bugs.len(), 1);
    assert_eq!(bugs[0].1, "New wpt failures from PR 1234");
    ensure!(
        bugs[0].2.contains("/test/test.html: FAIL (Chrome: PASS)"),
        "body lists the regression: {}",
        bugs[0].2
    );

    // A second run over the same results finds the link on disk and files nothing.
    {
        let mut results = Results::from_feed_path(&feed_path)?;
        let mut locked = metadata.lock_exclusive(&sync_context().process_name)?;
        let outcome =
            notifier.notify(&sync_context(), &mut results, &oracle, &tracker, &mut locked)?;
        ensure!(outcome.is_empty(), "second run files nothing");
        assert_eq!(locked.links().len(), 1);
    }
    assert_eq!(tracker.bugs.borrow().len(), 1);
    assert_eq!(oracle.component_calls.get(), 1);

    Ok(())
}

#[test]
fn crash_link_is_status_scoped() -> Result<()> {
    let temp_dir = Utf8TempDir::new()?;
    let config = load_config(&temp_dir)?;
    let notifier = Notifier::new(&config);
    let metadata = MetadataDir::new(temp_dir.path().join("metadata"))?;
    let tracker = SequentialTracker::new(1);
    let oracle = WptOracle::new();

    let mut results = Results::from_feed_json(FEED)?;
    add_crash(&mut results, "/test/crash.any.worker.html");
    let mut locked = metadata.lock_exclusive(&sync_context().process_name)?;
    let outcome = notifier.notify(&sync_context(), &mut results, &oracle, &tracker, &mut locked)?;

    // Both entries share the component, so one bug covers them.
    assert_eq!(outcome.filed.len(), 1);
    let filed = &outcome.filed[&BugId(1)];
    assert_eq!(filed.entries.len(), 2);
    assert_eq!(filed.component, wpt_component());

    let crash_links = locked.links_for_test("/test/crash.any.worker.html")?;
    assert_eq!(crash_links.len(), 1);
    assert_eq!(crash_links[0].status(), Some(Status::Crash));

    let bugs = tracker.bugs.borrow();
    let body = &bugs[0].2;
    ensure!(
        body.contains("### Tests that Crash After Changes\n/test/crash.any.worker.html: CRASH\n"),
        "body lists the crash: {body}"
    );

    Ok(())
}
