// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::MetadataStore;
use crate::errors::{MetadataLockError, MetadataReadError, MetadataWriteError};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use debug_ignore::DebugIgnore;
use serde::{Deserialize, Serialize};
use std::{
    fs::{File, TryLockError},
    io::{self, Write},
    thread,
    time::{Duration, Instant},
};
use tracing::debug;
use wpt_notify_metadata::TrackingLink;

/// The default time to wait for another process to release a sync lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// A directory holding tracking links for every sync process.
#[derive(Clone, Debug)]
pub struct MetadataDir {
    dir: Utf8PathBuf,
    lock_timeout: Duration,
}

impl MetadataDir {
    /// Opens a metadata directory, creating it if necessary.
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Result<Self, MetadataLockError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|error| MetadataLockError::DirCreate {
            path: dir.clone(),
            error,
        })?;
        Ok(Self {
            dir,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    /// Sets how long [`lock_exclusive`](Self::lock_exclusive) waits for a held lock.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Utf8Path {
        &self.dir
    }

    /// Acquires the exclusive lock for a sync process and loads its links.
    ///
    /// The lock is held until the returned [`LockedMetadata`] is dropped, so a notify run should
    /// keep it for its whole duration.
    pub fn lock_exclusive(&self, process_name: &str) -> Result<LockedMetadata, MetadataLockError> {
        let file_stem = file_stem(process_name);
        let lock_path = self.dir.join(format!("{file_stem}.lock"));
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|error| MetadataLockError::FileLock {
                path: lock_path.clone(),
                error,
            })?;
        acquire_lock_with_retry(&file, &lock_path, self.lock_timeout)?;

        let links_path = self.dir.join(format!("{file_stem}-links.json"));
        let links = read_links(&links_path, process_name).map_err(MetadataLockError::Load)?;
        debug!(
            "locked metadata for {process_name}: {} existing links at {links_path}",
            links.len()
        );

        Ok(LockedMetadata {
            process_name: process_name.to_owned(),
            links_path,
            locked_file: DebugIgnore(file),
            links,
        })
    }
}

/// Tracking links for one sync process, with that process's lock held.
#[derive(Debug)]
pub struct LockedMetadata {
    process_name: String,
    links_path: Utf8PathBuf,
    // Held for RAII lock semantics; the lock is released when this struct is dropped.
    #[expect(dead_code)]
    locked_file: DebugIgnore<File>,
    links: Vec<TrackingLink>,
}

impl LockedMetadata {
    /// The sync process these links belong to.
    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// The path links are stored at.
    pub fn links_path(&self) -> &Utf8Path {
        &self.links_path
    }

    /// All links for this process, in the order they were added.
    pub fn links(&self) -> &[TrackingLink] {
        &self.links
    }
}

impl MetadataStore for LockedMetadata {
    fn links_for_test(&self, test_id: &str) -> Result<Vec<TrackingLink>, MetadataReadError> {
        Ok(self
            .links
            .iter()
            .filter(|link| link.test_id() == test_id)
            .cloned()
            .collect())
    }

    fn append_link(&mut self, link: TrackingLink) -> Result<(), MetadataWriteError> {
        if self.links.contains(&link) {
            debug!("link for {} already recorded, skipping", link.test_id());
            return Ok(());
        }

        self.links.push(link);
        let result = write_links(&self.links_path, &self.process_name, &self.links);
        if result.is_err() {
            // Keep memory consistent with what's on disk.
            self.links.pop();
        }
        result
    }
}

/// On-disk format for a process's links.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct LinksSnapshot {
    version: u32,
    process_name: String,
    updated_at: DateTime<Utc>,
    links: Vec<TrackingLink>,
}

impl LinksSnapshot {
    const CURRENT_VERSION: u32 = 1;
}

fn read_links(path: &Utf8Path, process_name: &str) -> Result<Vec<TrackingLink>, MetadataReadError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => {
            return Err(MetadataReadError::Read {
                path: path.to_owned(),
                error,
            });
        }
    };

    let snapshot: LinksSnapshot =
        serde_json::from_str(&contents).map_err(|error| MetadataReadError::Deserialize {
            path: path.to_owned(),
            error,
        })?;
    if snapshot.version != LinksSnapshot::CURRENT_VERSION {
        return Err(MetadataReadError::VersionMismatch {
            path: path.to_owned(),
            expected: LinksSnapshot::CURRENT_VERSION,
            actual: snapshot.version,
        });
    }
    if snapshot.process_name != process_name {
        return Err(MetadataReadError::ProcessMismatch {
            path: path.to_owned(),
            expected: process_name.to_owned(),
            actual: snapshot.process_name,
        });
    }

    Ok(snapshot.links)
}

fn write_links(
    path: &Utf8Path,
    process_name: &str,
    links: &[TrackingLink],
) -> Result<(), MetadataWriteError> {
    let snapshot = LinksSnapshot {
        version: LinksSnapshot::CURRENT_VERSION,
        process_name: process_name.to_owned(),
        updated_at: Utc::now(),
        links: links.to_vec(),
    };
    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|error| MetadataWriteError::Serialize { error })?;

    atomicwrites::AtomicFile::new(path, atomicwrites::AllowOverwrite)
        .write(|file| file.write_all(json.as_bytes()))
        .map_err(|error| MetadataWriteError::Write {
            path: path.to_owned(),
            error: match error {
                atomicwrites::Error::Internal(error) | atomicwrites::Error::User(error) => error,
            },
        })
}

/// Maps a process name like `sync/downstream/1234` to something usable as a file name.
fn file_stem(process_name: &str) -> String {
    process_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Acquires an exclusive file lock, retrying until the timeout expires.
fn acquire_lock_with_retry(
    file: &File,
    lock_path: &Utf8Path,
    timeout: Duration,
) -> Result<(), MetadataLockError> {
    let start = Instant::now();
    loop {
        match file.try_lock() {
            Ok(()) => return Ok(()),
            Err(TryLockError::WouldBlock) => {
                if start.elapsed() >= timeout {
                    return Err(MetadataLockError::FileLockTimeout {
                        path: lock_path.to_owned(),
                        timeout_secs: timeout.as_secs(),
                    });
                }
                thread::sleep(LOCK_RETRY_INTERVAL);
            }
            Err(TryLockError::Error(error)) => {
                return Err(MetadataLockError::FileLock {
                    path: lock_path.to_owned(),
                    error,
                });
            }
        }
    }
}
