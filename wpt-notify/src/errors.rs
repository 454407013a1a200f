// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by wpt-notify.

use camino::Utf8PathBuf;
use std::{borrow::Cow, error, fmt};
use thiserror::Error;
use wpt_notify_metadata::{BugComponent, BugComponentParseError};

type BoxedSource = Box<dyn error::Error + Send + Sync + 'static>;

/// An error that occurs while loading the notify configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// An explicitly specified config file did not exist.
    #[error("config file not found at {path}")]
    FileNotFound {
        /// The path that was checked.
        path: Utf8PathBuf,
    },

    /// The config file could not be read.
    #[error("failed to read config file at {path}")]
    Read {
        /// The path that failed to be read.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// The config file was not valid TOML.
    #[error("failed to parse config at {source_name}")]
    Syntax {
        /// The file (or embedded source) that failed to parse.
        source_name: String,

        /// The underlying TOML error.
        #[source]
        error: toml::de::Error,
    },

    /// The config file was valid TOML but didn't match the expected schema.
    #[error("failed to deserialize config at {source_name}")]
    Parse {
        /// The file (or embedded source) that failed to parse.
        source_name: String,

        /// The underlying TOML error.
        #[source]
        error: Box<serde_path_to_error::Error<toml::de::Error>>,
    },

    /// A component in the allow-list was not of the form `Product :: Component`.
    #[error("in config at {source_name}, invalid entry in `notify.components`")]
    InvalidComponent {
        /// The file (or embedded source) containing the invalid component.
        source_name: String,

        /// The underlying parse error.
        #[source]
        error: BugComponentParseError,
    },
}

/// An error that occurs while parsing a raw CI result feed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FeedParseError {
    /// The feed file could not be read.
    #[error("failed to read result feed at {path}")]
    Read {
        /// The path that failed to be read.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// The feed was not valid JSON, or did not have the expected shape.
    #[error("failed to parse result feed at `{}`", .error.path())]
    Parse {
        /// The underlying deserialization error, including the path within the document.
        #[source]
        error: serde_path_to_error::Error<serde_json::Error>,
    },

    /// The feed document was followed by more input.
    #[error("unexpected input after result feed")]
    TrailingInput {
        /// The underlying JSON error.
        #[source]
        error: serde_json::Error,
    },
}

/// An error returned by the build ownership oracle.
///
/// The oracle is an external collaborator, so the error carries a free-form message and,
/// optionally, the underlying error.
#[derive(Debug, Error)]
#[error("ownership oracle failed: {message}")]
pub struct OracleError {
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedSource>,
}

impl OracleError {
    /// Creates a new oracle error with the given message.
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new oracle error wrapping an underlying error.
    pub fn with_source(
        message: impl Into<Cow<'static, str>>,
        source: impl Into<BoxedSource>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the message describing the failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An error that occurs while creating a bug in the tracker.
#[derive(Debug, Error)]
#[error("failed to file bug in component {component}: {message}")]
pub struct FilingError {
    component: BugComponent,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedSource>,
}

impl FilingError {
    /// Creates a new filing error.
    pub fn new(component: BugComponent, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            component,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new filing error wrapping an underlying error.
    pub fn with_source(
        component: BugComponent,
        message: impl Into<Cow<'static, str>>,
        source: impl Into<BoxedSource>,
    ) -> Self {
        Self {
            component,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the component the bug was being filed in.
    pub fn component(&self) -> &BugComponent {
        &self.component
    }
}

/// An error that occurs while reading tracking links from the metadata store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MetadataReadError {
    /// The links file could not be read.
    #[error("failed to read metadata links at {path}")]
    Read {
        /// The path that failed to be read.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// The links file could not be deserialized.
    #[error("failed to deserialize metadata links at {path}")]
    Deserialize {
        /// The path that failed to be deserialized.
        path: Utf8PathBuf,

        /// The underlying deserialization error.
        #[source]
        error: serde_json::Error,
    },

    /// The links file was written by an incompatible version.
    #[error("metadata links version mismatch at {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The path with the version mismatch.
        path: Utf8PathBuf,

        /// The expected version.
        expected: u32,

        /// The actual version found.
        actual: u32,
    },

    /// The links file belongs to a different sync process.
    #[error(
        "metadata links at {path} belong to process `{actual}`, expected `{expected}`"
    )]
    ProcessMismatch {
        /// The path that was read.
        path: Utf8PathBuf,

        /// The process name the store was opened for.
        expected: String,

        /// The process name recorded in the file.
        actual: String,
    },
}

/// An error that occurs while persisting a tracking link.
///
/// By the time this is returned the bug has usually been filed already, so callers must surface it:
/// without the link, the next run will file a duplicate bug.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MetadataWriteError {
    /// The links could not be serialized.
    #[error("failed to serialize metadata links")]
    Serialize {
        /// The underlying serialization error.
        #[source]
        error: serde_json::Error,
    },

    /// The links file could not be written.
    #[error("failed to write metadata links to {path}")]
    Write {
        /// The path that failed to be written.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },
}

/// An error that occurs while acquiring the per-process metadata lock.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MetadataLockError {
    /// The metadata directory could not be created.
    #[error("failed to create metadata directory at {path}")]
    DirCreate {
        /// The directory that failed to be created.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// The lock file could not be opened or locked.
    #[error("failed to lock {path}")]
    FileLock {
        /// The lock file path.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// Another process held the lock for longer than the timeout.
    #[error("timed out after {timeout_secs}s waiting for lock on {path}")]
    FileLockTimeout {
        /// The lock file path.
        path: Utf8PathBuf,

        /// The timeout, in seconds.
        timeout_secs: u64,
    },

    /// The lock was acquired but the existing links could not be loaded.
    #[error("failed to load metadata links after locking")]
    Load(#[source] MetadataReadError),
}

/// An error that aborts an entire notify step.
///
/// Failures scoped to a single component are not represented here: they are collected in
/// [`NotifyOutcome`](crate::notify::NotifyOutcome) instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NotifyError {
    /// The ownership oracle could not map paths to components, so nothing was filed.
    #[error("ownership oracle unavailable, not filing any bugs")]
    OracleUnavailable(#[source] OracleError),

    /// Existing tracking links could not be read, so deduplication isn't possible.
    #[error("failed to read existing tracking links, not filing any bugs")]
    MetadataRead(#[source] MetadataReadError),
}

/// Formats an error along with its chain of sources, for logging.
pub(crate) struct DisplayErrorChain<E>(pub(crate) E);

impl<E: error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, ": {err}")?;
            source = err.source();
        }
        Ok(())
    }
}
