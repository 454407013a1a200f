// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the notify step.
//!
//! Defaults are embedded in the binary (see `default-config.toml`). A user config file, if
//! provided, overrides them key by key.

use crate::errors::ConfigError;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::{collections::BTreeSet, io};
use tracing::{debug, warn};
use wpt_notify_metadata::{BugComponent, BugComponentParseError};

/// Specifies where to load configuration from.
#[derive(Clone, Copy, Debug)]
pub enum ConfigLocation<'a> {
    /// Use the built-in defaults only.
    Default,

    /// Load overrides from an explicit path.
    ///
    /// Returns an error if the file does not exist.
    Explicit(&'a Utf8Path),
}

/// Resolved configuration for the notify step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NotifyConfig {
    /// The product whose regressions are filed.
    pub owning_product: String,

    /// Products shown alongside for comparison.
    pub comparator_products: Vec<String>,

    /// Components eligible for automatic filing.
    pub components: BTreeSet<BugComponent>,

    /// Base URL of the bug tracker, without a trailing slash.
    pub tracker_url: String,

    /// Repository holding the metadata links, mentioned in filed bugs.
    pub metadata_url: String,

    /// Where tests live in the repository.
    pub paths: PathsConfig,
}

/// Repository locations for the test trees.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathsConfig {
    /// Root of the upstream test tree.
    pub wpt_root: Utf8PathBuf,

    /// Root of the `/_mozilla/` test tree.
    pub mozilla_root: Utf8PathBuf,
}

impl NotifyConfig {
    /// The embedded default config TOML.
    const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Loads configuration from the given location, layered on top of the defaults.
    pub fn load(location: ConfigLocation<'_>) -> Result<Self, ConfigError> {
        Self::load_with_warnings(location, &mut DefaultConfigWarnings)
    }

    /// Returns the built-in default configuration.
    pub fn from_defaults() -> Self {
        Self::defaults()
    }

    /// Parses user overrides from a TOML string, layered on top of the defaults.
    ///
    /// `source_name` is used in error messages and warnings.
    pub fn from_toml_str(contents: &str, source_name: &str) -> Result<Self, ConfigError> {
        Self::from_toml_str_with_warnings(contents, source_name, &mut DefaultConfigWarnings)
    }

    fn load_with_warnings(
        location: ConfigLocation<'_>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigError> {
        match location {
            ConfigLocation::Default => {
                debug!("notify config: using built-in defaults");
                Ok(Self::defaults())
            }
            ConfigLocation::Explicit(path) => {
                debug!("notify config: loading from {path}");
                let contents = match std::fs::read_to_string(path) {
                    Ok(contents) => contents,
                    Err(error) if error.kind() == io::ErrorKind::NotFound => {
                        return Err(ConfigError::FileNotFound {
                            path: path.to_owned(),
                        });
                    }
                    Err(error) => {
                        return Err(ConfigError::Read {
                            path: path.to_owned(),
                            error,
                        });
                    }
                };
                Self::from_toml_str_with_warnings(&contents, path.as_str(), warnings)
            }
        }
    }

    fn from_toml_str_with_warnings(
        contents: &str,
        source_name: &str,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigError> {
        let (config, unknown) = DeserializedConfig::deserialize_toml(contents, source_name)?;
        if !unknown.is_empty() {
            warnings.unknown_config_keys(source_name, &unknown);
        }
        Self::defaults().apply(config, source_name)
    }

    /// Parses the embedded defaults.
    ///
    /// Panics if the embedded TOML is invalid, incomplete, or contains unknown keys.
    fn defaults() -> Self {
        let (config, unknown) = DeserializedConfig::deserialize_toml(Self::DEFAULT_CONFIG, "<default>")
            .expect("embedded default config should be valid");

        // The default config ships with the binary, so unknown keys are a bug.
        if !unknown.is_empty() {
            panic!(
                "found unknown keys in default config: {}",
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            );
        }

        let notify = config.notify;
        let paths = config.paths;
        Self {
            owning_product: notify
                .owning_product
                .expect("default config sets notify.owning-product"),
            comparator_products: notify
                .comparator_products
                .expect("default config sets notify.comparator-products"),
            components: notify
                .components
                .expect("default config sets notify.components")
                .parse()
                .expect("default config components are valid"),
            tracker_url: notify
                .tracker_url
                .expect("default config sets notify.tracker-url"),
            metadata_url: notify
                .metadata_url
                .expect("default config sets notify.metadata-url"),
            paths: PathsConfig {
                wpt_root: paths.wpt_root.expect("default config sets paths.wpt-root"),
                mozilla_root: paths
                    .mozilla_root
                    .expect("default config sets paths.mozilla-root"),
            },
        }
    }

    /// Applies overrides from a deserialized config.
    fn apply(mut self, config: DeserializedConfig, source_name: &str) -> Result<Self, ConfigError> {
        let DeserializedConfig { notify, paths } = config;

        if let Some(owning_product) = notify.owning_product {
            self.owning_product = owning_product;
        }
        if let Some(comparator_products) = notify.comparator_products {
            self.comparator_products = comparator_products;
        }
        if let Some(components) = notify.components {
            self.components =
                components
                    .parse()
                    .map_err(|error| ConfigError::InvalidComponent {
                        source_name: source_name.to_owned(),
                        error,
                    })?;
        }
        if let Some(tracker_url) = notify.tracker_url {
            self.tracker_url = tracker_url;
        }
        if let Some(metadata_url) = notify.metadata_url {
            self.metadata_url = metadata_url;
        }
        if let Some(wpt_root) = paths.wpt_root {
            self.paths.wpt_root = wpt_root;
        }
        if let Some(mozilla_root) = paths.mozilla_root {
            self.paths.mozilla_root = mozilla_root;
        }

        // Links are built as "{tracker_url}/show_bug.cgi?...".
        let trimmed = self.tracker_url.trim_end_matches('/').len();
        self.tracker_url.truncate(trimmed);

        if self.comparator_products.contains(&self.owning_product) {
            warn!(
                "in config {source_name}, owning product `{}` is also listed as a comparator; \
                 ignoring it as a comparator",
                self.owning_product,
            );
            let owning_product = self.owning_product.clone();
            self.comparator_products.retain(|p| *p != owning_product);
        }

        Ok(self)
    }
}

/// Trait for handling configuration warnings.
///
/// Allows warnings to be logged (the default) or collected in tests.
trait ConfigWarnings {
    /// Handle unknown configuration keys.
    fn unknown_config_keys(&mut self, source_name: &str, unknown: &BTreeSet<String>);
}

/// Logs warnings using the tracing crate.
struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, source_name: &str, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.push_str(unknown.iter().next().expect("one unknown key"));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                unknown_str.push('\n');
                unknown_str.push_str("  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!("in config {source_name}, ignoring unknown configuration {unknown_str}");
    }
}

/// Configuration as deserialized, with every key optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedConfig {
    #[serde(default)]
    notify: DeserializedNotifyConfig,
    #[serde(default)]
    paths: DeserializedPathsConfig,
}

impl DeserializedConfig {
    /// Deserializes TOML content and returns the config along with any unknown keys.
    fn deserialize_toml(
        contents: &str,
        source_name: &str,
    ) -> Result<(Self, BTreeSet<String>), ConfigError> {
        let deserializer =
            toml::Deserializer::parse(contents).map_err(|error| ConfigError::Syntax {
                source_name: source_name.to_owned(),
                error,
            })?;

        let mut unknown = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            unknown.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(deserializer, &mut cb);
        let config: DeserializedConfig =
            serde_path_to_error::deserialize(ignored_de).map_err(|error| ConfigError::Parse {
                source_name: source_name.to_owned(),
                error: Box::new(error),
            })?;

        Ok((config, unknown))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedNotifyConfig {
    #[serde(default)]
    owning_product: Option<String>,
    #[serde(default)]
    comparator_products: Option<Vec<String>>,
    #[serde(default)]
    components: Option<DeserializedComponents>,
    #[serde(default)]
    tracker_url: Option<String>,
    #[serde(default)]
    metadata_url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedPathsConfig {
    #[serde(default)]
    wpt_root: Option<Utf8PathBuf>,
    #[serde(default)]
    mozilla_root: Option<Utf8PathBuf>,
}

/// The component allow-list: either a list, or the older comma-separated string form
/// (`"Foo :: Bar, Testing :: web-platform-tests"`).
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum DeserializedComponents {
    List(Vec<String>),
    Legacy(String),
}

impl DeserializedComponents {
    fn parse(&self) -> Result<BTreeSet<BugComponent>, BugComponentParseError> {
        match self {
            Self::List(list) => list.iter().map(|s| s.parse()).collect(),
            Self::Legacy(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse())
                .collect(),
        }
    }
}
