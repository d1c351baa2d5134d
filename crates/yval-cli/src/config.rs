//! # Configuration File
//!
//! `yval` reads optional defaults from a YAML file: the path given with
//! `--config`, or `yval.yaml` in the working directory when present.
//! Command-line flags always win over file values.
//!
//! ```yaml
//! schema: schemas/service.yaml
//! documents:
//!   - deploy/web.yaml
//!   - deploy/worker.yaml
//! format: json
//! deny-warnings: true
//! log-format: text
//! ```
//!
//! Relative paths are resolved against the directory holding the file.
//! Unknown keys are rejected.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// File looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "yval.yaml";

/// How diagnostics are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per diagnostic.
    #[default]
    Text,
    /// A JSON array of per-document reports.
    Json,
}

/// How log events are written to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Defaults loaded from the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    pub schema: Option<PathBuf>,
    pub documents: Vec<PathBuf>,
    pub format: OutputFormat,
    pub deny_warnings: bool,
    pub log_format: LogFormat,
}

impl Config {
    /// Load the file at `path`.
    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut config = if text.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str::<Config>(&text)
                .with_context(|| format!("invalid config file: {}", path.display()))?
        };

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `explicit` if given, else `yval.yaml` from `dir` if it exists,
    /// else the defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Config> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            return Self::load(&candidate);
        }
        Ok(Config::default())
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(schema) = self.schema.take() {
            self.schema = Some(base.join(schema));
        }
        self.documents = self
            .documents
            .iter()
            .map(|document| base.join(document))
            .collect();
    }
}
