//! Persisted logger configuration.
//!
//! The configuration collaborator owns a TOML file carrying the UI-facing
//! settings that survive restarts: divider position, time display format,
//! filter flags, the selected analyzer profile, alias pairs and the
//! optional capture file path. A missing file yields the defaults.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasEntry {
    pub payload: String,
    pub alias: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggerConfig {
    /// Split position between the log table and the verbose pane, in
    /// pixels. Kept for the UI collaborator; the engine never reads it.
    pub divider_position: u32,
    /// Render timestamps as `H:MM:SS.mmm` instead of raw milliseconds.
    pub formatted_time: bool,
    pub show_duplicates: bool,
    pub hide_no_destination: bool,
    /// Name of the analyzer profile to activate.
    pub analyzer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcap_file: Option<PathBuf>,
    #[serde(rename = "alias", skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<AliasEntry>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            divider_position: 150,
            formatted_time: true,
            show_duplicates: false,
            hide_no_destination: false,
            analyzer: crate::analyzer::profile::PROFILE_NONE.to_string(),
            pcap_file: None,
            aliases: Vec::new(),
        }
    }
}

impl LoggerConfig {
    /// Parse a configuration document.
    pub fn parse(data: &str) -> anyhow::Result<Self> {
        toml::from_str(data).context("Failed to parse config file")
    }

    /// Load configuration from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&data)
    }

    /// Write the configuration back to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let data = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path, data).with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}
