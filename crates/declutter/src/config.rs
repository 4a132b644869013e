//! Runtime configuration.
//!
//! Every threshold the tool uses lives here rather than in the components, so
//! each component receives its settings at construction. Values come from, in
//! order: an explicit `--config` path, the `DECLUTTER_CONFIG` environment
//! variable, `$XDG_CONFIG_HOME/declutter/config.toml`, then built-in defaults.

use crate::error::{DeclutterError, Result};
use crate::index::scanner::DEFAULT_SKIP_FOLDERS;
use crate::model::{is_plain_folder_name, HashAlgorithm};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use xdg::BaseDirectories;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root used when a command is given no path.
    pub downloads_dir: PathBuf,
    pub dedup: DedupConfig,
    pub cleanup: CleanupConfig,
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub algorithm: HashAlgorithm,
    /// Files smaller than this are not considered. `0` keeps empty files.
    pub min_file_size: u64,
    /// Extensions to ignore, without the dot.
    pub skip_extensions: Vec<String>,
    /// Directory names never descended into (case-insensitive).
    pub skip_folders: Vec<String>,
    /// Default `--move-to` target for `dupes`.
    pub duplicates_folder: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Installers older than this many days are removed.
    pub installer_age_days: i64,
    /// How deep below the root cleanup looks. `1` means the root's own files.
    pub max_depth: usize,
    /// Optional TOML rule set replacing the built-in rules.
    pub rules_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Folder name under the scanned root that receives attachments.
    pub folder_name: String,
    /// Levels of attached messages unpacked below each email.
    pub max_nesting: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            downloads_dir: default_downloads_dir(),
            dedup: DedupConfig::default(),
            cleanup: CleanupConfig::default(),
            extract: ExtractConfig::default(),
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Blake3,
            min_file_size: 0,
            skip_extensions: Vec::new(),
            skip_folders: DEFAULT_SKIP_FOLDERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            duplicates_folder: None,
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            installer_age_days: 90,
            max_depth: 1,
            rules_file: None,
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            folder_name: "Extracted_Attachments".to_string(),
            max_nesting: 5,
        }
    }
}

impl Config {
    /// Resolves and loads the configuration file, falling back to defaults.
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        match Self::locate(config_override) {
            Some(path) => {
                log::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    fn locate(config_override: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = config_override {
            return Some(path);
        }
        if let Ok(env_path) = std::env::var("DECLUTTER_CONFIG") {
            return Some(PathBuf::from(env_path));
        }
        BaseDirectories::with_prefix("declutter")
            .ok()
            .and_then(|xdg| xdg.find_config_file("config.toml"))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DeclutterError::PathNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)
            .map_err(|e| DeclutterError::UnsupportedFormat(format!("Failed to parse config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cleanup.installer_age_days < 0 {
            return Err(DeclutterError::Config(format!(
                "installer_age_days must not be negative (got {})",
                self.cleanup.installer_age_days
            )));
        }
        if self.cleanup.max_depth == 0 {
            return Err(DeclutterError::Config(
                "cleanup.max_depth must be at least 1".to_string(),
            ));
        }
        if !is_plain_folder_name(&self.extract.folder_name) {
            return Err(DeclutterError::Config(format!(
                "extract.folder_name must be a single folder name (got '{}')",
                self.extract.folder_name
            )));
        }
        Ok(())
    }

    /// Where `rules init` writes by default.
    pub fn default_rules_path() -> Option<PathBuf> {
        BaseDirectories::with_prefix("declutter")
            .ok()
            .and_then(|xdg| xdg.place_config_file("rules.toml").ok())
    }
}

/// `~/Downloads`, using `USERPROFILE` where `HOME` is unset.
pub fn default_downloads_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Downloads")
}
