use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PublishError, Result};

/// Project-relative location of the configuration file
pub const PROJECT_CONFIG_PATH: &str = ".config/node-pre-gyp-github.toml";

#[derive(Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub release: ReleaseOverrides,
}

/// Caller-supplied values for the recognized release creation fields.
///
/// The tag name is always derived from the project version and cannot be
/// overridden here.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ReleaseOverrides {
    pub target_commitish: Option<String>,
    pub name: Option<String>,
    pub body: Option<String>,
    pub draft: Option<bool>,
    pub prerelease: Option<bool>,
}

impl ReleaseOverrides {
    /// Fill fields unset here from `fallback`.
    pub fn or(self, fallback: ReleaseOverrides) -> Self {
        Self {
            target_commitish: self.target_commitish.or(fallback.target_commitish),
            name: self.name.or(fallback.name),
            body: self.body.or(fallback.body),
            draft: self.draft.or(fallback.draft),
            prerelease: self.prerelease.or(fallback.prerelease),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| PublishError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load the first configuration file found: `explicit`, then the project
    /// file, then the user-wide file.
    pub fn discover(project_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let project_path = project_dir.join(PROJECT_CONFIG_PATH);
        if project_path.exists() {
            return Self::load(&project_path);
        }

        Self::load(&Self::default_path())
    }

    /// Get the user-wide configuration file path
    pub fn default_path() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("node-pre-gyp-github.toml"))
            .unwrap_or_else(|| PathBuf::from("~/.config/node-pre-gyp-github.toml"))
    }

    /// Merge with overrides given on the command line, which take precedence
    pub fn merge_with_args(self, args: ReleaseOverrides) -> ReleaseOverrides {
        args.or(self.release)
    }
}
