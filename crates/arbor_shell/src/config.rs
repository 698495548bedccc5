//! Shell configuration
//!
//! Loaded in layers: built-in defaults, then a TOML file, then environment
//! variables.
//!
//! ```toml
//! page_root = "pages"
//!
//! [history]
//! max_history = 50
//! ```

use crate::error::{Result, ShellError};
use arbor_res::ProjectConfig;
use arbor_transact::NexusConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "arbor.toml";

/// Overrides `history.max_history`
pub const ENV_MAX_HISTORY: &str = "ARBOR_MAX_HISTORY";

/// Overrides `page_root`
pub const ENV_PAGE_ROOT: &str = "ARBOR_PAGE_ROOT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Namespace path pages are imported under
    pub page_root: String,
    /// Undo history settings of the project
    pub history: NexusConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            page_root: "pages".to_string(),
            history: NexusConfig::default(),
        }
    }
}

impl ShellConfig {
    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, `arbor.toml` is read if
    /// present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load_from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ShellError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| ShellError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded shell config from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment overrides, reading variables through `var`
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var(ENV_MAX_HISTORY) {
            self.history.max_history = value.trim().parse().map_err(|_| ShellError::Env {
                var: ENV_MAX_HISTORY,
                value: value.clone(),
            })?;
            log::info!("History bound from env: {}", self.history.max_history);
        }

        if let Some(root) = var(ENV_PAGE_ROOT) {
            if !root.is_empty() {
                log::info!("Page root from env: {}", root);
                self.page_root = root;
            }
        }

        Ok(())
    }

    /// Project settings derived from this config
    pub fn project(&self) -> ProjectConfig {
        ProjectConfig {
            history: self.history.clone(),
        }
    }

    /// Path of a config file given on the command line, if any
    pub fn path_from_args(args: &[String]) -> Option<PathBuf> {
        args.iter()
            .position(|arg| arg == "--config")
            .and_then(|at| args.get(at + 1))
            .map(PathBuf::from)
    }
}
