//! Configuration file support
//!
//! Loads server configuration from TOML files. Every field is optional;
//! command line flags and environment variables take precedence over file
//! values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Directory to serve files from
    pub content_dir: Option<PathBuf>,
    /// Listen addresses
    pub listen_addrs: Option<Vec<String>>,
    /// Access log path, `-` for stdout
    pub access_log: Option<PathBuf>,
    /// Error log path, `-` for stderr
    pub error_log: Option<PathBuf>,
    /// Chroot into the content directory before serving
    pub chroot: Option<bool>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}
