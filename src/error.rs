use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the simpleton server
#[derive(Error, Debug)]
pub enum SimpletonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("chroot failed: {0}")]
    Chroot(std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SimpletonError>;
