//! Server configuration
//!
//! Settings come from three layers, strongest first: command line flags and
//! their `SIMPLETON_*` environment variables (clap resolves flag-vs-env
//! precedence), an optional TOML configuration file, and built-in defaults.

use clap::Parser;
use std::path::PathBuf;

use crate::config_file::ConfigFile;
use crate::error::Result;

/// Default listen addresses: plain HTTP on all v4 and v6 interfaces.
pub const DEFAULT_LISTEN_ADDRS: &str = "0.0.0.0:80,[::]:80";

/// Command line interface.
#[derive(Parser, Debug)]
#[command(
    name = "simpleton",
    version,
    about = "Minimal static file HTTP server"
)]
pub struct Cli {
    /// Directory to serve files from
    #[arg(value_name = "CONTENT_DIR", env = "SIMPLETON_CONTENT_PATH")]
    pub content_dir: Option<PathBuf>,

    /// Comma-separated listen addresses
    #[arg(
        short = 'l',
        long = "listen",
        env = "SIMPLETON_LISTEN_ADDRS",
        value_delimiter = ',',
        value_name = "ADDR,..."
    )]
    pub listen: Option<Vec<String>>,

    /// Access log path, `-` for stdout
    #[arg(
        short = 'a',
        long = "access-log",
        env = "SIMPLETON_ACCESS_LOG_PATH",
        value_name = "PATH"
    )]
    pub access_log: Option<PathBuf>,

    /// Error log path, `-` for stderr
    #[arg(
        short = 'e',
        long = "error-log",
        env = "SIMPLETON_ERROR_LOG_PATH",
        value_name = "PATH"
    )]
    pub error_log: Option<PathBuf>,

    /// Chroot into the content directory before serving
    #[arg(short = 'c', long = "chroot", env = "SIMPLETON_CHROOT")]
    pub chroot: bool,

    /// TOML configuration file
    #[arg(short = 'C', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Where a log stream goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// `-` (or nothing) selects the default stream for that log.
    fn resolve(path: Option<PathBuf>, default: LogTarget) -> LogTarget {
        match path {
            None => default,
            Some(p) if p.as_os_str() == "-" => default,
            Some(p) => LogTarget::File(p),
        }
    }
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub content_dir: PathBuf,
    pub listen_addrs: Vec<String>,
    pub access_log: LogTarget,
    pub error_log: LogTarget,
    pub chroot: bool,
}

impl Config {
    /// Merge CLI, environment, config file, and defaults.
    ///
    /// Returns `Ok(None)` when no content directory was given anywhere; the
    /// caller prints usage and exits cleanly in that case.
    pub fn resolve(cli: Cli) -> Result<Option<Config>> {
        let file = match &cli.config {
            Some(path) => ConfigFile::from_file(path)?,
            None => ConfigFile::default(),
        };

        let content_dir = match cli.content_dir.or(file.content_dir) {
            Some(dir) => dir,
            None => return Ok(None),
        };

        let listen_addrs = cli
            .listen
            .or(file.listen_addrs)
            .unwrap_or_else(|| split_addrs(DEFAULT_LISTEN_ADDRS));

        Ok(Some(Config {
            content_dir,
            listen_addrs,
            access_log: LogTarget::resolve(
                cli.access_log.or(file.access_log),
                LogTarget::Stdout,
            ),
            error_log: LogTarget::resolve(cli.error_log.or(file.error_log), LogTarget::Stderr),
            chroot: cli.chroot || file.chroot.unwrap_or(false),
        }))
    }
}

/// Split a comma-separated address list, dropping empty items.
pub fn split_addrs(addrs: &str) -> Vec<String> {
    addrs
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}
