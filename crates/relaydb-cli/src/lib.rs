pub mod cli;
pub mod formatter;

pub use cli::{Cli, RoleArg};
pub use formatter::{Formatter, OutputFormat, Report};

use relaydb_common::ConnectionError;
use std::path::PathBuf;
use thiserror::Error;

/// 未显式配置时可用的驱动
pub const DEFAULT_DRIVERS: &[&str] = &["sqlite", "pgsql", "mysql", "sqlsrv", "oci"];

#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub log_level: Option<String>,
    pub drivers: Vec<String>,
    pub format: String,
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("relaydb.toml"),
            log_level: None,
            drivers: DEFAULT_DRIVERS.iter().map(|d| d.to_string()).collect(),
            format: "table".to_string(),
            color: true,
        }
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

pub type CliResult<T> = Result<T, CliError>;
