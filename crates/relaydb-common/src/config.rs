//! 管理器配置模块
//!
//! 定义连接注册表与日志的配置项,支持从 TOML 文件加载:
//!
//! ```toml
//! default_connection = "default"
//!
//! [connections.default]
//! dsn = "sqlite::memory:"
//!
//! [connections.analytics.master]
//! dsn = "pgsql:host=primary;dbname=analytics"
//!
//! [connections.analytics.slave]
//! dsn = "pgsql:host=replica;dbname=analytics"
//! ```

use crate::error::{ConnectionError, ConnectionResult};
use crate::types::{ConnectionConfig, DEFAULT_CONNECTION_ID};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// 连接管理器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// 默认连接 id (默认: "default")
    #[serde(default = "default_connection")]
    pub default_connection: String,

    /// 连接注册表: id -> 扁平配置或 {master, slave} 结构
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

fn default_connection() -> String { DEFAULT_CONNECTION_ID.to_string() }

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_connection: default_connection(),
            connections: BTreeMap::new(),
            log: LogConfig::default(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub with_thread_ids: bool,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_thread_ids: false,
        }
    }
}

impl ManagerConfig {
    /// # Brief
    /// 从 TOML 文件加载配置
    ///
    /// # Arguments
    /// * `path` - 配置文件路径
    pub fn from_file(path: &Path) -> ConnectionResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// # Brief
    /// 从 TOML 字符串解析并校验配置
    pub fn from_toml_str(content: &str) -> ConnectionResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConnectionError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// # Brief
    /// 将配置序列化为 TOML 字符串
    pub fn to_toml(&self) -> ConnectionResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConnectionError::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> ConnectionResult<()> {
        if self.default_connection.is_empty() {
            return Err(ConnectionError::Config(
                "default_connection must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
