//! RelayDB 公共模块
//!
//! 错误类型、配置值工具与管理器配置。

pub mod error;
pub mod types;
pub mod config;

pub use config::{LogConfig, ManagerConfig};
pub use error::{ConnectionError, ConnectionResult, ErrorKind};
pub use types::*;
