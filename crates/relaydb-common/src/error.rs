//! 错误类型定义模块
//!
//! 定义连接管理器的统一错误类型 ConnectionError 和 Result 别名。
//!
//! 失败的连接构造会被缓存并在之后的每次查询中原样重放,
//! 因此错误类型必须可以 Clone,底层错误通过 Arc 共享。

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// 连接管理错误类型
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    /// 配置错误: id 不存在、角色配置为空、工厂产物不是连接
    #[error("Configuration error: {0}")]
    Config(String),

    /// 调用方请求了不合理的内容,例如在没有从库配置时请求从库
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 延迟解析主库时管理器已被销毁
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// 连接没有可用的主库
    #[error("Master unavailable: {0}")]
    MasterUnavailable(String),

    /// 工厂自身的错误,原样透出
    #[error(transparent)]
    Factory(Arc<dyn StdError + Send + Sync>),

    /// 连接领域操作的错误
    #[error("Driver error: {0}")]
    Driver(String),

    /// I/O 错误
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),
}

/// 错误类别,便于调用方分支处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    InvalidArgument,
    Lifecycle,
    MasterUnavailable,
    Factory,
    Driver,
    Io,
}

impl ConnectionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Lifecycle(_) => ErrorKind::Lifecycle,
            Self::MasterUnavailable(_) => ErrorKind::MasterUnavailable,
            Self::Factory(_) => ErrorKind::Factory,
            Self::Driver(_) => ErrorKind::Driver,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// 包装工厂返回的任意错误
    pub fn factory<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(err))
    }
}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// 连接管理 Result 类型别名
pub type ConnectionResult<T> = Result<T, ConnectionError>;
