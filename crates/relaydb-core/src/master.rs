//! 主库引用
//!
//! 每个由管理器产出的连接都携带一个主库引用,描述如何找到它的主库:
//! - `IsMaster`: 自身就是主库
//! - `Unavailable`: 没有可用主库,请求时返回错误
//! - `Direct`: 已解析好的主库连接
//! - `Lazy`: 延迟解析,闭包只以 Weak 方式持有管理器

use crate::common::ConnectionResult;
use crate::connection::SharedConnection;
use std::fmt;
use std::sync::Arc;

/// 延迟解析主库的闭包
///
/// 每次调用都会重新执行,连接本身不缓存结果。
pub type MasterThunk = Arc<dyn Fn() -> ConnectionResult<SharedConnection> + Send + Sync>;

#[derive(Clone, Default)]
pub enum MasterRef {
    IsMaster,
    #[default]
    Unavailable,
    Direct(SharedConnection),
    Lazy(MasterThunk),
}

impl MasterRef {
    pub fn lazy<F>(thunk: F) -> Self
    where
        F: Fn() -> ConnectionResult<SharedConnection> + Send + Sync + 'static,
    {
        Self::Lazy(Arc::new(thunk))
    }

    pub fn is_master(&self) -> bool {
        matches!(self, Self::IsMaster)
    }
}

impl fmt::Debug for MasterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(conn) => f
                .debug_tuple("Direct")
                .field(&conn.id().unwrap_or_default())
                .finish(),
            other => f.write_str(match other {
                Self::IsMaster => "IsMaster",
                Self::Unavailable => "Unavailable",
                _ => "Lazy",
            }),
        }
    }
}
