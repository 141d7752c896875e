//! RelayDB 连接管理核心
//!
//! 把逻辑连接 id 解析为可用的数据库连接,在一个主库与可选的从库之间路由。
//! 使用者需要提供一个 [`ConnectionFactory`] 实现,把配置值变成实现了
//! [`Connection`] 的连接。

pub mod cache;
pub mod connection;
pub mod dsn;
pub mod factory;
pub mod manager;
pub mod master;
pub mod static_connection;
pub mod topology;

pub use relaydb_common as common;

pub use cache::{CacheStats, Partition, RoleCache};
pub use connection::{
    Command, Connection, ConnectionExt, ConnectionLink, Params, Schema, SharedConnection,
    TableSchema,
};
pub use dsn::Dsn;
pub use factory::{ConnectionFactory, DriverFactory, Instance};
pub use manager::ConnectionManager;
pub use master::{MasterRef, MasterThunk};
pub use static_connection::StaticConnection;
pub use topology::{Registry, Role, Topology};

pub use common::{
    ConnectionError, ConnectionResult, ErrorKind, LogConfig, ManagerConfig,
    DEFAULT_CONNECTION_ID,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn init_logging(config: &LogConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(config.with_thread_ids))
        .with(filter)
        .init();
}
