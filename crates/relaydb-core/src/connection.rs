//! 连接能力模块
//!
//! 定义管理器要求工厂产物满足的 `Connection` trait。连接的具体行为
//! (执行命令、读取表结构、服务器版本) 由实现者决定,管理器只依赖
//! id 与主库引用两个槽位。

use crate::common::{ConnectionError, ConnectionResult};
use crate::master::MasterRef;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 共享的连接句柄
pub type SharedConnection = Arc<dyn Connection>;

/// 命令参数
pub type Params = BTreeMap<String, Value>;

/// 连接的 id 与主库引用槽位
///
/// 连接实现者内嵌一个 `ConnectionLink` 并通过 `Connection::link` 暴露。
#[derive(Debug, Default)]
pub struct ConnectionLink {
    id: RwLock<Option<String>>,
    master: RwLock<MasterRef>,
}

impl ConnectionLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<String> {
        self.id.read().clone()
    }

    pub fn set_id(&self, id: &str) {
        *self.id.write() = Some(id.to_string());
    }

    /// 当前主库引用的副本,读锁在返回前释放
    pub fn master_ref(&self) -> MasterRef {
        self.master.read().clone()
    }

    pub fn set_master(&self, master: MasterRef) {
        *self.master.write() = master;
    }
}

/// 数据库连接
///
/// 任何可以放入连接管理器的连接都必须实现此 trait。
pub trait Connection: Send + Sync + 'static {
    fn link(&self) -> &ConnectionLink;

    fn id(&self) -> Option<String> {
        self.link().id()
    }

    fn set_id(&self, id: &str) {
        self.link().set_id(id);
    }

    fn set_master(&self, master: MasterRef) {
        self.link().set_master(master);
    }

    fn create_command(&self, sql: Option<&str>, params: Params) -> ConnectionResult<Command>;

    fn driver_name(&self) -> String;

    fn dsn(&self) -> String;

    fn schema(&self) -> ConnectionResult<Arc<Schema>>;

    /// 服务器版本字符串
    fn server_version(&self) -> ConnectionResult<String>;

    /// # Brief
    /// 获取指定表的结构
    ///
    /// # Arguments
    /// * `name` - 表名
    /// * `refresh` - 是否忽略已缓存的结构重新加载
    fn table_schema(&self, name: &str, refresh: bool) -> ConnectionResult<Option<Arc<TableSchema>>>;
}

/// `SharedConnection` 上的主库解析
pub trait ConnectionExt {
    /// 返回主库连接
    ///
    /// 自身是主库时返回自身; 延迟引用每次调用都会重新执行闭包。
    fn master(&self) -> ConnectionResult<SharedConnection>;

    fn is_master(&self) -> bool;
}

impl ConnectionExt for SharedConnection {
    fn master(&self) -> ConnectionResult<SharedConnection> {
        match self.link().master_ref() {
            MasterRef::IsMaster => Ok(Arc::clone(self)),
            MasterRef::Direct(master) => Ok(master),
            MasterRef::Lazy(thunk) => thunk(),
            MasterRef::Unavailable => Err(ConnectionError::MasterUnavailable(
                "no master connection available".to_string(),
            )),
        }
    }

    fn is_master(&self) -> bool {
        self.link().master_ref().is_master()
    }
}

/// 待执行的命令
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub sql: Option<String>,
    pub params: Params,
    pub connection_id: Option<String>,
}

impl Command {
    pub fn new(sql: Option<&str>, params: Params) -> Self {
        Self {
            sql: sql.map(str::to_string),
            params,
            connection_id: None,
        }
    }

    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

impl TableSchema {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// 数据库结构信息
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub tables: BTreeMap<String, Arc<TableSchema>>,
}

impl Schema {
    pub fn table(&self, name: &str) -> Option<Arc<TableSchema>> {
        self.tables.get(name).cloned()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}
