//! 连接管理器模块
//!
//! 把连接 id 解析为可用的连接,在主库与从库之间路由:
//! - **延迟构造**: 连接在第一次使用时才创建
//! - **记忆化**: 每个 id、每个角色的成功与失败结果都被缓存,失败不会自动重试
//! - **主库回指**: 从库连接可以按需找到主库,且不会反向持有管理器
//!
//! # 示例
//!
//! ```rust,ignore
//! use relaydb_core::{ConnectionExt, ConnectionManager, DriverFactory, Registry};
//! use serde_json::json;
//!
//! let registry = Registry::new([(
//!     "default",
//!     json!({"master": {"dsn": "pgsql:host=primary"}, "slave": {"dsn": "pgsql:host=replica"}}),
//! )]);
//! let manager = ConnectionManager::new(registry, DriverFactory::with_static_drivers(["pgsql"]));
//!
//! let replica = manager.get(None)?;
//! let primary = replica.master()?;
//! ```

use crate::cache::{CacheStats, Partition, RoleCache};
use crate::common::{
    ConnectionError, ConnectionResult, ManagerConfig, DEFAULT_CONNECTION_ID,
};
use crate::connection::SharedConnection;
use crate::factory::{ConnectionFactory, Instance};
use crate::master::MasterRef;
use crate::topology::{Registry, Role, Topology};
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// 连接管理器
///
/// 总是以 `Arc<ConnectionManager>` 的形式存在,从库的延迟主库引用只持有它的 `Weak`。
pub struct ConnectionManager {
    registry: Registry,
    factory: Box<dyn ConnectionFactory>,
    cache: RoleCache<SharedConnection>,
    /// 默认连接 id,应在启动时设置一次
    default_connection: RwLock<String>,
    this: Weak<ConnectionManager>,
}

impl ConnectionManager {
    pub fn new<F>(registry: Registry, factory: F) -> Arc<Self>
    where
        F: ConnectionFactory + 'static,
    {
        Self::build(registry, Box::new(factory), DEFAULT_CONNECTION_ID.to_string())
    }

    /// # Brief
    /// 从管理器配置创建
    ///
    /// # Arguments
    /// * `config` - 注册表与默认 id
    /// * `factory` - 连接工厂
    pub fn from_config<F>(config: &ManagerConfig, factory: F) -> ConnectionResult<Arc<Self>>
    where
        F: ConnectionFactory + 'static,
    {
        config.validate()?;
        Ok(Self::build(
            Registry::from_config(config),
            Box::new(factory),
            config.default_connection.clone(),
        ))
    }

    fn build(registry: Registry, factory: Box<dyn ConnectionFactory>, default_connection: String) -> Arc<Self> {
        debug!(
            "Creating ConnectionManager with {} connection(s), default {}",
            registry.len(),
            default_connection
        );

        Arc::new_cyclic(|this| Self {
            registry,
            factory,
            cache: RoleCache::new(),
            default_connection: RwLock::new(default_connection),
            this: this.clone(),
        })
    }

    /// 创建一个新连接,不经过缓存
    ///
    /// 有从库配置时创建从库,否则创建主库。从库的主库引用为 `Unavailable`。
    pub fn create(&self, id: Option<&str>) -> ConnectionResult<SharedConnection> {
        let id = self.resolve_id(id);
        let topology = self.registry.resolve(&id)?;
        let role = topology.preferred_role();

        let config = topology.config_for(role).ok_or_else(|| {
            ConnectionError::Config(format!(
                "Configuration for connection with id \"{}\" in ConnectionManager not found.",
                id
            ))
        })?;

        self.instantiate(&id, role, config, "")
    }

    pub fn create_master(&self, id: Option<&str>) -> ConnectionResult<SharedConnection> {
        let id = self.resolve_id(id);
        let topology = self.registry.resolve(&id)?;

        let config = topology.config_for(Role::Master).ok_or_else(|| {
            ConnectionError::Config(format!(
                "Configuration for master connection with id \"{}\" in ConnectionManager not found.",
                id
            ))
        })?;

        self.instantiate(&id, Role::Master, config, "master ")
    }

    /// 创建从库连接,不设置主库引用
    ///
    /// 没有从库配置时返回 `InvalidArgument`。
    pub fn create_slave(&self, id: Option<&str>) -> ConnectionResult<SharedConnection> {
        let id = self.resolve_id(id);
        let topology = self.registry.resolve(&id)?;

        let config = topology.config_for(Role::Slave).ok_or_else(|| {
            ConnectionError::InvalidArgument(format!(
                "Configuration for slave connection with id \"{}\" in ConnectionManager not found.",
                id
            ))
        })?;

        self.instantiate(&id, Role::Slave, config, "slave ")
    }

    /// 获取缓存的主库连接
    pub fn get_master(&self, id: Option<&str>) -> ConnectionResult<SharedConnection> {
        let id = self.resolve_id(id);
        self.cache.get_or_create(Partition::Master, &id, || {
            remember(Partition::Master, &id, self.create_master(Some(&id)))
        })
    }

    /// 获取缓存的从库连接,首次创建时设置其主库引用
    pub fn get_slave(&self, id: Option<&str>) -> ConnectionResult<SharedConnection> {
        let id = self.resolve_id(id);
        self.cache.get_or_create(Partition::Slave, &id, || {
            let result = self.create_slave(Some(&id)).map(|conn| {
                self.wire_master(&conn, &id);
                conn
            });
            remember(Partition::Slave, &id, result)
        })
    }

    /// 获取 id 对应的连接
    ///
    /// 有从库时返回从库,否则返回主库。结果另外缓存在 `Resolved` 分区,
    /// 对应的主库或从库分区同时被填充。
    pub fn get(&self, id: Option<&str>) -> ConnectionResult<SharedConnection> {
        let id = self.resolve_id(id);
        self.cache.get_or_create(Partition::Resolved, &id, || {
            let result = self.registry.resolve(&id).and_then(|topology| {
                match topology.preferred_role() {
                    Role::Master => self.get_master(Some(&id)),
                    Role::Slave => self.get_slave(Some(&id)),
                }
            });
            remember(Partition::Resolved, &id, result)
        })
    }

    pub fn topology(&self, id: Option<&str>) -> ConnectionResult<Topology> {
        self.registry.resolve(&self.resolve_id(id))
    }

    pub fn default_connection(&self) -> String {
        self.default_connection.read().clone()
    }

    /// 修改默认连接 id
    ///
    /// 不保证与并发读取者的一致性,应在启动阶段调用。
    pub fn set_default_connection(&self, id: &str) -> ConnectionResult<()> {
        if id.is_empty() {
            return Err(ConnectionError::InvalidArgument(
                "Default connection id must not be empty".to_string(),
            ));
        }

        info!("Default connection set to {}", id);
        *self.default_connection.write() = id.to_string();
        Ok(())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// 不持有所有权的管理器句柄
    pub fn downgrade(&self) -> Weak<Self> {
        self.this.clone()
    }

    fn resolve_id(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => id.to_string(),
            None => self.default_connection(),
        }
    }

    fn instantiate(
        &self,
        id: &str,
        role: Role,
        config: &Value,
        request: &str,
    ) -> ConnectionResult<SharedConnection> {
        match self.factory.create(config)? {
            Instance::Connection(conn) => {
                conn.set_id(id);
                conn.set_master(match role {
                    Role::Master => MasterRef::IsMaster,
                    Role::Slave => MasterRef::Unavailable,
                });
                info!("Created {} connection {} ({})", role, id, conn.driver_name());
                Ok(conn)
            }
            other => Err(ConnectionError::Config(format!(
                "The ConnectionManager factory returned an object of class \"{}\" for {}configuration with id \"{}\", which does not support the Connection capability.",
                other.type_name(),
                request,
                id
            ))),
        }
    }

    /// 设置从库的主库引用
    ///
    /// 主库已成功缓存时直接引用; 否则设置延迟引用,闭包只持有管理器的 Weak。
    fn wire_master(&self, slave: &SharedConnection, id: &str) {
        if let Some(Ok(master)) = self.cache.peek(Partition::Master, id) {
            debug!("Slave {} linked to cached master", id);
            slave.set_master(MasterRef::Direct(master));
            return;
        }

        debug!("Slave {} linked to master lazily", id);
        let manager = self.this.clone();
        let id = id.to_string();
        slave.set_master(MasterRef::lazy(move || match manager.upgrade() {
            Some(manager) => manager.get_master(Some(&id)),
            None => {
                warn!("Master for {} requested after ConnectionManager was dropped", id);
                Err(ConnectionError::Lifecycle(format!(
                    "Unable to create master connection with id \"{}\" because ConnectionManager has already been destroyed.",
                    id
                )))
            }
        }));
    }
}

/// 记录即将被永久缓存的失败
fn remember(
    partition: Partition,
    id: &str,
    result: ConnectionResult<SharedConnection>,
) -> ConnectionResult<SharedConnection> {
    if let Err(ref e) = result {
        warn!("Caching failed {} connection {}: {}", partition, id, e);
    }
    result
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.registry.len())
            .field("default_connection", &self.default_connection())
            .field("cached", &self.cache.len())
            .finish()
    }
}
