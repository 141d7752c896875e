//! 拓扑解析
//!
//! 把注册表中的一项规范化为 `{master, slave}` 结构:
//! - 含 `master` 键的对象: 按结构读取,空的 `slave` 视为不存在
//! - 其它任何值: 整体作为主库配置,没有从库

use crate::common::{is_blank, non_blank, ConnectionConfig, ConnectionError, ConnectionResult, ManagerConfig};
use std::collections::BTreeMap;
use std::fmt;

/// 连接角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Master,
    Slave,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Master => f.write_str("master"),
            Role::Slave => f.write_str("slave"),
        }
    }
}

/// 规范化后的拓扑
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    pub master: ConnectionConfig,
    pub slave: Option<ConnectionConfig>,
}

impl Topology {
    pub fn has_slave(&self) -> bool {
        self.slave.is_some()
    }

    /// `get` 与 `create` 选择的角色: 有从库时为从库
    pub fn preferred_role(&self) -> Role {
        if self.has_slave() {
            Role::Slave
        } else {
            Role::Master
        }
    }

    pub fn config_for(&self, role: Role) -> Option<&ConnectionConfig> {
        match role {
            Role::Master => non_blank(Some(&self.master)),
            Role::Slave => self.slave.as_ref(),
        }
    }
}

/// 连接注册表
///
/// 构造后不再变化。配置为空的项视为不存在,`contains`、`ids` 与 `len` 都会跳过它们。
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<String, ConnectionConfig>,
}

impl Registry {
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, ConnectionConfig)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn from_config(config: &ManagerConfig) -> Self {
        Self::new(config.connections.clone())
    }

    /// # Brief
    /// 解析 id 对应的拓扑
    ///
    /// # Arguments
    /// * `id` - 连接 id
    ///
    /// # Returns
    /// id 不存在或配置为空时返回配置错误
    pub fn resolve(&self, id: &str) -> ConnectionResult<Topology> {
        let entry = non_blank(self.entries.get(id)).ok_or_else(|| {
            ConnectionError::Config(format!(
                "The configuration with id \"{}\" was not found in the ConnectionManager.",
                id
            ))
        })?;

        match entry.as_object() {
            Some(map) if map.contains_key("master") => Ok(Topology {
                master: map["master"].clone(),
                slave: non_blank(map.get("slave")).cloned(),
            }),
            _ => Ok(Topology {
                master: entry.clone(),
                slave: None,
            }),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        non_blank(self.entries.get(id)).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, entry)| !is_blank(entry))
            .map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.ids().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
