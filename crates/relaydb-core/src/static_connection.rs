//! 基于配置的静态连接
//!
//! 不访问网络,所有信息都来自配置值:
//!
//! ```toml
//! dsn = "pgsql:host=primary;dbname=app"
//! server_version = "16.2"
//!
//! [tables]
//! users = ["id", "name"]
//! ```
//!
//! 用于命令行工具与测试。

use crate::common::{ConnectionError, ConnectionResult};
use crate::connection::{Command, Connection, ConnectionLink, Params, Schema, TableSchema};
use crate::dsn::Dsn;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub struct StaticConnection {
    link: ConnectionLink,
    dsn: Dsn,
    raw_dsn: String,
    config: Value,
    schema: RwLock<Option<Arc<Schema>>>,
}

impl StaticConnection {
    pub fn from_config(config: &Value) -> ConnectionResult<Self> {
        let raw_dsn = config
            .get("dsn")
            .and_then(Value::as_str)
            .ok_or_else(|| ConnectionError::Config("StaticConnection requires a \"dsn\"".to_string()))?
            .to_string();

        let mut dsn = Dsn::parse(&raw_dsn)?;
        if let Some(driver) = config.get("driver").and_then(Value::as_str) {
            dsn.driver = driver.to_lowercase();
        }

        Ok(Self {
            link: ConnectionLink::new(),
            dsn,
            raw_dsn,
            config: config.clone(),
            schema: RwLock::new(None),
        })
    }

    fn load_schema(&self) -> ConnectionResult<Schema> {
        let mut tables = BTreeMap::new();

        if let Some(defs) = self.config.get("tables") {
            let defs = defs.as_object().ok_or_else(|| {
                ConnectionError::Driver("\"tables\" must be a table of column lists".to_string())
            })?;

            for (name, columns) in defs {
                let columns = columns
                    .as_array()
                    .ok_or_else(|| {
                        ConnectionError::Driver(format!("Columns of table \"{}\" must be a list", name))
                    })?
                    .iter()
                    .filter_map(|c| c.as_str().map(str::to_string))
                    .collect();

                tables.insert(
                    name.clone(),
                    Arc::new(TableSchema {
                        name: name.clone(),
                        columns,
                    }),
                );
            }
        }

        debug!("Loaded {} table(s) for {}", tables.len(), self.raw_dsn);
        Ok(Schema { tables })
    }
}

impl Connection for StaticConnection {
    fn link(&self) -> &ConnectionLink {
        &self.link
    }

    fn create_command(&self, sql: Option<&str>, params: Params) -> ConnectionResult<Command> {
        let mut command = Command::new(sql, params);
        command.connection_id = self.id();
        Ok(command)
    }

    fn driver_name(&self) -> String {
        self.dsn.driver.clone()
    }

    fn dsn(&self) -> String {
        self.raw_dsn.clone()
    }

    fn schema(&self) -> ConnectionResult<Arc<Schema>> {
        if let Some(schema) = self.schema.read().as_ref() {
            return Ok(schema.clone());
        }

        let mut slot = self.schema.write();
        if let Some(schema) = slot.as_ref() {
            return Ok(schema.clone());
        }
        let schema = Arc::new(self.load_schema()?);
        *slot = Some(schema.clone());
        Ok(schema)
    }

    fn server_version(&self) -> ConnectionResult<String> {
        self.config
            .get("server_version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ConnectionError::Driver(format!("Server version unknown for {}", self.raw_dsn))
            })
    }

    fn table_schema(&self, name: &str, refresh: bool) -> ConnectionResult<Option<Arc<TableSchema>>> {
        if refresh {
            *self.schema.write() = None;
        }
        Ok(self.schema()?.table(name))
    }
}
