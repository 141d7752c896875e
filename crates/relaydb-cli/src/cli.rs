use crate::formatter::{Formatter, Report};
use crate::{CliResult, Config};
use clap::ValueEnum;
use relaydb_common::ManagerConfig;
use relaydb_core::{ConnectionExt, ConnectionManager, DriverFactory, Role, SharedConnection};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// `resolve` 命令请求的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// 与 `get` 相同: 有从库时用从库
    Auto,
    Master,
    Slave,
}

pub struct Cli {
    manager: Arc<ConnectionManager>,
    formatter: Formatter,
}

impl Cli {
    pub fn new(config: &Config) -> CliResult<Self> {
        let manager_config = ManagerConfig::from_file(&config.config_path)?;
        Self::with_manager_config(config, &manager_config)
    }

    pub fn with_manager_config(config: &Config, manager_config: &ManagerConfig) -> CliResult<Self> {
        let factory = DriverFactory::with_static_drivers(config.drivers.iter().cloned());
        debug!("Static drivers: {:?}", factory.drivers());

        Ok(Self {
            manager: ConnectionManager::from_config(manager_config, factory)?,
            formatter: Formatter::new(&config.format, config.color),
        })
    }

    /// 每个 id 一行
    pub fn list(&self) -> Report {
        let default = self.manager.default_connection();
        let documents = self
            .manager
            .registry()
            .ids()
            .map(|id| {
                let slave = self
                    .manager
                    .topology(Some(id))
                    .map(|topology| topology.has_slave())
                    .ok();
                json!({
                    "id": id,
                    "default": id == default,
                    "slave": slave,
                })
            })
            .collect::<Vec<_>>();

        if documents.is_empty() {
            Report::message("No connections configured.")
        } else {
            Report::documents(documents)
        }
    }

    pub fn topology(&self, id: Option<&str>) -> CliResult<Report> {
        let topology = self.manager.topology(id)?;
        Ok(Report::documents(vec![json!({
            "master": topology.master,
            "slave": topology.slave,
        })]))
    }

    /// # Brief
    /// 通过管理器解析连接并描述结果
    ///
    /// 主库解析失败不会让命令失败,错误信息写入 `master` 列。
    pub fn resolve(&self, id: Option<&str>, role: RoleArg) -> CliResult<Report> {
        let (conn, role) = match role {
            RoleArg::Auto => {
                let role = self.manager.topology(id)?.preferred_role();
                (self.manager.get(id)?, role)
            }
            RoleArg::Master => (self.manager.get_master(id)?, Role::Master),
            RoleArg::Slave => (self.manager.get_slave(id)?, Role::Slave),
        };

        Ok(Report::documents(vec![describe(&conn, role)]))
    }

    pub fn print(&self, report: &Report) {
        self.formatter.print(report);
    }
}

fn describe(conn: &SharedConnection, role: Role) -> Value {
    let master = match conn.master() {
        Ok(master) => Value::String(master.dsn()),
        Err(err) => Value::String(format!("error: {}", err)),
    };

    json!({
        "id": conn.id(),
        "role": role.to_string(),
        "driver": conn.driver_name(),
        "dsn": conn.dsn(),
        "master": master,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> Cli {
        let manager_config = ManagerConfig::from_toml_str(
            r#"
            [connections.default.master]
            dsn = "pgsql:host=primary"

            [connections.default.slave]
            dsn = "pgsql:host=replica"

            [connections.local]
            dsn = "sqlite::memory:"

            [connections.legacy]
            dsn = "odbc:legacy"
            "#,
        )
        .unwrap();
        Cli::with_manager_config(&Config::default(), &manager_config).unwrap()
    }

    #[test]
    fn test_list() {
        let report = cli().list();
        assert_eq!(report.documents.len(), 3);
        assert_eq!(
            report.documents[0],
            json!({"id": "default", "default": true, "slave": true})
        );
        assert_eq!(report.documents[2]["slave"], json!(false));
    }

    #[test]
    fn test_list_skips_blank_entries() {
        let manager_config = ManagerConfig::from_toml_str(
            r#"
            [connections.default]
            dsn = "sqlite::memory:"

            [connections.placeholder]
            "#,
        )
        .unwrap();
        let cli = Cli::with_manager_config(&Config::default(), &manager_config).unwrap();

        let report = cli.list();
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.documents[0]["id"], json!("default"));
    }

    #[test]
    fn test_topology() {
        let report = cli().topology(Some("local")).unwrap();
        assert_eq!(
            report.documents[0],
            json!({"master": {"dsn": "sqlite::memory:"}, "slave": null})
        );
        assert!(cli().topology(Some("missing")).is_err());
    }

    #[test]
    fn test_resolve_auto_picks_slave() {
        let report = cli().resolve(None, RoleArg::Auto).unwrap();
        let doc = &report.documents[0];
        assert_eq!(doc["role"], json!("slave"));
        assert_eq!(doc["dsn"], json!("pgsql:host=replica"));
        assert_eq!(doc["master"], json!("pgsql:host=primary"));
        assert_eq!(doc["id"], json!("default"));
    }

    #[test]
    fn test_resolve_master() {
        let report = cli().resolve(Some("local"), RoleArg::Master).unwrap();
        let doc = &report.documents[0];
        assert_eq!(doc["driver"], json!("sqlite"));
        assert_eq!(doc["master"], json!("sqlite::memory:"));
    }

    #[test]
    fn test_resolve_errors() {
        let cli = cli();
        assert!(cli.resolve(Some("local"), RoleArg::Slave).is_err());
        // odbc 不在默认驱动列表中
        let err = cli.resolve(Some("legacy"), RoleArg::Auto).err().unwrap();
        assert!(err.to_string().contains("odbc"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relaydb.toml");
        std::fs::write(&path, "[connections.default]\ndsn = \"mysql:host=db\"\n").unwrap();

        let config = Config {
            config_path: path,
            ..Config::default()
        };
        let report = Cli::new(&config).unwrap().resolve(None, RoleArg::Auto).unwrap();
        assert_eq!(report.documents[0]["dsn"], json!("mysql:host=db"));
        assert_eq!(report.documents[0]["role"], json!("master"));

        let missing = Config {
            config_path: dir.path().join("missing.toml"),
            ..Config::default()
        };
        assert!(Cli::new(&missing).is_err());
    }
}
