//! 连接工厂模块
//!
//! 工厂把一个配置值变成一个实例。管理器会检查实例是否实现了
//! `Connection`,否则报告配置错误并给出实例的具体类型名。

use crate::common::{ConnectionError, ConnectionResult};
use crate::connection::{Connection, SharedConnection};
use crate::dsn::Dsn;
use crate::static_connection::StaticConnection;
use serde_json::Value;
use std::any::{self, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 工厂产物
pub enum Instance {
    /// 满足连接能力的实例
    Connection(SharedConnection),
    /// 其它类型的值
    Object {
        type_name: &'static str,
        value: Box<dyn Any + Send + Sync>,
    },
    /// 没有产出任何对象
    Nothing,
}

impl Instance {
    pub fn connection<C: Connection>(conn: C) -> Self {
        Self::Connection(Arc::new(conn))
    }

    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Self::Object {
            type_name: any::type_name::<T>(),
            value: Box::new(value),
        }
    }

    /// 实例的类型名,非对象返回 `Not Object`
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Connection(_) => any::type_name::<SharedConnection>(),
            Self::Object { type_name, .. } => *type_name,
            Self::Nothing => "Not Object",
        }
    }
}

impl From<SharedConnection> for Instance {
    fn from(conn: SharedConnection) -> Self {
        Self::Connection(conn)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Instance").field(&self.type_name()).finish()
    }
}

/// 连接工厂
///
/// 工厂返回的错误不会被管理器改写,而是原样透出并缓存。
pub trait ConnectionFactory: Send + Sync {
    fn create(&self, config: &Value) -> ConnectionResult<Instance>;
}

impl<F> ConnectionFactory for F
where
    F: Fn(&Value) -> ConnectionResult<Instance> + Send + Sync,
{
    fn create(&self, config: &Value) -> ConnectionResult<Instance> {
        self(config)
    }
}

pub type Constructor = Arc<dyn Fn(&Value) -> ConnectionResult<Instance> + Send + Sync>;

/// 按驱动名分派的工厂
///
/// 驱动名取自配置中的 `driver` 字段,缺省时取 `dsn` 的前缀。
#[derive(Clone, Default)]
pub struct DriverFactory {
    constructors: BTreeMap<String, Constructor>,
}

impl DriverFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为给定的驱动名注册 `StaticConnection`
    pub fn with_static_drivers<I, S>(drivers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        drivers.into_iter().fold(Self::new(), |factory, driver| {
            factory.register(driver, |config: &Value| {
                StaticConnection::from_config(config).map(Instance::connection)
            })
        })
    }

    pub fn register<F>(mut self, driver: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&Value) -> ConnectionResult<Instance> + Send + Sync + 'static,
    {
        self.constructors
            .insert(driver.into().to_lowercase(), Arc::new(constructor));
        self
    }

    pub fn drivers(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    pub fn driver_for(config: &Value) -> ConnectionResult<String> {
        if let Some(driver) = config.get("driver").and_then(Value::as_str) {
            return Ok(driver.to_lowercase());
        }

        let dsn = config.get("dsn").and_then(Value::as_str).ok_or_else(|| {
            ConnectionError::Config("Connection config has neither \"driver\" nor \"dsn\"".to_string())
        })?;

        Ok(Dsn::parse(dsn)?.driver)
    }
}

impl ConnectionFactory for DriverFactory {
    fn create(&self, config: &Value) -> ConnectionResult<Instance> {
        let driver = Self::driver_for(config)?;
        let constructor = self.constructors.get(&driver).ok_or_else(|| {
            ConnectionError::Config(format!("No constructor registered for driver \"{}\"", driver))
        })?;

        debug!("Creating instance for driver {}", driver);
        constructor(config)
    }
}

impl fmt::Debug for DriverFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverFactory")
            .field("drivers", &self.drivers())
            .finish()
    }
}
