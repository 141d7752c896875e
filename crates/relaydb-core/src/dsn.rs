//! DSN 解析
//!
//! 解析 `driver:key=value;key=value` 形式的数据源名称,例如
//! `pgsql:host=localhost;port=5432;dbname=app` 或 `sqlite::memory:`。

use crate::common::{ConnectionError, ConnectionResult};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    pub driver: String,
    /// `key=value` 形式的参数,保持原有顺序
    pub params: Vec<(String, String)>,
    /// 不含 `=` 的剩余部分,例如 sqlite 的文件路径
    pub path: Option<String>,
}

impl Dsn {
    pub fn parse(dsn: &str) -> ConnectionResult<Self> {
        let (driver, rest) = dsn
            .split_once(':')
            .ok_or_else(|| ConnectionError::Config(format!("Invalid DSN \"{}\": missing driver", dsn)))?;

        if driver.is_empty() {
            return Err(ConnectionError::Config(format!(
                "Invalid DSN \"{}\": empty driver",
                dsn
            )));
        }

        let mut params = Vec::new();
        let mut path = None;

        if rest.contains('=') {
            for pair in rest.split(';').filter(|s| !s.is_empty()) {
                match pair.split_once('=') {
                    Some((key, value)) => {
                        params.push((key.trim().to_string(), value.trim().to_string()));
                    }
                    None => {
                        return Err(ConnectionError::Config(format!(
                            "Invalid DSN parameter \"{}\" in \"{}\"",
                            pair, dsn
                        )));
                    }
                }
            }
        } else if !rest.is_empty() {
            path = Some(rest.to_string());
        }

        Ok(Self {
            driver: driver.to_lowercase(),
            params,
            path,
        })
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 从 DSN 中取出驱动名,无法解析时返回 None
    pub fn driver_of(dsn: &str) -> Option<String> {
        Self::parse(dsn).ok().map(|d| d.driver)
    }
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.driver)?;
        if let Some(ref path) = self.path {
            return f.write_str(path);
        }
        let pairs: Vec<String> = self.params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        f.write_str(&pairs.join(";"))
    }
}
