//! 公共类型
//!
//! 连接配置是任意的 JSON 风格值,由具体的工厂解释。

use serde_json::Value;

/// 未指定 id 时使用的默认连接 id
pub const DEFAULT_CONNECTION_ID: &str = "default";

/// 单个连接的配置值
pub type ConnectionConfig = Value;

/// 判断配置值是否为空
///
/// `null`、`false`、`0`、`""`、`"0"`、空数组与空对象都视为空。
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// 取出非空的配置值
pub fn non_blank(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !is_blank(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_values() {
        for value in [
            json!(null),
            json!(false),
            json!(0),
            json!(0.0),
            json!(""),
            json!("0"),
            json!([]),
            json!({}),
        ] {
            assert!(is_blank(&value), "{} should be blank", value);
        }
    }

    #[test]
    fn test_non_blank_values() {
        for value in [json!(true), json!(1), json!("sqlite::memory:"), json!([1]), json!({"dsn": "x"})] {
            assert!(!is_blank(&value), "{} should not be blank", value);
        }
    }

    #[test]
    fn test_non_blank_option() {
        let v = json!({});
        assert!(non_blank(Some(&v)).is_none());
        assert!(non_blank(None).is_none());
        let v = json!({"dsn": "x"});
        assert_eq!(non_blank(Some(&v)), Some(&v));
    }
}
