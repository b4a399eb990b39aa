//! ツール宣言と引数検証
//!
//! モデルに公開する関数宣言（ToolDef）と、モデルが返した関数呼び出しを閉じたコマンド型へ
//! 変換する ToolSet を定義する。名前から関数を動的に引くのではなく、検証済みの enum に
//! 変換してから実行する。

use crate::error::Error;
use serde_json::Value;

/// ツール実行エラー（ドメイン層）
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl From<ToolError> for Error {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::NotFound(_) | ToolError::InvalidArgs(_) => Error::invalid_data(e.to_string()),
            ToolError::ExecutionFailed(msg) => Error::external("tool", msg),
        }
    }
}

/// モデルに渡す関数宣言（name / description / JSON Schema）
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDef {
    pub fn new(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

/// 閉じたコマンド集合
///
/// `definitions` がモデルに見せる宣言、`parse` がモデルの関数呼び出しを検証済みコマンドに変換する。
pub trait ToolSet {
    type Command;

    fn definitions(&self) -> Vec<ToolDef>;

    /// 未知の名前は `ToolError::NotFound`、引数不正は `ToolError::InvalidArgs`
    fn parse(&self, name: &str, args: &Value) -> Result<Self::Command, ToolError>;
}

/// 必須の文字列引数（空白のみは不正）
pub fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    let s = args
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArgs(format!("missing '{}'", key)))?;
    if s.trim().is_empty() {
        return Err(ToolError::InvalidArgs(format!("'{}' is empty", key)));
    }
    Ok(s)
}

/// 任意の文字列引数（未指定・null・空文字は None）
pub fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ToolError::InvalidArgs(format!(
            "'{}' must be a string, got {}",
            key, other
        ))),
    }
}

/// 必須の数値引数。モデルが数値を文字列で返すことがあるため文字列も受け付ける
pub fn required_f64(args: &Value, key: &str) -> Result<f64, ToolError> {
    let v = args
        .get(key)
        .ok_or_else(|| ToolError::InvalidArgs(format!("missing '{}'", key)))?;
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(ToolError::InvalidArgs(format!("'{}' must be a number, got {}", key, v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_str() {
        let args = json!({"zone_name": "Mission", "blank": "  "});
        assert_eq!(required_str(&args, "zone_name").unwrap(), "Mission");
        assert!(matches!(required_str(&args, "status"), Err(ToolError::InvalidArgs(_))));
        assert!(matches!(required_str(&args, "blank"), Err(ToolError::InvalidArgs(_))));
    }

    #[test]
    fn test_optional_str() {
        let args = json!({"a": "Alice", "b": null, "c": "", "d": 3});
        assert_eq!(optional_str(&args, "a").unwrap(), Some("Alice"));
        assert_eq!(optional_str(&args, "b").unwrap(), None);
        assert_eq!(optional_str(&args, "c").unwrap(), None);
        assert_eq!(optional_str(&args, "missing").unwrap(), None);
        assert!(optional_str(&args, "d").is_err());
    }

    #[test]
    fn test_required_f64_accepts_numeric_strings() {
        let args = json!({"lat": 37.8, "lon": "-122.4", "bad": "north", "nan": true});
        assert_eq!(required_f64(&args, "lat").unwrap(), 37.8);
        assert_eq!(required_f64(&args, "lon").unwrap(), -122.4);
        assert!(required_f64(&args, "bad").is_err());
        assert!(required_f64(&args, "nan").is_err());
        assert!(required_f64(&args, "missing").is_err());
    }

    #[test]
    fn test_tool_error_into_error() {
        let e: Error = ToolError::NotFound("launch_drone".to_string()).into();
        assert!(matches!(e, Error::InvalidData(_)));
        let e: Error = ToolError::ExecutionFailed("upload failed".to_string()).into();
        assert!(matches!(e, Error::ExternalService { .. }));
    }
}
