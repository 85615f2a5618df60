use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use serde_json::Value;
use std::fmt;

/// 单条校验失败原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReason {
    /// 出错位置（记录名 + 行列）
    pub location: String,
    pub message: String,
    /// 错误类别：data / syntax / eof / io
    pub kind: String,
}

/// 输入结构校验错误
///
/// 携带全部失败原因以及出错的原始输入，便于不重跑即可定位问题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub reasons: Vec<ValidationReason>,
    pub input: Value,
}

impl ValidationError {
    pub fn new(
        location: impl Into<String>,
        message: impl Into<String>,
        kind: impl Into<String>,
        input: Value,
    ) -> Self {
        Self {
            reasons: vec![ValidationReason {
                location: location.into(),
                message: message.into(),
                kind: kind.into(),
            }],
            input,
        }
    }

    fn from_serde(location: &str, err: &serde_json::Error, input: &Value) -> Self {
        let kind = match err.classify() {
            Category::Io => "io",
            Category::Syntax => "syntax",
            Category::Data => "data",
            Category::Eof => "eof",
        };
        let location = if err.line() > 0 {
            format!("{} (line {}, column {})", location, err.line(), err.column())
        } else {
            location.to_string()
        };
        Self::new(location, err.to_string(), kind, input.clone())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{} validation error(s)", self.reasons.len()),
        }
    }
}

impl std::error::Error for ValidationError {}

/// 将原始 JSON 转换为类型化记录
///
/// # 参数
/// * `location` - 记录名称，写入失败原因
/// * `input` - 原始输入
pub fn validate<T: DeserializeOwned>(location: &str, input: &Value) -> Result<T, ValidationError> {
    T::deserialize(input).map_err(|e| ValidationError::from_serde(location, &e, input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Record {
        name: String,
        version: i64,
    }

    #[test]
    fn test_validate_ok() {
        let record: Record = validate("record", &json!({"name": "a", "version": 7})).unwrap();
        assert_eq!(record.name, "a");
    }

    #[test]
    fn test_validate_missing_field() {
        let input = json!({"name": "a"});
        let err = validate::<Record>("record", &input).unwrap_err();

        assert_eq!(err.reasons.len(), 1);
        assert_eq!(err.reasons[0].kind, "data");
        assert!(err.reasons[0].message.contains("version"));
        assert!(err.reasons[0].location.starts_with("record"));
        assert_eq!(err.input, input);
    }

    #[test]
    fn test_display_is_structured_json() {
        let err = ValidationError::new("device", "bad", "data", json!({"x": 1}));
        let rendered: Value = serde_json::from_str(&err.to_string()).unwrap();
        assert_eq!(rendered["reasons"][0]["location"], "device");
        assert_eq!(rendered["input"]["x"], 1);
    }
}
