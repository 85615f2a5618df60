use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const DEBUG_ENV: &str = "ASSURANCE_DEBUG";
pub const FORMAT_ENV: &str = "ASSURANCE_LOG_FORMAT";
pub const API_DEBUG_ENV: &str = "ASSURANCE_API_DEBUG";

/// 非调试模式下只输出这些 target 前缀的日志
const OWN_TARGETS: &[&str] = &["assurance", "collector"];

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// 日志配置
///
/// 启动时从环境变量读取一次，之后只读
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub debug: bool,
    pub format: LogFormat,
    /// 输出设备接口的完整请求/响应
    pub api_debug: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            format: LogFormat::Text,
            api_debug: false,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 通过查找函数读取变量（变量存在即视为开启）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = match lookup(FORMAT_ENV) {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            debug: lookup(DEBUG_ENV).is_some(),
            format,
            api_debug: lookup(API_DEBUG_ENV).is_some(),
        }
    }

    /// 默认过滤规则：调试模式输出全部 debug 日志，否则只输出自身 target 的 info 日志
    pub fn default_directives(&self) -> String {
        if self.debug {
            return "debug".to_string();
        }
        let mut directives = vec!["off".to_string()];
        directives.extend(OWN_TARGETS.iter().map(|target| format!("{}=info", target)));
        if self.api_debug {
            directives.push("assurance::api=debug".to_string());
        }
        directives.join(",")
    }

    /// `RUST_LOG` 存在时优先使用
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directives()))
    }
}

/// 初始化全局 tracing subscriber
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let builder = tracing_subscriber::fmt().with_env_filter(config.env_filter());

    let result = match config.format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Text => builder.with_target(true).try_init(),
    };

    result.map_err(|e| LoggingError::InitError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::from_lookup(lookup(&[]));
        assert_eq!(config, LoggingConfig::default());
        assert_eq!(config.default_directives(), "off,assurance=info,collector=info");
    }

    #[test]
    fn test_debug_flags() {
        let config = LoggingConfig::from_lookup(lookup(&[
            ("ASSURANCE_DEBUG", ""),
            ("ASSURANCE_API_DEBUG", "1"),
            ("ASSURANCE_LOG_FORMAT", "JSON"),
        ]));
        assert!(config.debug);
        assert!(config.api_debug);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.default_directives(), "debug");
    }

    #[test]
    fn test_api_debug_without_debug() {
        let config = LoggingConfig::from_lookup(lookup(&[("ASSURANCE_API_DEBUG", "1")]));
        assert!(config.default_directives().ends_with("assurance::api=debug"));
    }
}
