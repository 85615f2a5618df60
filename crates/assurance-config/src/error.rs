use assurance_types::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// 启动阶段的配置错误，全部是致命错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment {0} not set")]
    MissingDir(&'static str),

    #[error("{env}={path} is not a directory")]
    NotADirectory { env: &'static str, path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 占位符引用了不存在的环境变量，或花括号不成对
    #[error("{path}: {message}")]
    Placeholder { path: PathBuf, message: String },

    #[error("failed to load {path}: {message}")]
    Dotenv { path: PathBuf, message: String },

    #[error("config source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Runtime Error: {0}")]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
