use assurance_types::ValidationError;
use thiserror::Error;

/// 采集运行时统一错误类型
#[derive(Error, Debug)]
pub enum AssuranceError {
    /// 输入结构不符合预期（携带原因与原始输入）
    #[error("Runtime Error: {0}")]
    Validation(#[from] ValidationError),

    /// 网络或 TLS 层错误
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 设备管理接口返回错误
    #[error("API error: {0}")]
    Api(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Bus error: {0}")]
    Bus(String),

    /// 阻塞调用超时
    #[error("Timeout: {0}")]
    Timeout(String),

    /// 规则函数无法识别的设备状态（如未实现的 HA 模式）
    #[error("Unsupported state: {0}")]
    UnsupportedState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 任务被取消
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// 采集任务失败（panic 或多个设备失败的汇总）
    #[error("Task failed: {0}")]
    Task(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, AssuranceError>;

impl AssuranceError {
    pub fn api(msg: impl Into<String>) -> Self {
        AssuranceError::Api(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        AssuranceError::Storage(msg.into())
    }

    pub fn bus(msg: impl Into<String>) -> Self {
        AssuranceError::Bus(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AssuranceError::Config(msg.into())
    }

    /// 是否为输入结构错误
    pub fn is_validation(&self) -> bool {
        matches!(self, AssuranceError::Validation(_))
    }
}
