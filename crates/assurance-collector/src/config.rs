use assurance_core::{EinsteinConfig, ElasticsearchConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 设备任务失败时的处理策略
///
/// 默认 `FailTogether`：第一个失败的设备会取消其余设备的任务，
/// 所有任务结束后把第一个错误返回给调用方。
/// `Isolate`：失败只记录日志，其余设备继续运行，最后汇总返回。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    FailTogether,
    Isolate,
}

/// 所有采集器共用的配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BaseConfig {
    pub config_dir: PathBuf,
    pub elasticsearch: ElasticsearchConfig,
    pub einstein: EinsteinConfig,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}
