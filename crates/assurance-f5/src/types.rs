use assurance_collector::BaseConfig;
use assurance_core::HttpNode;
use serde::{Deserialize, Serialize};

/// F5 采集器配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct F5Config {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub devices: Vec<F5BigIP>,
    /// 服务文档索引前缀
    pub data_index: String,
    #[serde(default = "default_true")]
    pub uuid_required: bool,
}

/// 一台被采集的 BIG-IP
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct F5BigIP {
    pub name: String,
    pub node: HttpNode,
    #[serde(default = "default_sla_code")]
    pub sla_code: String,
    #[serde(default = "default_true")]
    pub einstein: bool,
}

/// 系统状态（`/mgmt/tm/sys/system-info` + `/mgmt/tm/sys/license`）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct F5BigIPStatus {
    pub sn: String,
    pub hostname: String,
    pub version: String,
    pub platform: String,
    pub license_status: String,
}

/// 集群中的一台设备（`/mgmt/tm/cm/device`）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct F5BigIPDevice {
    pub name: String,
    pub hostname: String,
    pub sn: String,
    pub management_ip: String,
    /// active / standby / offline / ...
    pub device_state: String,
    pub failover_state: String,
    /// standalone / primary / secondary
    pub ha_role: String,
    pub ha_status: String,
    pub platform: String,
    pub version: String,
    pub partition: String,
    /// 百分比
    pub cpu_usage: u32,
    pub memory_usage: u32,
    #[serde(default)]
    pub uuid: String,
    /// 非空表示维护中
    #[serde(default)]
    pub maintenance: String,
}

fn default_true() -> bool {
    true
}

fn default_sla_code() -> String {
    "L08".to_string()
}
