use assurance_collector::BaseConfig;
use assurance_core::HttpNode;
use serde::{Deserialize, Serialize};

/// Fortinet 采集器配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FortiConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub managers: Vec<FortiManager>,
    pub data_index: String,
    #[serde(default = "default_true")]
    pub uuid_required: bool,
    /// 查询设备所属的 ADOM
    #[serde(default = "default_true")]
    pub with_adoms: bool,
}

/// 一台 FortiManager
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FortiManager {
    pub name: String,
    pub node: HttpNode,
    #[serde(default = "default_sla_code")]
    pub sla_code: String,
    #[serde(default = "default_true")]
    pub einstein: bool,
}

/// `/sys/status`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FortiManagerStatus {
    pub sn: String,
    pub hostname: String,
    /// Major.Minor.Patch
    pub version: String,
    pub bios: String,
    pub license_status: String,
}

/// HA 成员角色，部分固件以整数返回
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HaRole {
    Code(i64),
    Name(String),
}

impl HaRole {
    /// `master` 或 `1`
    pub fn is_master(&self) -> bool {
        match self {
            HaRole::Code(code) => *code == 1,
            HaRole::Name(name) => name == "master",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HaSlave {
    pub name: String,
    /// 1 表示在线
    pub status: i64,
    pub role: HaRole,
}

/// FortiManager 管理的设备（`/dvmdb/device`）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FortinetDevice {
    pub ip: String,
    pub name: String,
    pub hostname: String,
    pub sn: String,
    #[serde(default)]
    pub uuid: String,
    /// up / down
    pub conn_status: String,
    /// standalone / AP / ...
    pub ha_mode: String,
    #[serde(default)]
    pub ha_slave: Option<Vec<HaSlave>>,
    /// 非空表示维护中
    #[serde(default)]
    pub maintenance: String,
    #[serde(default)]
    pub adom: String,
    pub platform_str: String,
    pub version: i64,
    pub vm_cpu: i64,
    pub vm_cpu_limit: i64,
    pub vm_mem: i64,
    pub vm_mem_limit: i64,
}

fn default_true() -> bool {
    true
}

fn default_sla_code() -> String {
    "L08".to_string()
}
