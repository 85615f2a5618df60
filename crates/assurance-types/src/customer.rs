use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 客户信息（来自托管账户索引）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub sla_code: String,
    /// 组织 ID
    pub kums: i64,
    /// 位置 ID
    pub lkms_id: i64,
    /// 客户编号
    pub opennet_account: i64,
    /// 组织名称
    pub mgmt_center_name: String,
    /// 是否主动告警
    #[serde(default)]
    pub nms_proactive: bool,
    /// 其余字段原样保留
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
