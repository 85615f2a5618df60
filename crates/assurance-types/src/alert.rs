use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::customer::Customer;

/// 告警事件
///
/// 表达语义状态，与严重级别相互独立
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertEvent {
    Up,
    Down,
    KeepAlive,
    /// 需要人工检查（只归档，不发布）
    Check,
    /// 维护中（只归档，不发布）
    Maint,
}

impl AlertEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertEvent::Up => "UP",
            AlertEvent::Down => "DOWN",
            AlertEvent::KeepAlive => "KEEP_ALIVE",
            AlertEvent::Check => "CHECK",
            AlertEvent::Maint => "MAINT",
        }
    }

    /// CHECK 和 MAINT 永远不会发送到消息总线
    pub fn is_publishable(&self) -> bool {
        !matches!(self, AlertEvent::Check | AlertEvent::Maint)
    }
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 严重级别
///
/// 数值越小越紧急：EMERGENCY = 0 ... NOTICE = 5，序列化为整数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlertSeverity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
}

impl AlertSeverity {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            AlertSeverity::Emergency => "EMERGENCY",
            AlertSeverity::Alert => "ALERT",
            AlertSeverity::Critical => "CRITICAL",
            AlertSeverity::Error => "ERROR",
            AlertSeverity::Warning => "WARNING",
            AlertSeverity::Notice => "NOTICE",
        }
    }
}

impl TryFrom<u8> for AlertSeverity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        match value {
            0 => Ok(AlertSeverity::Emergency),
            1 => Ok(AlertSeverity::Alert),
            2 => Ok(AlertSeverity::Critical),
            3 => Ok(AlertSeverity::Error),
            4 => Ok(AlertSeverity::Warning),
            5 => Ok(AlertSeverity::Notice),
            other => Err(format!("invalid severity level: {}", other)),
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for AlertSeverity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for AlertSeverity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        AlertSeverity::try_from(value).map_err(de::Error::custom)
    }
}

/// 附加字段的值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddonValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl From<&str> for AddonValue {
    fn from(value: &str) -> Self {
        AddonValue::Text(value.to_string())
    }
}

impl From<String> for AddonValue {
    fn from(value: String) -> Self {
        AddonValue::Text(value)
    }
}

impl From<i64> for AddonValue {
    fn from(value: i64) -> Self {
        AddonValue::Integer(value)
    }
}

impl From<u32> for AddonValue {
    fn from(value: u32) -> Self {
        AddonValue::Integer(i64::from(value))
    }
}

impl From<bool> for AddonValue {
    fn from(value: bool) -> Self {
        AddonValue::Bool(value)
    }
}

/// 告警附加字段
///
/// 每种 alert_type 的键集合由对应的规则模块定义，只随归档文档写入，不进入总线消息
pub type Addons = BTreeMap<String, AddonValue>;

/// 事件流标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertKey {
    pub node_name: String,
    pub alert_type: String,
}

impl AlertKey {
    pub fn new(node_name: impl Into<String>, alert_type: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            alert_type: alert_type.into(),
        }
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.node_name, self.alert_type)
    }
}

/// 候选告警（规则函数的输出）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub node_name: String,
    pub alert_type: String,
    pub agent: String,
    pub alert_source: String,
    #[serde(default)]
    pub sla_code: String,
    pub event: AlertEvent,
    pub severity: AlertSeverity,
    pub short_summary: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default = "default_node_ip")]
    pub node_ip: String,
    #[serde(default)]
    pub customer: Option<Customer>,
    /// 是否允许发送到消息总线
    #[serde(default = "default_einstein")]
    pub einstein: bool,
    #[serde(default)]
    pub addons: Addons,
}

impl Alert {
    pub fn key(&self) -> AlertKey {
        AlertKey::new(self.node_name.clone(), self.alert_type.clone())
    }
}

fn default_node_ip() -> String {
    "0.0.0.0".to_string()
}

fn default_einstein() -> bool {
    true
}

/// 候选告警的公共参数
///
/// 规则函数先为每个 alert_type 构建模板，再按判断结果生成具体告警
#[derive(Debug, Clone)]
pub struct AlertTemplate {
    pub node_name: String,
    pub alert_type: String,
    pub agent: String,
    pub alert_source: String,
    pub sla_code: String,
    pub node_ip: String,
    pub summary: String,
    pub customer: Option<Customer>,
    pub einstein: bool,
    pub addons: Addons,
}

impl AlertTemplate {
    pub fn new(key: AlertKey, agent: impl Into<String>, alert_source: impl Into<String>) -> Self {
        Self {
            node_name: key.node_name,
            alert_type: key.alert_type,
            agent: agent.into(),
            alert_source: alert_source.into(),
            sla_code: String::new(),
            node_ip: default_node_ip(),
            summary: String::new(),
            customer: None,
            einstein: true,
            addons: Addons::new(),
        }
    }

    pub fn with_node_ip(mut self, node_ip: impl Into<String>) -> Self {
        self.node_ip = node_ip.into();
        self
    }

    pub fn with_customer(mut self, customer: Option<Customer>) -> Self {
        self.customer = customer;
        self
    }

    pub fn with_einstein(mut self, einstein: bool) -> Self {
        self.einstein = einstein;
        self
    }

    pub fn with_sla_code(mut self, sla_code: impl Into<String>) -> Self {
        self.sla_code = sla_code.into();
        self
    }

    pub fn with_addon(mut self, key: impl Into<String>, value: impl Into<AddonValue>) -> Self {
        self.addons.insert(key.into(), value.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// 生成候选告警
    pub fn alert(
        &self,
        event: AlertEvent,
        severity: AlertSeverity,
        short_summary: impl Into<String>,
    ) -> Alert {
        Alert {
            node_name: self.node_name.clone(),
            alert_type: self.alert_type.clone(),
            agent: self.agent.clone(),
            alert_source: self.alert_source.clone(),
            sla_code: self.sla_code.clone(),
            event,
            severity,
            short_summary: short_summary.into(),
            summary: self.summary.clone(),
            node_ip: self.node_ip.clone(),
            customer: self.customer.clone(),
            einstein: self.einstein,
            addons: self.addons.clone(),
        }
    }
}

/// 心跳告警
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeepAliveAlert {
    pub node_name: String,
    pub alert_type: String,
    pub agent: String,
    pub alert_source: String,
    #[serde(default)]
    pub sla_code: String,
    pub summary: String,
}
