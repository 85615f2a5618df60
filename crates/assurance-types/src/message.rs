use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::alert::{Addons, Alert, AlertEvent, AlertKey, AlertSeverity, KeepAliveAlert};

pub const DEFAULT_ORGANISATION_NAME: &str = "A1 Telekom Austria AG";

const DEFAULT_KEEPALIVE_TIMEOUT: u32 = 20;

/// 位置（数字 ID 或名称）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Id(i64),
    Name(String),
}

impl Default for Location {
    fn default() -> Self {
        Location::Id(0)
    }
}

/// 告警文档
///
/// 总线消息与归档文档使用同一结构，归档时额外附带 addons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EinsteinMessage {
    pub event: AlertEvent,
    pub alert_type: String,
    pub summary: String,
    pub short_summary: String,
    #[serde(default)]
    pub sla_code: String,
    pub severity: u8,
    pub node_name: String,
    #[serde(default)]
    pub node_ip: String,
    #[serde(default)]
    pub organisation_id: i64,
    #[serde(default = "default_organisation_name")]
    pub organisation_name: String,
    pub alert_source: String,
    pub agent: String,
    /// 事件开始时间
    #[serde(alias = "first_occurence")]
    pub first_occurrence: DateTime<Utc>,
    /// 本次观测时间
    #[serde(alias = "last_occurence")]
    pub last_occurrence: DateTime<Utc>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub customer_number: i64,
    #[serde(default = "default_keepalive_timeout")]
    pub keepalive_timeout: u32,
}

fn default_organisation_name() -> String {
    DEFAULT_ORGANISATION_NAME.to_string()
}

fn default_keepalive_timeout() -> u32 {
    DEFAULT_KEEPALIVE_TIMEOUT
}

impl EinsteinMessage {
    /// 由候选告警构建，first_occurrence 与 last_occurrence 都取 `now`
    ///
    /// 客户信息存在时覆盖组织、位置和 SLA 字段
    pub fn from_alert(alert: &Alert, now: DateTime<Utc>) -> Self {
        let mut message = Self {
            event: alert.event,
            alert_type: alert.alert_type.clone(),
            summary: alert.summary.clone(),
            short_summary: alert.short_summary.clone(),
            sla_code: alert.sla_code.clone(),
            severity: alert.severity.as_u8(),
            node_name: alert.node_name.clone(),
            node_ip: alert.node_ip.clone(),
            organisation_id: 0,
            organisation_name: default_organisation_name(),
            alert_source: alert.alert_source.clone(),
            agent: alert.agent.clone(),
            first_occurrence: now,
            last_occurrence: now,
            location: Location::default(),
            customer_number: 0,
            keepalive_timeout: DEFAULT_KEEPALIVE_TIMEOUT,
        };

        if let Some(customer) = &alert.customer {
            message.sla_code = customer.sla_code.clone();
            message.location = Location::Id(customer.lkms_id);
            message.customer_number = customer.opennet_account;
            message.organisation_id = customer.kums;
            message.organisation_name = customer.mgmt_center_name.clone();
        }

        message
    }

    /// 构建心跳消息
    pub fn keep_alive(alert: &KeepAliveAlert, keepalive_timeout: u32, now: DateTime<Utc>) -> Self {
        Self {
            event: AlertEvent::KeepAlive,
            alert_type: alert.alert_type.clone(),
            summary: alert.summary.clone(),
            short_summary: "Keepalive Message".to_string(),
            sla_code: alert.sla_code.clone(),
            severity: AlertSeverity::Notice.as_u8(),
            node_name: alert.node_name.clone(),
            node_ip: String::new(),
            organisation_id: 0,
            organisation_name: default_organisation_name(),
            alert_source: alert.alert_source.clone(),
            agent: alert.agent.clone(),
            first_occurrence: now,
            last_occurrence: now,
            location: Location::default(),
            customer_number: 0,
            keepalive_timeout,
        }
    }

    pub fn key(&self) -> AlertKey {
        AlertKey::new(self.node_name.clone(), self.alert_type.clone())
    }

    /// 严重级别名称，数值非法时原样输出
    pub fn severity_name(&self) -> String {
        AlertSeverity::try_from(self.severity)
            .map(|s| s.name().to_string())
            .unwrap_or_else(|_| self.severity.to_string())
    }

    /// 总线消息体
    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// 归档文档（附带 addons）
    pub fn to_archive_document(&self, addons: &Addons) -> Result<Value, serde_json::Error> {
        let mut document = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut document {
            map.insert("addons".to_string(), serde_json::to_value(addons)?);
        }
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertKey, AlertTemplate};
    use crate::customer::Customer;
    use serde_json::json;

    fn customer() -> Customer {
        serde_json::from_value(json!({
            "sla_code": "L01",
            "kums": 4711,
            "lkms_id": 815,
            "opennet_account": 1234,
            "mgmt_center_name": "ACME GmbH",
            "nms_proactive": true
        }))
        .unwrap()
    }

    #[test]
    fn test_from_alert_without_customer() {
        let now = Utc::now();
        let alert = AlertTemplate::new(AlertKey::new("fw01", "device_status"), "Agent", "Source")
            .alert(AlertEvent::Up, AlertSeverity::Notice, "device is online");

        let message = EinsteinMessage::from_alert(&alert, now);
        assert_eq!(message.first_occurrence, now);
        assert_eq!(message.last_occurrence, now);
        assert_eq!(message.organisation_name, DEFAULT_ORGANISATION_NAME);
        assert_eq!(message.severity, 5);
        assert_eq!(message.location, Location::Id(0));
    }

    #[test]
    fn test_from_alert_with_customer() {
        let alert = AlertTemplate::new(AlertKey::new("fw01", "device_status"), "Agent", "Source")
            .with_customer(Some(customer()))
            .alert(AlertEvent::Down, AlertSeverity::Emergency, "Device unreachable");

        let message = EinsteinMessage::from_alert(&alert, Utc::now());
        assert_eq!(message.organisation_id, 4711);
        assert_eq!(message.organisation_name, "ACME GmbH");
        assert_eq!(message.customer_number, 1234);
        assert_eq!(message.location, Location::Id(815));
        assert_eq!(message.sla_code, "L01");
    }

    #[test]
    fn test_reads_legacy_occurrence_fields() {
        let message: EinsteinMessage = serde_json::from_value(json!({
            "event": "UP",
            "alert_type": "device_status",
            "summary": "",
            "short_summary": "ok",
            "severity": 5,
            "node_name": "fw01",
            "alert_source": "src",
            "agent": "agent",
            "first_occurence": "2024-03-01T10:00:00.000000+00:00",
            "last_occurence": "2024-03-01T10:05:00.000000+00:00",
            "location": "Vienna",
            "@timestamp": "2024-03-01T10:05:00+00:00"
        }))
        .unwrap();

        assert_eq!(message.first_occurrence.to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert_eq!(message.location, Location::Name("Vienna".to_string()));
        assert_eq!(message.keepalive_timeout, 20);
    }

    #[test]
    fn test_archive_document_carries_addons() {
        let alert = AlertTemplate::new(AlertKey::new("lb01", "resource_usage"), "Agent", "Source")
            .with_addon("cpu_usage", 95u32)
            .alert(AlertEvent::Down, AlertSeverity::Warning, "High CPU usage: 95%");
        let message = EinsteinMessage::from_alert(&alert, Utc::now());

        let bus = message.to_document().unwrap();
        let archive = message.to_archive_document(&alert.addons).unwrap();
        assert!(bus.get("addons").is_none());
        assert_eq!(archive["addons"]["cpu_usage"], 95);
        assert_eq!(archive["first_occurrence"], bus["first_occurrence"]);
    }
}
