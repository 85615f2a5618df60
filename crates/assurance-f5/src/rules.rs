use assurance_collector::{resolve_node_name, NodeIdentity, Service};
use assurance_types::{Alert, AlertEvent, AlertKey, AlertSeverity, AlertTemplate};

use crate::types::{F5BigIP, F5BigIPDevice, F5BigIPStatus};

pub const AGENT: &str = "F5BigIPCollector";
pub const DEVICE_STATUS: &str = "f5_bigip_device_status";
pub const HA_STATUS: &str = "f5_bigip_ha_status";
pub const RESOURCE_USAGE: &str = "f5_bigip_resource_usage";

/// CPU/内存使用率告警阈值（百分比）
const USAGE_THRESHOLD: u32 = 90;

pub type F5Service<'a> = Service<'a, F5BigIPStatus, F5BigIPDevice>;

/// HA 对中的主用设备使用自身名称，其余使用主机名
pub fn node_name(device: &F5BigIPDevice) -> String {
    resolve_node_name(&NodeIdentity {
        name: &device.name,
        hostname: Some(&device.hostname),
        clustered: device.ha_role != "standalone",
        active_member: device.failover_state == "active",
        primary_peer: None,
    })
}

fn template(bigip: &F5BigIP, service: &F5Service<'_>, alert_type: &str) -> AlertTemplate {
    let device = service.device;
    let einstein = bigip.einstein
        && service
            .customer
            .as_ref()
            .map(|customer| customer.nms_proactive)
            .unwrap_or(false);

    AlertTemplate::new(
        AlertKey::new(node_name(device), alert_type),
        AGENT,
        format!("F5 BIG-IP {}", service.status.hostname),
    )
    .with_node_ip(device.management_ip.as_str())
    .with_sla_code(bigip.sla_code.as_str())
    .with_customer(service.customer.clone())
    .with_einstein(einstein)
    .with_addon("partition", device.partition.as_str())
    .with_addon("platform", device.platform.as_str())
    .with_addon("ha_role", device.ha_role.as_str())
}

fn customer_not_found(device: &F5BigIPDevice) -> String {
    format!("customer not found (uuid='{}')", device.uuid)
}

pub fn device_status(bigip: &F5BigIP, service: &F5Service<'_>) -> Option<Alert> {
    let device = service.device;
    let template = template(bigip, service, DEVICE_STATUS);

    let alert = if !device.maintenance.is_empty() {
        template.alert(AlertEvent::Maint, AlertSeverity::Notice, "in maintenance")
    } else if service.customer.is_none() {
        template.alert(AlertEvent::Check, AlertSeverity::Notice, customer_not_found(device))
    } else {
        match device.device_state.as_str() {
            "offline" => template.alert(
                AlertEvent::Down,
                AlertSeverity::Emergency,
                "Device offline/unreachable",
            ),
            "active" | "standby" => template.alert(
                AlertEvent::Up,
                AlertSeverity::Notice,
                format!("device is {}", device.device_state),
            ),
            other => template.alert(
                AlertEvent::Check,
                AlertSeverity::Warning,
                format!("device state is '{}'", other),
            ),
        }
    };
    Some(alert)
}

/// 只检查 HA 成员；单机设备不产生告警
pub fn ha_status(bigip: &F5BigIP, service: &F5Service<'_>) -> Option<Alert> {
    let device = service.device;
    if device.ha_role == "standalone" {
        return None;
    }
    let template = template(bigip, service, HA_STATUS);

    if !device.maintenance.is_empty() {
        return Some(template.alert(AlertEvent::Maint, AlertSeverity::Notice, "in maintenance"));
    }

    let alert = match device.failover_state.as_str() {
        "offline" => template.alert(
            AlertEvent::Down,
            AlertSeverity::Critical,
            "HA member is offline - redundancy lost",
        ),
        "active" | "standby" => {
            let template = template.with_summary(format!(
                "HA Role: {}, State: {}",
                device.ha_role, device.failover_state
            ));
            if service.customer.is_none() {
                template.alert(AlertEvent::Check, AlertSeverity::Notice, customer_not_found(device))
            } else {
                template.alert(
                    AlertEvent::Up,
                    AlertSeverity::Notice,
                    format!("HA pair operational - {}", device.failover_state),
                )
            }
        }
        other => template.alert(
            AlertEvent::Check,
            AlertSeverity::Warning,
            format!("Unknown HA state: {}", other),
        ),
    };
    Some(alert)
}

/// 客户未知、维护中或没有统计数据时不产生告警
pub fn resource_usage(bigip: &F5BigIP, service: &F5Service<'_>) -> Option<Alert> {
    let device = service.device;
    if service.customer.is_none() || !device.maintenance.is_empty() {
        return None;
    }

    let template = template(bigip, service, RESOURCE_USAGE);
    let gauges = || {
        template
            .clone()
            .with_addon("cpu_usage", device.cpu_usage)
            .with_addon("memory_usage", device.memory_usage)
    };

    if device.cpu_usage > USAGE_THRESHOLD {
        return Some(gauges().alert(
            AlertEvent::Down,
            AlertSeverity::Warning,
            format!("High CPU usage: {}%", device.cpu_usage),
        ));
    }
    if device.memory_usage > USAGE_THRESHOLD {
        return Some(gauges().alert(
            AlertEvent::Down,
            AlertSeverity::Warning,
            format!("High memory usage: {}%", device.memory_usage),
        ));
    }
    if device.cpu_usage > 0 || device.memory_usage > 0 {
        return Some(template.alert(
            AlertEvent::Up,
            AlertSeverity::Notice,
            format!(
                "Resources OK (CPU: {}%, MEM: {}%)",
                device.cpu_usage, device.memory_usage
            ),
        ));
    }
    None
}

/// 固定顺序：设备状态、HA 状态、资源使用率
pub fn evaluate(bigip: &F5BigIP, service: &F5Service<'_>) -> Vec<Option<Alert>> {
    vec![
        device_status(bigip, service),
        ha_status(bigip, service),
        resource_usage(bigip, service),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use assurance_types::{AddonValue, Customer};
    use serde_json::json;

    fn bigip() -> F5BigIP {
        serde_json::from_value(json!({
            "name": "bigip01",
            "node": {"url": "https://bigip01", "api_user": "u", "api_passwd": "p"}
        }))
        .unwrap()
    }

    fn status() -> F5BigIPStatus {
        F5BigIPStatus {
            sn: "SN-1".to_string(),
            hostname: "bigip01.example.net".to_string(),
            version: "16.1.3".to_string(),
            platform: "Z100".to_string(),
            license_status: "active".to_string(),
        }
    }

    fn device() -> F5BigIPDevice {
        F5BigIPDevice {
            name: "bigip-a".to_string(),
            hostname: "bigip-a.example.net".to_string(),
            sn: "CH-1".to_string(),
            management_ip: "10.0.0.1".to_string(),
            device_state: "active".to_string(),
            failover_state: "active".to_string(),
            ha_role: "primary".to_string(),
            ha_status: "ACTIVE".to_string(),
            platform: "Z100".to_string(),
            version: "16.1.3".to_string(),
            partition: "Common".to_string(),
            cpu_usage: 10,
            memory_usage: 20,
            uuid: "uuid-1".to_string(),
            maintenance: String::new(),
        }
    }

    fn customer(proactive: bool) -> Customer {
        serde_json::from_value(json!({
            "sla_code": "L08",
            "kums": 4711,
            "lkms_id": 12,
            "opennet_account": 99,
            "mgmt_center_name": "ACME",
            "nms_proactive": proactive
        }))
        .unwrap()
    }

    #[test]
    fn test_offline_device_is_down_emergency() {
        let status = status();
        let mut device = device();
        device.device_state = "offline".to_string();
        let service = Service::new(&status, &device, Some(customer(true)));

        let alert = device_status(&bigip(), &service).unwrap();
        assert_eq!(alert.event, AlertEvent::Down);
        assert_eq!(alert.severity, AlertSeverity::Emergency);
        assert_eq!(alert.short_summary, "Device offline/unreachable");
        assert_eq!(alert.node_ip, "10.0.0.1");
        assert_eq!(alert.alert_source, "F5 BIG-IP bigip01.example.net");
        assert!(alert.einstein);
    }

    #[test]
    fn test_maintenance_wins_over_state() {
        let status = status();
        let mut device = device();
        device.maintenance = "scheduled".to_string();
        device.device_state = "offline".to_string();
        device.failover_state = "offline".to_string();
        let service = Service::new(&status, &device, None);

        let alerts = evaluate(&bigip(), &service);
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].as_ref().map(|a| a.event), Some(AlertEvent::Maint));
        assert_eq!(alerts[0].as_ref().map(|a| a.severity), Some(AlertSeverity::Notice));
        assert_eq!(alerts[1].as_ref().map(|a| a.event), Some(AlertEvent::Maint));
        assert!(alerts[2].is_none());
    }

    #[test]
    fn test_missing_customer_is_check() {
        let status = status();
        let device = device();
        let service = Service::new(&status, &device, None);

        let alert = device_status(&bigip(), &service).unwrap();
        assert_eq!(alert.event, AlertEvent::Check);
        assert_eq!(alert.severity, AlertSeverity::Notice);
        assert_eq!(alert.short_summary, "customer not found (uuid='uuid-1')");
        assert!(!alert.einstein);
        assert!(resource_usage(&bigip(), &service).is_none());
    }

    #[test]
    fn test_high_cpu_is_down_warning() {
        let status = status();
        let mut device = device();
        device.cpu_usage = 95;
        device.memory_usage = 40;
        let service = Service::new(&status, &device, Some(customer(true)));

        let alert = resource_usage(&bigip(), &service).unwrap();
        assert_eq!(alert.event, AlertEvent::Down);
        assert_eq!(alert.severity, AlertSeverity::Warning);
        assert_eq!(alert.short_summary, "High CPU usage: 95%");
        assert_eq!(alert.addons.get("cpu_usage"), Some(&AddonValue::Integer(95)));
        assert_eq!(alert.addons.get("memory_usage"), Some(&AddonValue::Integer(40)));
    }

    #[test]
    fn test_high_memory_and_ok_resources() {
        let status = status();
        let mut device = device();
        device.memory_usage = 91;
        let service = Service::new(&status, &device, Some(customer(true)));
        let alert = resource_usage(&bigip(), &service).unwrap();
        assert_eq!(alert.short_summary, "High memory usage: 91%");

        let device = self::device();
        let service = Service::new(&status, &device, Some(customer(true)));
        let alert = resource_usage(&bigip(), &service).unwrap();
        assert_eq!(alert.event, AlertEvent::Up);
        assert_eq!(alert.short_summary, "Resources OK (CPU: 10%, MEM: 20%)");
        assert!(!alert.addons.contains_key("cpu_usage"));

        let mut device = self::device();
        device.cpu_usage = 0;
        device.memory_usage = 0;
        let service = Service::new(&status, &device, Some(customer(true)));
        assert!(resource_usage(&bigip(), &service).is_none());
    }

    #[test]
    fn test_ha_status() {
        let status = status();
        let mut device = device();
        let service = Service::new(&status, &device, Some(customer(false)));
        let alert = ha_status(&bigip(), &service).unwrap();
        assert_eq!(alert.event, AlertEvent::Up);
        assert_eq!(alert.short_summary, "HA pair operational - active");
        assert_eq!(alert.summary, "HA Role: primary, State: active");
        assert!(!alert.einstein);

        device.failover_state = "offline".to_string();
        let service = Service::new(&status, &device, Some(customer(true)));
        let alert = ha_status(&bigip(), &service).unwrap();
        assert_eq!(alert.event, AlertEvent::Down);
        assert_eq!(alert.severity, AlertSeverity::Critical);

        device.failover_state = "forced-offline".to_string();
        let service = Service::new(&status, &device, Some(customer(true)));
        let alert = ha_status(&bigip(), &service).unwrap();
        assert_eq!(alert.event, AlertEvent::Check);
        assert_eq!(alert.short_summary, "Unknown HA state: forced-offline");

        device.ha_role = "standalone".to_string();
        let service = Service::new(&status, &device, Some(customer(true)));
        assert!(ha_status(&bigip(), &service).is_none());
    }

    #[test]
    fn test_unknown_device_state() {
        let status = status();
        let mut device = device();
        device.device_state = "unknown".to_string();
        let service = Service::new(&status, &device, Some(customer(true)));

        let alert = device_status(&bigip(), &service).unwrap();
        assert_eq!(alert.event, AlertEvent::Check);
        assert_eq!(alert.severity, AlertSeverity::Warning);
        assert_eq!(alert.short_summary, "device state is 'unknown'");
    }

    #[test]
    fn test_node_name() {
        let mut device = device();
        assert_eq!(node_name(&device), "bigip-a");

        device.failover_state = "standby".to_string();
        assert_eq!(node_name(&device), "bigip-a.example.net");

        device.hostname = String::new();
        assert_eq!(node_name(&device), "bigip-a");
    }
}
