use assurance_collector::{resolve_node_name, NodeIdentity, Service};
use assurance_core::{AssuranceError, Result};
use assurance_types::{Alert, AlertEvent, AlertKey, AlertSeverity, AlertTemplate};

use crate::types::{FortiManager, FortiManagerStatus, FortinetDevice};

pub const AGENT: &str = "FortiManagerCollector";
pub const DEVICE_STATUS: &str = "fortimanager_device_status";
pub const CLUSTER_STATUS: &str = "fortimanager_cluster_status";

pub type FortiService<'a> = Service<'a, FortiManagerStatus, FortinetDevice>;

/// HA 集群使用第一个 master 成员的名称
pub fn node_name(device: &FortinetDevice) -> String {
    let primary_peer = device
        .ha_slave
        .as_deref()
        .and_then(|slaves| slaves.iter().find(|slave| slave.role.is_master()))
        .map(|slave| slave.name.as_str());

    resolve_node_name(&NodeIdentity {
        name: &device.name,
        hostname: None,
        clustered: device.ha_mode != "standalone",
        active_member: false,
        primary_peer,
    })
}

fn template(manager: &FortiManager, service: &FortiService<'_>, key: AlertKey) -> AlertTemplate {
    let einstein = manager.einstein
        && service
            .customer
            .as_ref()
            .map(|customer| customer.nms_proactive)
            .unwrap_or(false);

    AlertTemplate::new(key, AGENT, format!("Fortinet {}", service.status.hostname))
        .with_node_ip(service.device.ip.as_str())
        .with_sla_code(manager.sla_code.as_str())
        .with_customer(service.customer.clone())
        .with_einstein(einstein)
        .with_addon("adom", service.device.adom.as_str())
}

fn customer_not_found(device: &FortinetDevice) -> String {
    format!("customer not found (uuid='{}')", device.uuid)
}

pub fn device_status(manager: &FortiManager, service: &FortiService<'_>) -> Alert {
    let device = service.device;
    let template = template(
        manager,
        service,
        AlertKey::new(node_name(device), DEVICE_STATUS),
    );

    if !device.maintenance.is_empty() {
        return template.alert(AlertEvent::Maint, AlertSeverity::Notice, "in maintenance");
    }
    if service.customer.is_none() {
        return template.alert(AlertEvent::Check, AlertSeverity::Notice, customer_not_found(device));
    }
    if device.conn_status == "up" {
        template.alert(AlertEvent::Up, AlertSeverity::Notice, "device is online")
    } else {
        template.alert(AlertEvent::Down, AlertSeverity::Emergency, "Device unreachable")
    }
}

/// 集群告警以集群名称（设备名）为节点名
///
/// 支持 `standalone` 和 `AP`，其他 HA 模式返回 [`AssuranceError::UnsupportedState`]
pub fn cluster_status(manager: &FortiManager, service: &FortiService<'_>) -> Result<Option<Alert>> {
    let device = service.device;
    match device.ha_mode.as_str() {
        "standalone" => Ok(None),
        "AP" => {
            let template = template(
                manager,
                service,
                AlertKey::new(device.name.as_str(), CLUSTER_STATUS),
            );
            if !device.maintenance.is_empty() {
                return Ok(Some(template.alert(
                    AlertEvent::Maint,
                    AlertSeverity::Notice,
                    "in maintenance",
                )));
            }
            let Some(slaves) = &device.ha_slave else {
                return Ok(Some(template.alert(
                    AlertEvent::Check,
                    AlertSeverity::Notice,
                    "ha_mode == 'AP' but no slaves",
                )));
            };

            let names: Vec<&str> = slaves.iter().map(|slave| slave.name.as_str()).collect();
            let template = template.with_summary(format!("slaves: {}", names.join(", ")));

            if let Some(down) = slaves.iter().find(|slave| slave.status != 1) {
                return Ok(Some(template.alert(
                    AlertEvent::Down,
                    AlertSeverity::Notice,
                    format!("cluster redundancy lost, slave '{}' is down", down.name),
                )));
            }
            if service.customer.is_none() {
                return Ok(Some(template.alert(
                    AlertEvent::Check,
                    AlertSeverity::Notice,
                    customer_not_found(device),
                )));
            }
            Ok(Some(template.alert(AlertEvent::Up, AlertSeverity::Notice, "cluster is up")))
        }
        other => Err(AssuranceError::UnsupportedState(format!(
            "ha_mode '{}' not implemented",
            other
        ))),
    }
}

/// 固定顺序：设备状态、集群状态
pub fn evaluate(manager: &FortiManager, service: &FortiService<'_>) -> Result<Vec<Option<Alert>>> {
    Ok(vec![
        Some(device_status(manager, service)),
        cluster_status(manager, service)?,
    ])
}
