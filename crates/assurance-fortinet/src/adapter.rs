use assurance_collector::{CustomerQuery, DeviceAdapter, Service, Snapshot};
use assurance_core::{AssuranceError, Result};
use assurance_logging::ApiDump;
use assurance_types::{Alert, KeepAliveAlert};
use async_trait::async_trait;
use tracing::warn;

use crate::rules::{self, AGENT};
use crate::session::FortiManagerSession;
use crate::types::{FortiManager, FortiManagerStatus, FortinetDevice};

pub const KEEPALIVE_TYPE: &str = "fortimanager_keepalive";

/// 单台 FortiManager 的采集适配器
pub struct FortinetAdapter {
    manager: FortiManager,
    with_adoms: bool,
    dump: ApiDump,
}

impl FortinetAdapter {
    pub fn new(manager: FortiManager, with_adoms: bool, dump: ApiDump) -> Self {
        Self {
            manager,
            with_adoms,
            dump,
        }
    }
}

#[async_trait]
impl DeviceAdapter for FortinetAdapter {
    type Status = FortiManagerStatus;
    type Device = FortinetDevice;

    fn name(&self) -> &str {
        &self.manager.name
    }

    fn keepalive(&self) -> KeepAliveAlert {
        KeepAliveAlert {
            node_name: self.manager.name.clone(),
            alert_type: KEEPALIVE_TYPE.to_string(),
            agent: AGENT.to_string(),
            alert_source: "Producer_COLLECTOR-FORTINET".to_string(),
            sla_code: self.manager.sla_code.clone(),
            summary: "Keepalive Message -> wenn ROT, Kontaktaufnahme mit Service Assurance Stack Rufbereitschaft (check producer collector-fortinet)".to_string(),
        }
    }

    /// 会话在返回前登出；查询失败时仍尝试登出并保留原错误
    async fn collect(&self) -> Result<Snapshot<FortiManagerStatus, FortinetDevice>> {
        let session = FortiManagerSession::open(&self.manager.node, self.dump).await?;

        let result = async {
            let status = session.get_status().await?;
            let devices = session.get_devices(self.with_adoms).await?;
            Ok::<_, AssuranceError>(Snapshot::new(status, devices))
        }
        .await;

        match (result, session.close().await) {
            (Ok(snapshot), closed) => closed.map(|_| snapshot),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(logout)) => {
                warn!(manager = %self.manager.name, error = %logout, "Logout failed");
                Err(e)
            }
        }
    }

    fn customer_query(&self, device: &FortinetDevice) -> CustomerQuery {
        CustomerQuery {
            uuid: Some(device.uuid.clone()).filter(|uuid| !uuid.is_empty()),
            hostname: Some(rules::node_name(device)),
        }
    }

    fn evaluate(&self, service: &Service<'_, FortiManagerStatus, FortinetDevice>) -> Result<Vec<Option<Alert>>> {
        rules::evaluate(&self.manager, service)
    }

    fn summary(&self, alert: &Alert) -> Option<String> {
        Some(format!(
            "Fortinet Firewall/Device '{}' is '{}'",
            alert.node_name, alert.event
        ))
    }
}
