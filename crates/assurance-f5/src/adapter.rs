use assurance_collector::{CustomerQuery, DeviceAdapter, Service, Snapshot};
use assurance_core::Result;
use assurance_logging::ApiDump;
use assurance_types::{Alert, KeepAliveAlert};
use async_trait::async_trait;
use tracing::debug;

use crate::rules::{self, AGENT};
use crate::session::F5BigIPSession;
use crate::types::{F5BigIP, F5BigIPDevice, F5BigIPStatus};

pub const KEEPALIVE_TYPE: &str = "f5_bigip_keepalive";

/// 单台 BIG-IP 的采集适配器
pub struct F5Adapter {
    bigip: F5BigIP,
    dump: ApiDump,
}

impl F5Adapter {
    pub fn new(bigip: F5BigIP, dump: ApiDump) -> Self {
        Self { bigip, dump }
    }
}

#[async_trait]
impl DeviceAdapter for F5Adapter {
    type Status = F5BigIPStatus;
    type Device = F5BigIPDevice;

    fn name(&self) -> &str {
        &self.bigip.name
    }

    fn keepalive(&self) -> KeepAliveAlert {
        KeepAliveAlert {
            node_name: self.bigip.name.clone(),
            alert_type: KEEPALIVE_TYPE.to_string(),
            agent: AGENT.to_string(),
            alert_source: "Producer_COLLECTOR-F5".to_string(),
            sla_code: self.bigip.sla_code.clone(),
            summary: "Keepalive Message -> wenn ROT, Kontaktaufnahme mit Service Assurance Stack Rufbereitschaft (check producer collector-f5)".to_string(),
        }
    }

    async fn collect(&self) -> Result<Snapshot<F5BigIPStatus, F5BigIPDevice>> {
        let session = F5BigIPSession::open(&self.bigip.node, self.dump).await?;
        let status = session.get_status().await?;
        let devices = session.get_devices().await?;
        debug!(bigip = %self.bigip.name, hostname = %status.hostname, "BIG-IP status fetched");
        Ok(Snapshot::new(status, devices))
    }

    fn customer_query(&self, device: &F5BigIPDevice) -> CustomerQuery {
        CustomerQuery {
            uuid: Some(device.uuid.clone()).filter(|uuid| !uuid.is_empty()),
            hostname: Some(rules::node_name(device)),
        }
    }

    fn evaluate(&self, service: &Service<'_, F5BigIPStatus, F5BigIPDevice>) -> Result<Vec<Option<Alert>>> {
        Ok(rules::evaluate(&self.bigip, service))
    }

    fn summary(&self, alert: &Alert) -> Option<String> {
        Some(format!("F5 BIG-IP Device '{}' is '{}'", alert.node_name, alert.event))
    }
}
