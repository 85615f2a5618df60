use serde_json::Value;
use tracing::debug;

/// 设备接口流量转储（`ASSURANCE_API_DEBUG`）
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiDump {
    enabled: bool,
}

impl ApiDump {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn dump(&self, label: &str, payload: &Value) {
        if !self.enabled {
            return;
        }
        let pretty = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
        debug!(target: "assurance::api", label = %label, "\n{}", pretty);
    }
}
