use assurance_core::{AssuranceError, HttpNode, Result};
use assurance_logging::ApiDump;
use assurance_types::{validate, ValidationError};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::types::{F5BigIPDevice, F5BigIPStatus};

pub const LOGIN: &str = "/mgmt/shared/authn/login";
pub const GET_DEVICES: &str = "/mgmt/tm/cm/device";
pub const GET_SYSTEM_INFO: &str = "/mgmt/tm/sys/system-info";
pub const GET_LICENSE: &str = "/mgmt/tm/sys/license";
pub const GET_CPU_STATS: &str = "/mgmt/tm/sys/host-info/stats";
pub const GET_MEMORY_STATS: &str = "/mgmt/tm/sys/memory/stats";

const AUTH_HEADER: &str = "X-F5-Auth-Token";

/// iControl REST 会话
pub struct F5BigIPSession {
    client: reqwest::Client,
    base_url: String,
    node: HttpNode,
    auth_token: Option<String>,
    dump: ApiDump,
}

impl F5BigIPSession {
    pub fn new(node: &HttpNode, dump: ApiDump) -> Result<Self> {
        node.validate()?;
        Ok(Self {
            client: node.client()?,
            base_url: node.url.trim_end_matches('/').to_string(),
            node: node.clone(),
            auth_token: None,
            dump,
        })
    }

    /// 建立会话：配置了 token 直接使用，否则登录获取
    pub async fn open(node: &HttpNode, dump: ApiDump) -> Result<Self> {
        let mut session = Self::new(node, dump)?;
        session.auth_token = match &session.node.api_token {
            Some(token) => Some(token.value.clone()),
            None => Some(session.login().await?),
        };
        Ok(session)
    }

    async fn login(&self) -> Result<String> {
        let url = format!("{}{}", self.base_url, LOGIN);
        let payload = json!({
            "username": self.node.api_user,
            "password": self.node.api_passwd,
            "loginProviderName": "tmos"
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(AssuranceError::api(format!(
                "{}: login failed with status {}",
                self.base_url,
                response.status()
            )));
        }

        let data: Value = response.json().await?;
        self.dump.dump("login", &data);
        data.pointer("/token/token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AssuranceError::api(format!("{}: failed to obtain authentication token", self.base_url)))
    }

    async fn get(&self, endpoint: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.auth_token {
            request = request.header(AUTH_HEADER, token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AssuranceError::api(format!(
                "API request failed: {} - Status: {}",
                endpoint,
                response.status()
            )));
        }

        let data: Value = response.json().await?;
        self.dump.dump(&format!("GET {}", endpoint), &data);
        Ok(data)
    }

    /// 统计数据只用于补充，失败时退化为空
    async fn get_optional(&self, endpoint: &str) -> Value {
        match self.get(endpoint).await {
            Ok(data) => data,
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Could not fetch additional stats");
                Value::Null
            }
        }
    }

    pub async fn get_status(&self) -> Result<F5BigIPStatus> {
        let system_info = self.get(GET_SYSTEM_INFO).await?;
        let license = self.get(GET_LICENSE).await?;
        parse_status(&system_info, &license)
    }

    pub async fn get_devices(&self) -> Result<Vec<F5BigIPDevice>> {
        let devices = self.get(GET_DEVICES).await?;
        let cpu = self.get_optional(GET_CPU_STATS).await;
        let memory = self.get_optional(GET_MEMORY_STATS).await;

        let usage = ResourceUsage {
            cpu: parse_cpu_usage(&cpu),
            memory: parse_memory_usage(&memory),
        };
        debug!(cpu = usage.cpu, memory = usage.memory, "Resource usage");

        parse_devices(&devices, usage, &self.node.owner)
    }
}

/// 设备描述中的 A1 元数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionMeta {
    pub uuid: Option<String>,
    pub maintenance: Option<String>,
}

/// 解析 `A1-UUID:<uuid>` / `A1-MAINTENANCE:<text>`（也接受下划线写法）
pub fn parse_description_meta(description: &str, owner: &str) -> DescriptionMeta {
    let mut meta = DescriptionMeta::default();
    if owner != "A1" {
        return meta;
    }

    for part in description.split_whitespace() {
        if let Some(uuid) = part
            .strip_prefix("A1-UUID:")
            .or_else(|| part.strip_prefix("A1_UUID:"))
        {
            meta.uuid = Some(uuid.trim().to_lowercase());
        }
        if let Some(maintenance) = part
            .strip_prefix("A1-MAINTENANCE:")
            .or_else(|| part.strip_prefix("A1_MAINTENANCE:"))
        {
            meta.maintenance = Some(maintenance.trim().to_string());
        }
    }
    meta
}

#[derive(Debug, Deserialize)]
struct DeviceCollection {
    #[serde(default)]
    items: Vec<RawDevice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDevice {
    #[serde(default)]
    name: String,
    hostname: Option<String>,
    #[serde(default)]
    chassis_id: String,
    #[serde(default)]
    management_ip: String,
    device_state: Option<String>,
    failover_state: Option<String>,
    ha_capacity: Option<i64>,
    #[serde(default)]
    platform_id: String,
    #[serde(default)]
    version: String,
    partition: Option<String>,
    #[serde(default)]
    description: String,
}

/// 整机资源使用率（百分比）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceUsage {
    pub cpu: u32,
    pub memory: u32,
}

pub fn parse_devices(response: &Value, usage: ResourceUsage, owner: &str) -> Result<Vec<F5BigIPDevice>> {
    let collection: DeviceCollection = validate("f5_devices", response)?;

    let devices = collection
        .items
        .into_iter()
        .map(|raw| {
            let meta = parse_description_meta(&raw.description, owner);
            let failover_state = raw.failover_state.unwrap_or_else(|| "unknown".to_string());
            let ha_status = failover_state.to_uppercase();
            let ha_role = match raw.ha_capacity {
                Some(capacity) if capacity > 0 && failover_state == "active" => "primary",
                Some(capacity) if capacity > 0 => "secondary",
                _ => "standalone",
            };

            F5BigIPDevice {
                hostname: raw.hostname.unwrap_or_else(|| raw.name.clone()),
                name: raw.name,
                sn: raw.chassis_id,
                management_ip: raw.management_ip,
                device_state: raw.device_state.unwrap_or_else(|| "unknown".to_string()),
                failover_state,
                ha_role: ha_role.to_string(),
                ha_status,
                platform: raw.platform_id,
                version: raw.version,
                partition: raw.partition.unwrap_or_else(|| "Common".to_string()),
                cpu_usage: usage.cpu,
                memory_usage: usage.memory,
                uuid: meta.uuid.unwrap_or_default(),
                maintenance: meta.maintenance.unwrap_or_default(),
            }
        })
        .collect();

    Ok(devices)
}

/// `entries` 下第一项的 `nestedStats.entries`
fn first_nested_entries(data: &Value) -> Option<&Map<String, Value>> {
    data.get("entries")?
        .as_object()?
        .values()
        .next()?
        .pointer("/nestedStats/entries")?
        .as_object()
}

fn stat_value(entries: &Map<String, Value>, key: &str) -> Option<f64> {
    entries.get(key)?.get("value")?.as_f64()
}

fn stat_description(entries: &Map<String, Value>, key: &str) -> Option<String> {
    entries
        .get(key)?
        .get("description")?
        .as_str()
        .map(str::to_string)
}

pub fn parse_cpu_usage(data: &Value) -> u32 {
    first_nested_entries(data)
        .and_then(|entries| stat_value(entries, "cpuInfoStat"))
        .map(|value| value.max(0.0) as u32)
        .unwrap_or(0)
}

pub fn parse_memory_usage(data: &Value) -> u32 {
    let Some(entries) = first_nested_entries(data) else {
        return 0;
    };
    let used = stat_value(entries, "memoryUsed").unwrap_or(0.0);
    let total = stat_value(entries, "memoryTotal").unwrap_or(1.0);
    if total > 0.0 {
        ((used / total) * 100.0).max(0.0) as u32
    } else {
        0
    }
}

pub fn parse_status(system_info: &Value, license: &Value) -> Result<F5BigIPStatus> {
    let entries = first_nested_entries(system_info).ok_or_else(|| {
        AssuranceError::Validation(ValidationError::new(
            "f5_system_info",
            "Invalid system info response",
            "data",
            system_info.clone(),
        ))
    })?;

    let license_status = if license.get("entries").is_some() {
        first_nested_entries(license)
            .and_then(|entries| stat_description(entries, "registrationKey"))
            .unwrap_or_else(|| "active".to_string())
    } else {
        "unknown".to_string()
    };

    Ok(F5BigIPStatus {
        sn: stat_description(entries, "bigipChassisSerialNum").unwrap_or_default(),
        hostname: stat_description(entries, "hostName").unwrap_or_default(),
        version: stat_description(entries, "version").unwrap_or_default(),
        platform: stat_description(entries, "platform").unwrap_or_default(),
        license_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested(entries: Value) -> Value {
        json!({
            "entries": {
                "https://localhost/mgmt/tm/sys/x/0": {
                    "nestedStats": {"entries": entries}
                }
            }
        })
    }

    #[test]
    fn test_parse_description_meta() {
        let meta = parse_description_meta("prod box A1-UUID:ABC-123 A1_MAINTENANCE:scheduled", "A1");
        assert_eq!(meta.uuid.as_deref(), Some("abc-123"));
        assert_eq!(meta.maintenance.as_deref(), Some("scheduled"));

        let meta = parse_description_meta("A1-UUID:ABC", "other");
        assert_eq!(meta, DescriptionMeta::default());
    }

    #[test]
    fn test_parse_devices() {
        let response = json!({
            "items": [
                {
                    "name": "bigip01.example.net",
                    "hostname": "bigip01",
                    "chassisId": "CH-1",
                    "managementIp": "10.0.0.1",
                    "deviceState": "active",
                    "failoverState": "active",
                    "haCapacity": 1,
                    "platformId": "Z100",
                    "version": "16.1.3",
                    "description": "A1-UUID:UUID-1"
                },
                {"name": "bigip02"}
            ]
        });

        let devices = parse_devices(&response, ResourceUsage { cpu: 12, memory: 40 }, "A1").unwrap();
        assert_eq!(devices.len(), 2);

        assert_eq!(devices[0].ha_role, "primary");
        assert_eq!(devices[0].ha_status, "ACTIVE");
        assert_eq!(devices[0].uuid, "uuid-1");
        assert_eq!(devices[0].partition, "Common");
        assert_eq!(devices[0].cpu_usage, 12);

        assert_eq!(devices[1].hostname, "bigip02");
        assert_eq!(devices[1].ha_role, "standalone");
        assert_eq!(devices[1].device_state, "unknown");
        assert_eq!(devices[1].failover_state, "unknown");
    }

    #[test]
    fn test_parse_devices_secondary_and_empty() {
        let response = json!({"items": [{"name": "b", "failoverState": "standby", "haCapacity": 2}]});
        let devices = parse_devices(&response, ResourceUsage::default(), "A1").unwrap();
        assert_eq!(devices[0].ha_role, "secondary");

        assert!(parse_devices(&json!({}), ResourceUsage::default(), "A1").unwrap().is_empty());
    }

    #[test]
    fn test_parse_devices_malformed() {
        let response = json!({"items": [{"name": 42}]});
        let result = parse_devices(&response, ResourceUsage::default(), "A1");
        assert!(matches!(result, Err(AssuranceError::Validation(_))));
    }

    #[test]
    fn test_parse_usage() {
        let cpu = nested(json!({"cpuInfoStat": {"value": 95}}));
        assert_eq!(parse_cpu_usage(&cpu), 95);

        let memory = nested(json!({"memoryUsed": {"value": 400}, "memoryTotal": {"value": 1000}}));
        assert_eq!(parse_memory_usage(&memory), 40);

        assert_eq!(parse_cpu_usage(&Value::Null), 0);
        assert_eq!(parse_memory_usage(&json!({"entries": {}})), 0);
    }

    #[test]
    fn test_parse_status() {
        let system_info = nested(json!({
            "bigipChassisSerialNum": {"description": "SN-1"},
            "hostName": {"description": "bigip01"},
            "platform": {"description": "Z100"}
        }));
        let license = nested(json!({"registrationKey": {"description": "ABCDE-FGHIJ"}}));

        let status = parse_status(&system_info, &license).unwrap();
        assert_eq!(status.sn, "SN-1");
        assert_eq!(status.hostname, "bigip01");
        assert_eq!(status.license_status, "ABCDE-FGHIJ");

        let status = parse_status(&system_info, &json!({})).unwrap();
        assert_eq!(status.license_status, "unknown");

        assert!(parse_status(&json!({}), &license).is_err());
    }
}
