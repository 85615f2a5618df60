use assurance_core::{AssuranceError, HttpNode, Result};
use assurance_logging::ApiDump;
use assurance_types::{validate, ValidationError};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::types::{FortiManagerStatus, FortinetDevice, HaSlave};

/// 设备元数据字段
const META_FIELDS: &[&str] = &[
    "A1-UUID",
    "A1_UUID",
    "A1-MAINTENANCE",
    "A1_MAINTENANCE",
    "A1_MAINTENANCE_CUSTOMER",
];

/// FortiManager JSON-RPC 会话
///
/// 未配置 token 时登录获取 session，结束时需调用 [`close`](Self::close) 登出
pub struct FortiManagerSession {
    client: reqwest::Client,
    node: HttpNode,
    session: String,
    id: AtomicU64,
    dump: ApiDump,
}

impl FortiManagerSession {
    pub fn new(node: &HttpNode, dump: ApiDump) -> Result<Self> {
        node.validate()?;
        Ok(Self {
            client: node.client()?,
            node: node.clone(),
            session: String::new(),
            id: AtomicU64::new(0),
            dump,
        })
    }

    pub async fn open(node: &HttpNode, dump: ApiDump) -> Result<Self> {
        let mut session = Self::new(node, dump)?;
        if session.node.api_token.is_none() {
            session.session = session.login().await?;
        }
        Ok(session)
    }

    /// 登出（token 模式无需登出）
    pub async fn close(self) -> Result<()> {
        if self.node.api_token.is_some() {
            return Ok(());
        }
        let payload = self.request("exec", json!([{"url": "/sys/logout"}]));
        self.call("logout", payload).await?;
        Ok(())
    }

    fn next_id(&self) -> u64 {
        self.id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn request(&self, method: &str, params: Value) -> Value {
        json!({
            "id": self.next_id(),
            "method": method,
            "params": params,
            "verbose": 1,
            "session": self.session
        })
    }

    async fn post(&self, label: &str, payload: &Value) -> Result<Value> {
        let mut request = self.client.post(&self.node.url).json(payload);
        if let Some(token) = &self.node.api_token {
            request = request.query(&[(token.name.as_str(), token.value.as_str())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AssuranceError::api(format!(
                "{}: {} failed with status {}",
                self.node.url,
                label,
                response.status()
            )));
        }

        let data: Value = response.json().await?;
        self.dump.dump(&format!("{} request", label), payload);
        self.dump.dump(label, &data);
        Ok(data)
    }

    async fn call(&self, label: &str, payload: Value) -> Result<Value> {
        let response = self.post(label, &payload).await?;
        check_result(&response)?;
        Ok(response)
    }

    async fn login(&self) -> Result<String> {
        let payload = json!({
            "id": self.next_id(),
            "method": "exec",
            "params": [{
                "url": "sys/login/user",
                "data": {
                    "user": self.node.api_user,
                    "passwd": self.node.api_passwd
                }
            }]
        });
        let response = self.call("login", payload).await?;
        response
            .get("session")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AssuranceError::api(format!("{}: login returned no session", self.node.url)))
    }

    pub async fn get_status(&self) -> Result<FortiManagerStatus> {
        let payload = self.request("get", json!([{"url": "/sys/status"}]));
        let response = self.call("get_status", payload).await?;
        parse_status(&response)
    }

    pub async fn get_devices(&self, with_adoms: bool) -> Result<Vec<FortinetDevice>> {
        let payload = self.request(
            "get",
            json!([{"url": "/dvmdb/device", "meta fields": META_FIELDS}]),
        );
        let response = self.call("get_devices", payload).await?;

        let adoms = if with_adoms {
            self.get_device_adoms().await?
        } else {
            HashMap::new()
        };
        parse_devices(&response, &adoms, &self.node.owner)
    }

    /// 设备名 → ADOM 名
    pub async fn get_device_adoms(&self) -> Result<HashMap<String, String>> {
        let payload = self.request(
            "get",
            json!([{
                "url": "/dvmdb/adom/",
                "fields": ["name"],
                "expand member": [{"url": "device", "fields": ["name"]}]
            }]),
        );
        let response = self.call("get_device_adoms", payload).await?;
        let adoms = parse_adoms(&response)?;
        debug!(devices = adoms.len(), "ADOM membership resolved");
        Ok(adoms)
    }
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResult {
    status: RpcStatus,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Vec<RpcResult>,
}

fn first_result(response: &Value) -> Result<RpcResult> {
    let parsed: RpcResponse = validate("rpc_response", response)?;
    parsed.result.into_iter().next().ok_or_else(|| {
        AssuranceError::Validation(ValidationError::new(
            "rpc_response",
            "empty result list",
            "data",
            response.clone(),
        ))
    })
}

/// `result[0].status.code` 非 0 视为接口错误
pub fn check_result(response: &Value) -> Result<()> {
    let result = first_result(response)?;
    if result.status.code != 0 {
        return Err(AssuranceError::api(format!(
            "invalid response from server: {}",
            result.status.message
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    #[serde(rename = "Serial Number")]
    serial_number: String,
    #[serde(rename = "Hostname")]
    hostname: String,
    #[serde(rename = "Major")]
    major: Value,
    #[serde(rename = "Minor")]
    minor: Value,
    #[serde(rename = "Patch")]
    patch: Value,
    #[serde(rename = "BIOS version")]
    bios: String,
    #[serde(rename = "License Status")]
    license_status: String,
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn parse_status(response: &Value) -> Result<FortiManagerStatus> {
    let data = first_result(response)?.data;
    let raw: RawStatus = validate("fortimanager_status", &data)?;
    Ok(FortiManagerStatus {
        sn: raw.serial_number,
        hostname: raw.hostname,
        version: format!("{}.{}.{}", scalar(&raw.major), scalar(&raw.minor), scalar(&raw.patch)),
        bios: raw.bios,
        license_status: raw.license_status,
    })
}

#[derive(Debug, Deserialize)]
struct RawDevice {
    ip: String,
    name: String,
    hostname: String,
    sn: String,
    conn_status: String,
    ha_mode: String,
    #[serde(default)]
    ha_slave: Option<Vec<HaSlave>>,
    platform_str: String,
    version: i64,
    vm_cpu: i64,
    vm_cpu_limit: i64,
    vm_mem: i64,
    vm_mem_limit: i64,
    #[serde(rename = "meta fields", default)]
    meta_fields: Map<String, Value>,
}

/// 设备元数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaFields {
    pub uuid: Option<String>,
    pub maintenance: Option<String>,
}

/// 后出现的字段覆盖先出现的：`A1_UUID` 优先于 `A1-UUID`，
/// `A1_MAINTENANCE_CUSTOMER` 优先于其余维护字段
pub fn parse_meta_fields(meta: &Map<String, Value>, owner: &str) -> MetaFields {
    let mut fields = MetaFields::default();
    if owner != "A1" {
        return fields;
    }
    let text = |key: &str| meta.get(key).and_then(Value::as_str).map(str::to_string);

    for key in ["A1-UUID", "A1_UUID"] {
        if let Some(uuid) = text(key) {
            fields.uuid = Some(uuid.trim().to_lowercase());
        }
    }
    for key in ["A1-MAINTENANCE", "A1_MAINTENANCE", "A1_MAINTENANCE_CUSTOMER"] {
        if let Some(maintenance) = text(key) {
            fields.maintenance = Some(maintenance);
        }
    }
    fields
}

pub fn parse_devices(
    response: &Value,
    adoms: &HashMap<String, String>,
    owner: &str,
) -> Result<Vec<FortinetDevice>> {
    let data = first_result(response)?.data;
    let raw: Vec<RawDevice> = validate("fortinet_devices", &data)?;

    Ok(raw
        .into_iter()
        .map(|raw| {
            let meta = parse_meta_fields(&raw.meta_fields, owner);
            FortinetDevice {
                adom: adoms.get(&raw.name).cloned().unwrap_or_default(),
                ip: raw.ip,
                name: raw.name,
                hostname: raw.hostname,
                sn: raw.sn,
                uuid: meta.uuid.unwrap_or_default(),
                conn_status: raw.conn_status,
                ha_mode: raw.ha_mode,
                ha_slave: raw.ha_slave,
                maintenance: meta.maintenance.unwrap_or_default(),
                platform_str: raw.platform_str,
                version: raw.version,
                vm_cpu: raw.vm_cpu,
                vm_cpu_limit: raw.vm_cpu_limit,
                vm_mem: raw.vm_mem,
                vm_mem_limit: raw.vm_mem_limit,
            }
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct RawMember {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawExpand {
    #[serde(default)]
    device: Vec<RawMember>,
}

#[derive(Debug, Deserialize)]
struct RawAdom {
    name: String,
    #[serde(rename = "expand member", default)]
    expand_member: Option<RawExpand>,
}

pub fn parse_adoms(response: &Value) -> Result<HashMap<String, String>> {
    let data = first_result(response)?.data;
    let adoms: Vec<RawAdom> = validate("fortinet_adoms", &data)?;

    let mut devices = HashMap::new();
    for adom in adoms {
        for member in adom.expand_member.into_iter().flat_map(|expand| expand.device) {
            devices.insert(member.name, adom.name.clone());
        }
    }
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(data: Value) -> Value {
        json!({"id": 2, "result": [{"status": {"code": 0, "message": "OK"}, "data": data}]})
    }

    fn device(name: &str, meta: Value) -> Value {
        json!({
            "ip": "192.0.2.10",
            "name": name,
            "hostname": format!("{}-host", name),
            "sn": "FGT-1",
            "conn_status": "up",
            "ha_mode": "standalone",
            "platform_str": "FortiGate-100F",
            "version": 700,
            "vm_cpu": 0,
            "vm_cpu_limit": 0,
            "vm_mem": 0,
            "vm_mem_limit": 0,
            "mgmt_id": 12345,
            "meta fields": meta
        })
    }

    #[test]
    fn test_check_result() {
        assert!(check_result(&ok(json!({}))).is_ok());

        let failed = json!({"result": [{"status": {"code": -11, "message": "No permission"}}]});
        match check_result(&failed) {
            Err(AssuranceError::Api(message)) => assert!(message.contains("No permission")),
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(matches!(check_result(&json!({"error": 1})), Err(AssuranceError::Validation(_))));
        assert!(matches!(check_result(&json!({"result": []})), Err(AssuranceError::Validation(_))));
    }

    #[test]
    fn test_parse_status() {
        let response = ok(json!({
            "Serial Number": "FMG-1",
            "Hostname": "fmg01",
            "Major": 7,
            "Minor": 2,
            "Patch": "4",
            "BIOS version": "04000002",
            "License Status": "Valid"
        }));

        let status = parse_status(&response).unwrap();
        assert_eq!(status.sn, "FMG-1");
        assert_eq!(status.version, "7.2.4");
        assert_eq!(status.license_status, "Valid");
    }

    #[test]
    fn test_parse_meta_fields() {
        let meta = json!({
            "A1-UUID": " ABC ",
            "A1_UUID": "DEF",
            "A1_MAINTENANCE": "",
            "A1_MAINTENANCE_CUSTOMER": "until friday"
        });
        let fields = parse_meta_fields(meta.as_object().unwrap(), "A1");
        assert_eq!(fields.uuid.as_deref(), Some("def"));
        assert_eq!(fields.maintenance.as_deref(), Some("until friday"));

        assert_eq!(parse_meta_fields(meta.as_object().unwrap(), "B2"), MetaFields::default());
    }

    #[test]
    fn test_parse_devices_with_adoms() {
        let response = ok(json!([
            device("fw01", json!({"A1-UUID": "UUID-1"})),
            device("fw02", json!({}))
        ]));
        let adoms = HashMap::from([("fw01".to_string(), "customer-a".to_string())]);

        let devices = parse_devices(&response, &adoms, "A1").unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].uuid, "uuid-1");
        assert_eq!(devices[0].adom, "customer-a");
        assert_eq!(devices[1].uuid, "");
        assert_eq!(devices[1].adom, "");
        assert!(devices[1].ha_slave.is_none());
    }

    #[test]
    fn test_parse_devices_rejects_malformed_record() {
        let mut broken = device("fw01", json!({}));
        broken["version"] = json!("seven");
        let result = parse_devices(&ok(json!([broken])), &HashMap::new(), "A1");
        match result {
            Err(AssuranceError::Validation(e)) => assert!(e.reasons[0].message.contains("invalid type")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_adoms() {
        let response = ok(json!([
            {"name": "root", "expand member": {"device": [{"name": "fw01"}, {"name": "fw02"}]}},
            {"name": "empty"}
        ]));
        let adoms = parse_adoms(&response).unwrap();
        assert_eq!(adoms.len(), 2);
        assert_eq!(adoms.get("fw02").map(String::as_str), Some("root"));
    }
}
