use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AssuranceError, Result};
use crate::http::build_http_client;

/// TLS 客户端证书
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsClientCert {
    pub certfile: PathBuf,
    pub keyfile: PathBuf,
}

/// 消息总线配置（NATS）
///
/// 不接受未知字段：Kafka 形式的配置（`bootstrap_servers`、`security_protocol`）在启动时报错
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// NATS 服务器地址列表
    pub servers: Vec<String>,

    pub topic: String,

    /// 发布确认超时（秒）
    #[serde(default = "default_bus_timeout")]
    pub timeout: u64,

    /// 是否发布到总线
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 强制 TLS；配置了客户端证书时总是启用
    #[serde(default)]
    pub require_tls: bool,

    #[serde(default)]
    pub tls_client_cert: Option<TlsClientCert>,
}

impl BusConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn tls_required(&self) -> bool {
        self.require_tls || self.tls_client_cert.is_some()
    }
}

/// 节点重映射规则
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeMapping {
    pub from_node_name: String,
    pub to_node_name: String,
    pub to_organisation_id: i64,
}

/// 告警引擎配置（启动时读取，运行期间不变）
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EinsteinConfig {
    /// 心跳超时（分钟）
    pub keepalive_timeout: u32,

    pub bus: BusConfig,

    #[serde(default)]
    pub node_mapping: Vec<NodeMapping>,

    /// 全局静音：所有消息强制为 UP
    #[serde(default)]
    pub clear_all: bool,
}

impl EinsteinConfig {
    /// 查找节点映射
    pub fn mapping_for(&self, node_name: &str) -> Option<&NodeMapping> {
        self.node_mapping
            .iter()
            .find(|m| m.from_node_name == node_name)
    }
}

/// Elasticsearch 节点配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElasticsearchNode {
    pub host: String,
    pub user: String,
    pub passwd: String,

    #[serde(default = "default_true")]
    pub use_ssl: bool,

    #[serde(default = "default_true")]
    pub verify_ssl: bool,

    /// 告警索引前缀
    #[serde(default = "default_alert_index")]
    pub alert_index: String,

    /// 心跳索引前缀
    #[serde(default = "default_keep_alive_index")]
    pub keep_alive_index: String,

    /// 请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub timeout: u64,
}

impl ElasticsearchNode {
    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.host.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElasticsearchConfig {
    pub node: ElasticsearchNode,
}

/// API Token（作为查询参数发送）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiToken {
    pub name: String,
    pub value: String,
}

/// 设备管理接口配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpNode {
    pub url: String,

    #[serde(default)]
    pub api_user: Option<String>,

    #[serde(default)]
    pub api_passwd: Option<String>,

    #[serde(default)]
    pub api_token: Option<ApiToken>,

    #[serde(default = "default_true")]
    pub verify_ssl: bool,

    #[serde(default)]
    pub proxy: Option<String>,

    /// 请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub timeout: u64,

    /// 元数据字段的归属方
    #[serde(default = "default_owner")]
    pub owner: String,
}

impl HttpNode {
    /// 必须提供 token 或用户名/密码
    pub fn validate(&self) -> Result<()> {
        if self.api_token.is_none() && (self.api_user.is_none() || self.api_passwd.is_none()) {
            return Err(AssuranceError::config(format!(
                "{}: either token or username/password needed",
                self.url
            )));
        }
        Ok(())
    }

    /// 按节点配置构建 HTTP 客户端
    pub fn client(&self) -> Result<reqwest::Client> {
        build_http_client(
            self.verify_ssl,
            Duration::from_secs(self.timeout),
            self.proxy.as_deref(),
        )
    }
}

fn default_true() -> bool {
    true
}

fn default_bus_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

fn default_alert_index() -> String {
    "nms_einstein-alerts_".to_string()
}

fn default_keep_alive_index() -> String {
    "nms_einstein-keep_alive_".to_string()
}

fn default_owner() -> String {
    "A1".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_einstein_config_defaults() {
        let config: EinsteinConfig = serde_json::from_value(json!({
            "keepalive_timeout": 20,
            "bus": {
                "servers": ["broker:4222"],
                "topic": "einstein"
            }
        }))
        .unwrap();

        assert_eq!(config.bus.timeout, 10);
        assert!(config.bus.enabled);
        assert!(config.node_mapping.is_empty());
        assert!(!config.clear_all);
        assert_eq!(config.bus.send_timeout(), Duration::from_secs(10));
        assert!(!config.bus.tls_required());
    }

    #[test]
    fn test_kafka_bus_config_is_rejected() {
        let kafka = json!({
            "keepalive_timeout": 20,
            "kafka": {
                "bootstrap_servers": ["kafka1.example.net:9092"],
                "topic": "einstein",
                "security_protocol": "SSL"
            }
        });
        let err = serde_json::from_value::<EinsteinConfig>(kafka).unwrap_err();
        assert!(err.to_string().contains("kafka"));

        let bus = json!({
            "servers": ["kafka1.example.net:9092"],
            "topic": "einstein",
            "security_protocol": "SSL"
        });
        let err = serde_json::from_value::<BusConfig>(bus).unwrap_err();
        assert!(err.to_string().contains("security_protocol"));
    }

    #[test]
    fn test_client_cert_requires_tls() {
        let bus: BusConfig = serde_json::from_value(json!({
            "servers": ["tls://broker:4222"],
            "topic": "einstein",
            "tls_client_cert": {"certfile": "/etc/certs/client.pem", "keyfile": "/etc/certs/client.key"}
        }))
        .unwrap();
        assert!(bus.tls_required());
    }

    #[test]
    fn test_mapping_for() {
        let config: EinsteinConfig = serde_json::from_value(json!({
            "keepalive_timeout": 20,
            "bus": {"servers": ["nats://localhost:4222"], "topic": "einstein"},
            "node_mapping": [
                {"from_node_name": "fw-int", "to_node_name": "fw-ext", "to_organisation_id": 42}
            ]
        }))
        .unwrap();

        assert_eq!(config.mapping_for("fw-int").map(|m| m.to_organisation_id), Some(42));
        assert!(config.mapping_for("fw-other").is_none());
    }

    #[test]
    fn test_elasticsearch_node_defaults() {
        let node: ElasticsearchNode = serde_json::from_value(json!({
            "host": "es.local:9200/",
            "user": "u",
            "passwd": "p"
        }))
        .unwrap();

        assert_eq!(node.base_url(), "https://es.local:9200");
        assert_eq!(node.alert_index, "nms_einstein-alerts_");
        assert_eq!(node.keep_alive_index, "nms_einstein-keep_alive_");
    }

    #[test]
    fn test_http_node_requires_credentials() {
        let node: HttpNode = serde_json::from_value(json!({"url": "https://fmg"})).unwrap();
        assert!(matches!(node.validate(), Err(AssuranceError::Config(_))));

        let node: HttpNode = serde_json::from_value(json!({
            "url": "https://fmg",
            "api_token": {"name": "access_token", "value": "secret"}
        }))
        .unwrap();
        assert!(node.validate().is_ok());
        assert_eq!(node.owner, "A1");
    }
}
