use assurance_core::{AssuranceError, BusConfig, BusConnector, MessageBus, Result};
use async_nats::{Client, ConnectOptions, ServerAddr};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 解析 broker 地址列表
pub fn parse_servers(servers: &[String]) -> Result<Vec<ServerAddr>> {
    if servers.is_empty() {
        return Err(AssuranceError::config("bus: no servers configured"));
    }
    servers
        .iter()
        .map(|server| {
            server
                .parse::<ServerAddr>()
                .map_err(|e| AssuranceError::config(format!("bus: invalid server '{}': {}", server, e)))
        })
        .collect()
}

/// NATS 总线
pub struct NatsBus {
    client: Client,
    timeout: Duration,
}

impl NatsBus {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn flush(&self) -> Result<()> {
        match tokio::time::timeout(self.timeout, self.client.flush()).await {
            Ok(result) => result.map_err(|e| AssuranceError::bus(e.to_string())),
            Err(_) => Err(AssuranceError::Timeout(format!(
                "no acknowledgment within {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl MessageBus for NatsBus {
    async fn publish(&self, topic: &str, document: &Value) -> Result<()> {
        let payload = serde_json::to_vec(document)?;

        match tokio::time::timeout(
            self.timeout,
            self.client.publish(topic.to_string(), payload.into()),
        )
        .await
        {
            Ok(result) => result.map_err(|e| AssuranceError::bus(e.to_string()))?,
            Err(_) => {
                return Err(AssuranceError::Timeout(format!(
                    "publish to '{}' exceeded {}s",
                    topic,
                    self.timeout.as_secs()
                )))
            }
        }

        self.flush().await?;
        debug!(topic = %topic, "Message published");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if let Err(e) = self.flush().await {
            warn!(error = %e, "Flush on close failed");
        }
        Ok(())
    }
}

/// 发布关闭时使用的总线，丢弃所有消息
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBus;

#[async_trait]
impl MessageBus for DisabledBus {
    async fn publish(&self, topic: &str, _document: &Value) -> Result<()> {
        debug!(topic = %topic, "Bus disabled, message dropped");
        Ok(())
    }
}

/// NATS 连接工厂
pub struct NatsConnector {
    config: BusConfig,
}

impl NatsConnector {
    pub fn new(config: BusConfig) -> Self {
        Self { config }
    }

    fn options(&self) -> ConnectOptions {
        let mut options = ConnectOptions::new()
            .connection_timeout(self.config.send_timeout())
            .require_tls(self.config.tls_required());
        if let Some(cert) = &self.config.tls_client_cert {
            options = options.add_client_certificate(cert.certfile.clone(), cert.keyfile.clone());
        }
        options
    }
}

#[async_trait]
impl BusConnector for NatsConnector {
    async fn connect(&self) -> Result<Arc<dyn MessageBus>> {
        if !self.config.enabled {
            debug!("Bus publishing disabled");
            return Ok(Arc::new(DisabledBus));
        }

        let addrs = parse_servers(&self.config.servers)?;
        let connect = self.options().connect(addrs.as_slice());
        let client = tokio::time::timeout(self.config.send_timeout(), connect)
            .await
            .map_err(|_| {
                AssuranceError::Timeout(format!(
                    "connecting to {:?} exceeded {}s",
                    self.config.servers, self.config.timeout
                ))
            })?
            .map_err(|e| AssuranceError::bus(e.to_string()))?;

        info!(servers = ?self.config.servers, "Connected to NATS");
        Ok(Arc::new(NatsBus::new(client, self.config.send_timeout())))
    }
}
