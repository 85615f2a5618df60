use assurance_core::{ElasticsearchNode, EinsteinConfig, MessageBus, Result, StorageGateway};
use assurance_types::{validate, Addons, Alert, AlertEvent, EinsteinMessage, KeepAliveAlert};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

/// 归档索引前缀
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertIndices {
    pub alert_index: String,
    pub keep_alive_index: String,
}

impl From<&ElasticsearchNode> for AlertIndices {
    fn from(node: &ElasticsearchNode) -> Self {
        Self {
            alert_index: node.alert_index.clone(),
            keep_alive_index: node.keep_alive_index.clone(),
        }
    }
}

/// 告警引擎
///
/// 引擎本身不保存跨周期状态，事件连续性完全依赖存储中的历史记录。
/// 每个采集任务持有自己的实例，存储和总线连接由调用方管理生命周期。
pub struct AlertEngine {
    config: EinsteinConfig,
    indices: AlertIndices,
    storage: Arc<dyn StorageGateway>,
    bus: Arc<dyn MessageBus>,
}

impl AlertEngine {
    pub fn new(
        config: EinsteinConfig,
        indices: AlertIndices,
        storage: Arc<dyn StorageGateway>,
        bus: Arc<dyn MessageBus>,
    ) -> Self {
        Self {
            config,
            indices,
            storage,
            bus,
        }
    }

    /// 发送告警
    pub async fn send_alert(&self, alert: &Alert) -> Result<EinsteinMessage> {
        self.send_alert_at(alert, Utc::now()).await
    }

    /// 以给定时间作为本次观测时间发送告警
    pub async fn send_alert_at(&self, alert: &Alert, now: DateTime<Utc>) -> Result<EinsteinMessage> {
        let mut message = EinsteinMessage::from_alert(alert, now);
        self.remap(&mut message);

        if let Some(previous) = self.find_previous(&self.indices.alert_index, &message).await? {
            message.first_occurrence = previous.first_occurrence;
            // 进入 DOWN 总是开始新的事件
            if message.event == AlertEvent::Down && previous.event != AlertEvent::Down {
                message.first_occurrence = message.last_occurrence;
            }
        }

        self.mute(&mut message);

        let publish = self.config.bus.enabled && alert.einstein && message.event.is_publishable();
        self.emit(&message, publish, &self.indices.alert_index, Some(&alert.addons))
            .await?;
        Ok(message)
    }

    /// 发送心跳
    pub async fn send_keep_alive(&self, alert: &KeepAliveAlert) -> Result<EinsteinMessage> {
        self.send_keep_alive_at(alert, Utc::now()).await
    }

    /// 以给定时间作为本次观测时间发送心跳
    ///
    /// 上一条心跳距本次不足 `keepalive_timeout` 分钟时沿用其 first_occurrence
    pub async fn send_keep_alive_at(
        &self,
        alert: &KeepAliveAlert,
        now: DateTime<Utc>,
    ) -> Result<EinsteinMessage> {
        let mut message = EinsteinMessage::keep_alive(alert, self.config.keepalive_timeout, now);
        self.remap(&mut message);

        if let Some(previous) = self
            .find_previous(&self.indices.keep_alive_index, &message)
            .await?
        {
            let elapsed = message.last_occurrence - previous.last_occurrence;
            if elapsed < self.keepalive_window() {
                message.first_occurrence = previous.first_occurrence;
            } else {
                debug!(
                    key = %message.key(),
                    elapsed_secs = elapsed.num_seconds(),
                    "Keepalive stream interrupted"
                );
            }
        }

        self.mute(&mut message);

        let publish = self.config.bus.enabled && message.event.is_publishable();
        self.emit(&message, publish, &self.indices.keep_alive_index, None)
            .await?;
        Ok(message)
    }

    fn keepalive_window(&self) -> Duration {
        Duration::minutes(i64::from(self.config.keepalive_timeout))
    }

    /// 节点重映射，在查询历史之前执行
    fn remap(&self, message: &mut EinsteinMessage) {
        if let Some(mapping) = self.config.mapping_for(&message.node_name) {
            debug!(
                from = %mapping.from_node_name,
                to = %mapping.to_node_name,
                organisation_id = mapping.to_organisation_id,
                "Node remapped"
            );
            message.node_name = mapping.to_node_name.clone();
            message.organisation_id = mapping.to_organisation_id;
        }
    }

    /// 全局静音同样作用于归档副本
    fn mute(&self, message: &mut EinsteinMessage) {
        if self.config.clear_all {
            message.event = AlertEvent::Up;
        }
    }

    async fn find_previous(
        &self,
        index_prefix: &str,
        message: &EinsteinMessage,
    ) -> Result<Option<EinsteinMessage>> {
        let pattern = format!("{}*", index_prefix);
        let found = self
            .storage
            .find_latest(
                &pattern,
                &[
                    ("node_name.keyword", message.node_name.as_str()),
                    ("alert_type.keyword", message.alert_type.as_str()),
                ],
            )
            .await?;

        match found {
            Some(document) => Ok(Some(validate("previous_alert", &document)?)),
            None => Ok(None),
        }
    }

    /// 发布（按需）并归档
    ///
    /// 发布失败时仍然归档，之后返回发布错误
    async fn emit(
        &self,
        message: &EinsteinMessage,
        publish: bool,
        index_prefix: &str,
        addons: Option<&Addons>,
    ) -> Result<()> {
        let prefix = if publish { "+" } else { "-" };
        info!(
            "{}Einstein: {}/{} [{}] {}",
            prefix,
            message.event,
            message.severity_name(),
            message.key(),
            message.short_summary
        );

        let published = if publish {
            let document = message.to_document()?;
            self.bus.publish(&self.config.bus.topic, &document).await
        } else {
            Ok(())
        };

        if let Err(e) = &published {
            error!(key = %message.key(), error = %e, "Publish failed");
        }

        let archive = match addons {
            Some(addons) => message.to_archive_document(addons)?,
            None => message.to_document()?,
        };
        self.storage.write_monthly(index_prefix, archive).await?;

        published
    }
}
