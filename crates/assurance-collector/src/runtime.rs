use assurance_core::{
    AssuranceError, BusConnector, EinsteinConfig, MessageBus, Result, StorageConnector,
    StorageGateway,
};
use assurance_einstein::{AlertEngine, AlertIndices};
use assurance_elasticsearch::CustomerClient;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::adapter::{DeviceAdapter, Service, Snapshot};

/// 采集器运行参数
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// 服务文档的索引前缀（按月分区）
    pub data_index: String,
    /// 只按 uuid 查询客户
    pub uuid_required: bool,
    pub einstein: EinsteinConfig,
    pub indices: AlertIndices,
}

/// 单个设备的采集任务
///
/// 存储和总线连接在 collect 成功后获取，只在本次运行内使用。
/// 正常返回和出错时显式关闭；任务被取消时连接随 `Arc` 释放。
pub struct CollectorRuntime<A: DeviceAdapter> {
    adapter: A,
    settings: CollectorSettings,
    storage: Arc<dyn StorageConnector>,
    bus: Arc<dyn BusConnector>,
}

impl<A: DeviceAdapter> CollectorRuntime<A> {
    pub fn new(
        adapter: A,
        settings: CollectorSettings,
        storage: Arc<dyn StorageConnector>,
        bus: Arc<dyn BusConnector>,
    ) -> Self {
        Self {
            adapter,
            settings,
            storage,
            bus,
        }
    }

    pub fn name(&self) -> &str {
        self.adapter.name()
    }

    /// 执行一次完整的采集
    ///
    /// 输入结构错误在这里统一记录，然后原样返回
    pub async fn run(&self) -> Result<()> {
        match self.run_pass().await {
            Err(AssuranceError::Validation(e)) => {
                error!(collector = %self.name(), "Runtime Error: {}", e);
                Err(AssuranceError::Validation(e))
            }
            other => other,
        }
    }

    async fn run_pass(&self) -> Result<()> {
        let snapshot = self.adapter.collect().await?;
        info!(
            collector = %self.name(),
            devices = snapshot.devices.len(),
            "Collected device snapshot"
        );

        let storage = self.storage.connect().await?;
        let result = self.with_storage(&storage, snapshot).await;
        release("storage", storage.close().await, result)
    }

    async fn with_storage(
        &self,
        storage: &Arc<dyn StorageGateway>,
        snapshot: Snapshot<A::Status, A::Device>,
    ) -> Result<()> {
        let bus = self.bus.connect().await?;
        let result = self.with_bus(storage, &bus, snapshot).await;
        release("bus", bus.close().await, result)
    }

    async fn with_bus(
        &self,
        storage: &Arc<dyn StorageGateway>,
        bus: &Arc<dyn MessageBus>,
        snapshot: Snapshot<A::Status, A::Device>,
    ) -> Result<()> {
        let engine = AlertEngine::new(
            self.settings.einstein.clone(),
            self.settings.indices.clone(),
            storage.clone(),
            bus.clone(),
        );
        self.process(storage, &engine, snapshot).await
    }

    /// 心跳 → 逐设备：客户 → 归档服务文档 → 告警
    async fn process(
        &self,
        storage: &Arc<dyn StorageGateway>,
        engine: &AlertEngine,
        snapshot: Snapshot<A::Status, A::Device>,
    ) -> Result<()> {
        engine.send_keep_alive(&self.adapter.keepalive()).await?;

        let customers = CustomerClient::new(storage.clone());
        for device in &snapshot.devices {
            let query = self.adapter.customer_query(device);
            let customer = customers
                .get_customer_info(
                    query.uuid.as_deref(),
                    query.hostname.as_deref(),
                    self.settings.uuid_required,
                )
                .await?;
            if customer.is_none() {
                debug!(collector = %self.name(), uuid = ?query.uuid, hostname = ?query.hostname, "Customer not found");
            }

            let service = Service::new(&snapshot.status, device, customer);
            storage
                .write_monthly(&self.settings.data_index, serde_json::to_value(&service)?)
                .await?;

            for mut alert in self.adapter.evaluate(&service)?.into_iter().flatten() {
                if let Some(summary) = self.adapter.summary(&alert) {
                    alert.summary = summary;
                }
                engine.send_alert(&alert).await?;
            }
        }

        Ok(())
    }
}

/// 关闭连接；处理过程已经失败时保留原错误
fn release(resource: &str, closed: Result<()>, result: Result<()>) -> Result<()> {
    match (result, closed) {
        (Ok(()), closed) => closed,
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_error)) => {
            warn!(resource = %resource, error = %close_error, "Release failed");
            Err(e)
        }
    }
}
