use assurance_core::{BusConnector, InMemoryBus, InMemoryStorage, Result, StorageConnector};
use assurance_einstein::AlertIndices;
use assurance_elasticsearch::ElasticsearchConnector;
use assurance_nats::NatsConnector;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::BaseConfig;
use crate::launcher::Launcher;
use crate::runtime::CollectorSettings;
use crate::signal::{wait_for_signal, StopSwitch};

/// 存储和总线的连接工厂
#[derive(Clone)]
pub struct Connectors {
    pub storage: Arc<dyn StorageConnector>,
    pub bus: Arc<dyn BusConnector>,
}

impl Connectors {
    /// Elasticsearch + NATS
    pub fn live(config: &BaseConfig) -> Self {
        Self {
            storage: Arc::new(ElasticsearchConnector::new(config.elasticsearch.node.clone())),
            bus: Arc::new(NatsConnector::new(config.einstein.bus.clone())),
        }
    }

    /// 只采集和评估，文档与消息留在内存中
    pub fn dry_run() -> Self {
        Self {
            storage: Arc::new(InMemoryStorage::new()),
            bus: Arc::new(InMemoryBus::new()),
        }
    }
}

impl CollectorSettings {
    pub fn from_base(base: &BaseConfig, data_index: impl Into<String>, uuid_required: bool) -> Self {
        Self {
            data_index: data_index.into(),
            uuid_required,
            einstein: base.einstein.clone(),
            indices: AlertIndices::from(&base.elasticsearch.node),
        }
    }
}

/// 运行全部采集任务，收到 SIGTERM/SIGINT 时取消
pub async fn run_until_signal(launcher: Launcher) -> Result<()> {
    if launcher.is_empty() {
        warn!("No devices configured");
        return Ok(());
    }

    let stop = StopSwitch::new();
    let watcher = {
        let stop = stop.clone();
        tokio::spawn(async move {
            match wait_for_signal().await {
                Ok(reason) => stop.stop(reason),
                Err(e) => warn!(error = %e, "Failed to install signal handlers"),
            }
        })
    };

    info!(collectors = launcher.len(), "Starting collectors");
    let result = launcher.run(stop).await;
    watcher.abort();
    result
}
