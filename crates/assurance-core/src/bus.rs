use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{AssuranceError, Result};

/// 消息总线（只发布）
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// 发布一条消息，等待确认的时间有上限，超时即失败
    async fn publish(&self, topic: &str, document: &Value) -> Result<()>;

    /// 释放连接
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// 总线连接工厂
#[async_trait]
pub trait BusConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn MessageBus>>;
}

/// 内存总线
#[derive(Clone, Default)]
pub struct InMemoryBus {
    published: Arc<Mutex<Vec<(String, Value)>>>,
    fail_publish: bool,
    connections: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次发布都失败的总线（模拟 broker 不可达）
    pub fn failing() -> Self {
        Self {
            fail_publish: true,
            ..Self::default()
        }
    }

    pub async fn published(&self) -> Vec<(String, Value)> {
        self.published.lock().await.clone()
    }

    pub async fn published_count(&self) -> usize {
        self.published.lock().await.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, topic: &str, document: &Value) -> Result<()> {
        if self.fail_publish {
            return Err(AssuranceError::Timeout(format!(
                "no acknowledgment for topic '{}'",
                topic
            )));
        }
        self.published
            .lock()
            .await
            .push((topic.to_string(), document.clone()));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl BusConnector for InMemoryBus {
    async fn connect(&self) -> Result<Arc<dyn MessageBus>> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_stores_message() {
        let bus = InMemoryBus::new();
        bus.publish("einstein", &json!({"event": "UP"})).await.unwrap();

        let published = bus.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "einstein");
        assert_eq!(published[0].1["event"], "UP");
    }

    #[tokio::test]
    async fn test_failing_bus() {
        let bus = InMemoryBus::failing();
        let result = bus.publish("einstein", &json!({})).await;
        assert!(matches!(result, Err(AssuranceError::Timeout(_))));
        assert_eq!(bus.published_count().await, 0);
    }
}
