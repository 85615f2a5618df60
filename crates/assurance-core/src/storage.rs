use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset, Local, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AssuranceError, Result};

/// 文档存储抽象 trait
///
/// 只追加写入，按时间戳查询最近一条
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// 写入一条文档（缺少 `@timestamp` 时自动补齐）
    async fn write(&self, index: &str, document: Value) -> Result<()>;

    /// 写入按月分区的索引：`index_prefix + YYYY.MM`
    async fn write_monthly(&self, index_prefix: &str, document: Value) -> Result<()> {
        let index = monthly_index(index_prefix, Local::now());
        self.write(&index, document).await
    }

    /// 查询满足全部精确匹配条件、时间戳最新的一条文档
    async fn find_latest(&self, index: &str, filters: &[(&str, &str)]) -> Result<Option<Value>>;

    /// 释放连接
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// 存储连接工厂
///
/// 每个采集任务在 collect 成功后获取自己的连接，不共享
#[async_trait]
pub trait StorageConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn StorageGateway>>;
}

/// 按月分区的索引名
pub fn monthly_index(prefix: &str, date: impl Datelike) -> String {
    format!("{}{:04}.{:02}", prefix, date.year(), date.month())
}

/// 补齐 `@timestamp`：优先取 `timestamp` 字段，否则取当前时间
pub fn stamp_timestamp(document: &mut Value) {
    if let Value::Object(map) = document {
        if !map.contains_key("@timestamp") {
            let timestamp = map
                .remove("timestamp")
                .unwrap_or_else(|| Value::String(Utc::now().to_rfc3339()));
            map.insert("@timestamp".to_string(), timestamp);
        }
    }
}

/// 存储中的一条文档
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub index: String,
    pub document: Value,
}

/// 内存存储
///
/// 克隆共享同一份数据，作为连接工厂时每次 connect 返回共享数据的新句柄
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    documents: Arc<Mutex<Vec<StoredDocument>>>,
    connections: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有文档
    pub async fn documents(&self) -> Vec<StoredDocument> {
        self.documents.lock().await.clone()
    }

    /// 索引名以 `prefix` 开头的文档（按写入顺序）
    pub async fn documents_with_prefix(&self, prefix: &str) -> Vec<Value> {
        self.documents
            .lock()
            .await
            .iter()
            .filter(|d| d.index.starts_with(prefix))
            .map(|d| d.document.clone())
            .collect()
    }

    /// 已建立的连接数
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// 已释放的连接数
    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

fn index_matches(pattern: &str, index: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => index.starts_with(prefix),
        None => pattern == index,
    }
}

fn field_matches(document: &Value, field: &str, expected: &str) -> bool {
    // `xxx.keyword` 是同一字段的精确匹配视图
    let field = field.strip_suffix(".keyword").unwrap_or(field);
    match document.get(field) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == expected,
    }
}

fn document_time(document: &Value) -> Option<DateTime<FixedOffset>> {
    document
        .get("@timestamp")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
}

#[async_trait]
impl StorageGateway for InMemoryStorage {
    async fn write(&self, index: &str, mut document: Value) -> Result<()> {
        if !document.is_object() {
            return Err(AssuranceError::storage(format!(
                "document for index '{}' is not an object",
                index
            )));
        }
        stamp_timestamp(&mut document);
        debug!(index = %index, "Document stored in memory");
        self.documents.lock().await.push(StoredDocument {
            index: index.to_string(),
            document,
        });
        Ok(())
    }

    async fn find_latest(&self, index: &str, filters: &[(&str, &str)]) -> Result<Option<Value>> {
        let documents = self.documents.lock().await;
        let latest = documents
            .iter()
            .enumerate()
            .filter(|(_, d)| index_matches(index, &d.index))
            .filter(|(_, d)| {
                filters
                    .iter()
                    .all(|(field, value)| field_matches(&d.document, field, value))
            })
            .max_by_key(|(position, d)| (document_time(&d.document), *position))
            .map(|(_, d)| d.document.clone());
        Ok(latest)
    }

    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl StorageConnector for InMemoryStorage {
    async fn connect(&self) -> Result<Arc<dyn StorageGateway>> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.clone()))
    }
}
