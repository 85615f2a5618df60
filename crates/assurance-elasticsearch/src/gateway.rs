use assurance_core::{
    stamp_timestamp, AssuranceError, ElasticsearchNode, Result, StorageConnector, StorageGateway,
};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// Elasticsearch 存储网关
///
/// 每个采集任务持有独立实例，客户端随实例一起释放
pub struct ElasticsearchGateway {
    client: reqwest::Client,
    base_url: String,
    user: String,
    passwd: String,
    write_count: AtomicU64,
    search_count: AtomicU64,
}

impl ElasticsearchGateway {
    /// 创建网关
    pub fn new(node: &ElasticsearchNode) -> Result<Self> {
        let client = assurance_core::build_http_client(node.verify_ssl, node.request_timeout(), None)?;
        Ok(Self {
            client,
            base_url: node.base_url(),
            user: node.user.clone(),
            passwd: node.passwd.clone(),
            write_count: AtomicU64::new(0),
            search_count: AtomicU64::new(0),
        })
    }

    fn url(&self, index: &str, endpoint: &str) -> String {
        format!("{}/{}/{}", self.base_url, index, endpoint)
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .basic_auth(&self.user, Some(&self.passwd))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(url = %url, status = %status, "Elasticsearch request failed");
            return Err(AssuranceError::storage(format!(
                "{} returned {}: {}",
                url, status, text
            )));
        }

        Ok(response.json().await?)
    }
}

/// 构建精确匹配、按时间倒序、只取一条的查询
pub(crate) fn search_body(filters: &[(&str, &str)]) -> Value {
    let terms: Vec<Value> = filters
        .iter()
        .map(|(field, value)| {
            let mut term = Map::new();
            term.insert((*field).to_string(), Value::String((*value).to_string()));
            json!({ "term": term })
        })
        .collect();

    json!({
        "query": { "bool": { "must": terms } },
        "sort": { "@timestamp": "desc" },
        "size": 1
    })
}

/// 解析查询结果，没有命中时返回 None
pub(crate) fn parse_search_response(response: &Value) -> Result<Option<Value>> {
    let total = response
        .pointer("/hits/total/value")
        .and_then(Value::as_u64)
        .ok_or_else(|| AssuranceError::storage("search response without hits.total.value"))?;

    if total == 0 {
        return Ok(None);
    }

    Ok(response.pointer("/hits/hits/0/_source").cloned())
}

#[async_trait]
impl StorageGateway for ElasticsearchGateway {
    async fn write(&self, index: &str, mut document: Value) -> Result<()> {
        stamp_timestamp(&mut document);
        let url = self.url(index, "_doc");
        self.post(&url, &document).await?;
        self.write_count.fetch_add(1, Ordering::Relaxed);
        debug!(index = %index, "Document written to elasticsearch");
        Ok(())
    }

    async fn find_latest(&self, index: &str, filters: &[(&str, &str)]) -> Result<Option<Value>> {
        let url = self.url(index, "_search");
        let response = self.post(&url, &search_body(filters)).await?;
        self.search_count.fetch_add(1, Ordering::Relaxed);
        parse_search_response(&response)
    }

    async fn close(&self) -> Result<()> {
        debug!(
            base_url = %self.base_url,
            writes = self.write_count.load(Ordering::Relaxed),
            searches = self.search_count.load(Ordering::Relaxed),
            "Elasticsearch session closed"
        );
        Ok(())
    }
}

/// Elasticsearch 连接工厂
pub struct ElasticsearchConnector {
    node: ElasticsearchNode,
}

impl ElasticsearchConnector {
    pub fn new(node: ElasticsearchNode) -> Self {
        Self { node }
    }
}

#[async_trait]
impl StorageConnector for ElasticsearchConnector {
    async fn connect(&self) -> Result<Arc<dyn StorageGateway>> {
        Ok(Arc::new(ElasticsearchGateway::new(&self.node)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_body() {
        let body = search_body(&[("node_name.keyword", "fw01"), ("alert_type.keyword", "status")]);

        assert_eq!(body["size"], 1);
        assert_eq!(body["sort"]["@timestamp"], "desc");
        assert_eq!(body["query"]["bool"]["must"][0]["term"]["node_name.keyword"], "fw01");
        assert_eq!(body["query"]["bool"]["must"][1]["term"]["alert_type.keyword"], "status");
    }

    #[test]
    fn test_parse_search_response_hit() {
        let response = json!({
            "hits": {
                "total": {"value": 3, "relation": "eq"},
                "hits": [{"_index": "a", "_source": {"event": "DOWN"}}]
            }
        });
        let found = parse_search_response(&response).unwrap().unwrap();
        assert_eq!(found["event"], "DOWN");
    }

    #[test]
    fn test_parse_search_response_empty() {
        let response = json!({"hits": {"total": {"value": 0}, "hits": []}});
        assert!(parse_search_response(&response).unwrap().is_none());
    }

    #[test]
    fn test_parse_search_response_malformed() {
        let response = json!({"error": "boom"});
        assert!(matches!(
            parse_search_response(&response),
            Err(AssuranceError::Storage(_))
        ));
    }

    #[test]
    fn test_gateway_urls() {
        let node: ElasticsearchNode = serde_json::from_value(json!({
            "host": "es:9200",
            "user": "u",
            "passwd": "p",
            "use_ssl": false
        }))
        .unwrap();
        let gateway = ElasticsearchGateway::new(&node).unwrap();
        assert_eq!(gateway.url("alerts_2024.03", "_doc"), "http://es:9200/alerts_2024.03/_doc");
    }
}
