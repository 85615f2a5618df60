pub mod bus;
pub mod config;
pub mod error;
pub mod http;
pub mod storage;

pub use bus::{BusConnector, InMemoryBus, MessageBus};
pub use config::{
    ApiToken, BusConfig, EinsteinConfig, ElasticsearchConfig, ElasticsearchNode, HttpNode,
    NodeMapping, TlsClientCert,
};
pub use error::{AssuranceError, Result};
pub use http::build_http_client;
pub use storage::{monthly_index, stamp_timestamp, InMemoryStorage, StorageConnector, StorageGateway};
