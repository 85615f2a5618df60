pub mod customer;
pub mod gateway;

pub use customer::{CustomerClient, MANAGED_ACCOUNTS_INDEX};
pub use gateway::{ElasticsearchConnector, ElasticsearchGateway};
