use assurance_core::{Result, StorageGateway};
use assurance_types::{validate, Customer};
use std::sync::Arc;
use tracing::debug;

/// 托管客户账户索引
pub const MANAGED_ACCOUNTS_INDEX: &str = "nms_managed_accounts-raw_*";

/// 客户信息查询
///
/// 先按 uuid 精确匹配，再按主机名匹配（`uuid_required` 时跳过主机名）
pub struct CustomerClient {
    storage: Arc<dyn StorageGateway>,
}

impl CustomerClient {
    pub fn new(storage: Arc<dyn StorageGateway>) -> Self {
        Self { storage }
    }

    pub async fn get_customer_info(
        &self,
        uuid: Option<&str>,
        hostname: Option<&str>,
        uuid_required: bool,
    ) -> Result<Option<Customer>> {
        let hostname = if uuid_required { None } else { hostname };

        if let Some(uuid) = uuid {
            if let Some(found) = self
                .storage
                .find_latest(MANAGED_ACCOUNTS_INDEX, &[("uuid.keyword", uuid)])
                .await?
            {
                debug!(uuid = %uuid, "Customer found by uuid");
                return Ok(Some(validate("customer", &found)?));
            }
        }

        if let Some(hostname) = hostname {
            if let Some(found) = self
                .storage
                .find_latest(MANAGED_ACCOUNTS_INDEX, &[("nms_hostname", hostname)])
                .await?
            {
                debug!(hostname = %hostname, "Customer found by hostname");
                return Ok(Some(validate("customer", &found)?));
            }
        }

        Ok(None)
    }
}
