use reqwest::{Client, ClientBuilder, Proxy};
use std::time::Duration;

use crate::error::Result;

/// 构建 HTTP 客户端
///
/// 所有请求都带超时，避免阻塞调用无限等待
pub fn build_http_client(verify_ssl: bool, timeout: Duration, proxy: Option<&str>) -> Result<Client> {
    let mut builder = ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(timeout)
        .danger_accept_invalid_certs(!verify_ssl);

    if let Some(proxy) = proxy {
        builder = builder.proxy(Proxy::all(proxy)?);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_with_proxy() {
        let client = build_http_client(false, Duration::from_secs(5), Some("http://proxy:3128"));
        assert!(client.is_ok());
    }
}
