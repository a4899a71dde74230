//! Proxy reachability probe run once per account before its worker starts.

use anyhow::{Context, Result};
use core_logic::{with_retry, NetworkError, ProxyConfig, RetryConfig};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default probe target, a small page that answers HEAD quickly.
pub const PROBE_URL: &str = "https://httpbin.org/ip";

/// Sends a HEAD request to `target_url` through `proxy`.
///
/// Any HTTP status counts as reachable; only transport failures do not.
pub async fn probe_proxy(proxy: &ProxyConfig, target_url: &str, retry: RetryConfig) -> Result<()> {
    let client = Client::builder()
        .timeout(PROBE_TIMEOUT)
        .proxy(proxy.to_reqwest_proxy()?)
        .build()
        .context("Failed to build probe client")?;

    let label = format!("Proxy probe {}", proxy.redacted());
    let result = with_retry(retry, &label, || async {
        let response = client.head(target_url).send().await?;
        debug!("{} answered {}", label, response.status());
        Ok::<(), anyhow::Error>(())
    })
    .await;

    result.map_err(|e| {
        warn!("{} failed: {:#}", label, e);
        NetworkError::ProxyUnreachable {
            proxy: proxy.redacted(),
            reason: format!("{:#}", e),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_proxy_reported() {
        let proxy = ProxyConfig {
            url: "http://127.0.0.1:1".to_string(),
            username: None,
            password: None,
        };
        let retry = RetryConfig::new(1, 10).without_jitter();

        let err = probe_proxy(&proxy, "http://example.com/", retry)
            .await
            .unwrap_err();
        let network = err.downcast_ref::<NetworkError>();
        assert!(matches!(
            network,
            Some(NetworkError::ProxyUnreachable { proxy, .. }) if proxy == "127.0.0.1:1"
        ));
    }
}
