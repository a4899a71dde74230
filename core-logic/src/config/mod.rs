use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Builds a `reqwest::Proxy` routing all traffic, with basic auth if set.
    pub fn to_reqwest_proxy(&self) -> Result<reqwest::Proxy> {
        let mut proxy = reqwest::Proxy::all(&self.url)
            .with_context(|| format!("Invalid proxy url {}", self.url))?;
        if let (Some(u), Some(p)) = (&self.username, &self.password) {
            proxy = proxy.basic_auth(u, p);
        }
        Ok(proxy)
    }

    /// Host and port only, safe to print in logs.
    pub fn redacted(&self) -> String {
        self.url
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .trim_start_matches("socks5://")
            .to_string()
    }
}
