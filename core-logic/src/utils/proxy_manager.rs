use crate::config::ProxyConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub struct ProxyManager;

impl ProxyManager {
    const PROXY_FILE: &'static str = "proxies.txt";

    /// Loads proxies from `proxies.txt` in the working directory.
    pub fn load_proxies() -> Result<Vec<ProxyConfig>> {
        Self::load_proxies_from(Self::PROXY_FILE)
    }

    /// Loads proxies from a file, one per line.
    ///
    /// Accepted forms:
    /// - `ip:port`
    /// - `ip:port:username:password`
    /// - `scheme://[username:password@]host:port`
    ///
    /// Blank lines and `#` comments are skipped. A missing file is not an
    /// error: the caller simply runs without proxies.
    pub fn load_proxies_from(path: impl AsRef<Path>) -> Result<Vec<ProxyConfig>> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("{} not found. Running without proxies.", path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let proxies: Vec<ProxyConfig> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let parsed = Self::parse_line(line);
                if parsed.is_none() {
                    warn!("Skipping invalid proxy line: {}", line);
                }
                parsed
            })
            .collect();

        info!("Loaded {} proxies from {}", proxies.len(), path.display());
        Ok(proxies)
    }

    pub fn parse_line(line: &str) -> Option<ProxyConfig> {
        if line.contains("://") {
            let u = url::Url::parse(line).ok()?;
            let host = u.host_str()?;
            let port = u.port_or_known_default()?;
            let username = Some(u.username())
                .filter(|name| !name.is_empty())
                .map(str::to_string);
            let password = u.password().map(str::to_string);

            return Some(ProxyConfig {
                url: format!("{}://{}:{}", u.scheme(), host, port),
                username,
                password,
            });
        }

        let parts: Vec<&str> = line.split(':').map(str::trim).collect();
        match parts.as_slice() {
            [host, port] => Some(ProxyConfig {
                url: format!("http://{}:{}", host, port),
                username: None,
                password: None,
            }),
            [host, port, user, pass] => Some(ProxyConfig {
                url: format!("http://{}:{}", host, port),
                username: Some(user.to_string()),
                password: Some(pass.to_string()),
            }),
            _ => None,
        }
    }
}
