//! reqwest-backed implementation of [`GameApi`].
//!
//! One instance serves exactly one account. The transport is an owned
//! `reqwest::Client` built with the account's proxy; `connect` replaces it and
//! `close` drops it so idle proxy connections are released during long sleeps.

use super::{ApiError, GameApi};
use crate::models::{
    Boost, ComboCards, DailyTask, GameConfig, ProfileSnapshot, PurchaseOutcome, Upgrade,
    UpgradesForBuy,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use core_logic::{ProxyConfig, SessionError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use zeroize::Zeroizing;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36";
const GAME_ORIGIN: &str = "https://hamsterkombatgame.io";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    #[serde(default)]
    auth_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClickerUserResponse {
    clicker_user: ProfileSnapshot,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuyUpgradeResponse {
    #[serde(default)]
    upgrades_for_buy: Option<Vec<Upgrade>>,
}

#[derive(Deserialize)]
struct TasksResponse {
    #[serde(default)]
    tasks: Vec<DailyTask>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoostsResponse {
    #[serde(default)]
    boosts_for_buy: Vec<Boost>,
}

#[derive(Deserialize)]
struct CheckTaskResponse {
    task: CheckedTask,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckedTask {
    #[serde(default)]
    is_completed: bool,
}

/// Game API client for one account
pub struct HttpGameApi {
    session_name: String,
    base_url: String,
    combo_source_url: String,
    bootstrap_url: Option<String>,
    init_data: Zeroizing<String>,
    user_agent: String,
    proxy: Option<ProxyConfig>,
    timeout: Duration,
    client: Option<Client>,
    token: Option<Zeroizing<String>>,
}

impl HttpGameApi {
    pub fn new(
        session_name: impl Into<String>,
        config: &crate::config::TapperConfig,
        init_data: Zeroizing<String>,
        proxy: Option<ProxyConfig>,
    ) -> Self {
        Self {
            session_name: session_name.into(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            combo_source_url: config.combo_source_url.clone(),
            bootstrap_url: config.bootstrap_url.clone(),
            init_data,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy,
            timeout: config.request_timeout(),
            client: None,
            token: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn build_client(&self) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(ORIGIN, HeaderValue::from_static(GAME_ORIGIN));
        headers.insert(REFERER, HeaderValue::from_static("https://hamsterkombatgame.io/"));

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2);

        if let Some(proxy) = &self.proxy {
            builder = builder.proxy(proxy.to_reqwest_proxy()?);
        }

        builder.build().context("Failed to build HTTP client")
    }

    fn client(&self, endpoint: &str) -> Result<&Client> {
        self.client.as_ref().ok_or_else(|| {
            ApiError::TransportClosed {
                endpoint: endpoint.to_string(),
            }
            .into()
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn send(&self, endpoint: &str, body: Value) -> Result<reqwest::Response> {
        let mut request = self.client(endpoint)?.post(self.url(endpoint)).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.as_str());
        }
        request
            .send()
            .await
            .with_context(|| format!("{} request to {} failed", self.session_name, endpoint))
    }

    async fn post_json<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> Result<T> {
        let response = self.send(endpoint, body).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(endpoint, status, response).await.into());
        }
        response.json::<T>().await.map_err(|e| {
            ApiError::Decode {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// 2xx is success, 4xx a business rejection, anything else an error.
    async fn post_flag(&self, endpoint: &str, body: Value) -> Result<bool> {
        let response = self.send(endpoint, body).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        let err = status_error(endpoint, status, response).await;
        if status.is_client_error() {
            warn!("{} | {} rejected: {}", self.session_name, endpoint, err);
            return Ok(false);
        }
        Err(err.into())
    }
}

async fn status_error(endpoint: &str, status: StatusCode, response: reqwest::Response) -> ApiError {
    let body = response.text().await.unwrap_or_default();
    ApiError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body: body.chars().take(256).collect(),
    }
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

#[async_trait]
impl GameApi for HttpGameApi {
    fn is_closed(&self) -> bool {
        self.client.is_none()
    }

    async fn connect(&mut self) -> Result<()> {
        // Dropping the old client closes its pooled proxy connections
        self.client = None;
        self.token = None;
        self.client = Some(self.build_client()?);
        debug!(
            "{} | Transport ready (proxy: {})",
            self.session_name,
            self.proxy
                .as_ref()
                .map(|p| p.redacted())
                .unwrap_or_else(|| "direct".to_string())
        );
        Ok(())
    }

    async fn close(&mut self) {
        self.client = None;
        self.token = None;
    }

    async fn bootstrap(&self) -> Result<()> {
        let Some(url) = &self.bootstrap_url else {
            return Ok(());
        };
        let response = self
            .client("bootstrap")?
            .get(url)
            .send()
            .await
            .context("Bootstrap request failed")?;
        if !response.status().is_success() {
            return Err(status_error("bootstrap", response.status(), response).await.into());
        }
        Ok(())
    }

    async fn authenticate(&self) -> Result<String> {
        let endpoint = "/auth/auth-by-telegram-webapp";
        let body = json!({ "initDataRaw": self.init_data.as_str() });
        let response = self.send(endpoint, body).await?;
        let status = response.status();

        if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY
        ) {
            let err = status_error(endpoint, status, response).await;
            return Err(SessionError::invalid(&self.session_name, err.to_string()).into());
        }
        if !status.is_success() {
            return Err(status_error(endpoint, status, response).await.into());
        }

        let auth: AuthResponse = response.json().await.map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        match auth.auth_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(SessionError::invalid(&self.session_name, "auth response has no token").into()),
        }
    }

    fn set_bearer(&mut self, token: &str) {
        self.token = Some(Zeroizing::new(token.to_string()));
    }

    async fn fetch_me(&self) -> Result<()> {
        let _: Value = self.post_json("/auth/me-telegram", json!({})).await?;
        Ok(())
    }

    async fn fetch_config(&self) -> Result<GameConfig> {
        self.post_json("/clicker/config", json!({})).await
    }

    async fn fetch_profile(&self) -> Result<ProfileSnapshot> {
        let response: ClickerUserResponse = self.post_json("/clicker/sync", json!({})).await?;
        Ok(response.clicker_user)
    }

    async fn fetch_upgrades(&self) -> Result<UpgradesForBuy> {
        self.post_json("/clicker/upgrades-for-buy", json!({})).await
    }

    async fn fetch_combo_cards(&self) -> Result<ComboCards> {
        let endpoint = "combo source";
        let response = self
            .client(endpoint)?
            .get(&self.combo_source_url)
            .send()
            .await
            .context("Combo source request failed")?;
        if !response.status().is_success() {
            return Err(status_error(endpoint, response.status(), response).await.into());
        }
        response.json().await.map_err(|e| {
            ApiError::Decode {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    async fn purchase_upgrade(&self, upgrade_id: &str) -> Result<PurchaseOutcome> {
        let endpoint = "/clicker/buy-upgrade";
        let body = json!({ "upgradeId": upgrade_id, "timestamp": now_ts() });
        let response = self.send(endpoint, body).await?;
        let status = response.status();

        if status.is_client_error() {
            let err = status_error(endpoint, status, response).await;
            warn!("{} | Purchase of {} rejected: {}", self.session_name, upgrade_id, err);
            return Ok(PurchaseOutcome::default());
        }
        if !status.is_success() {
            return Err(status_error(endpoint, status, response).await.into());
        }

        let parsed: BuyUpgradeResponse = response.json().await.map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        Ok(PurchaseOutcome {
            success: true,
            catalog: parsed.upgrades_for_buy,
        })
    }

    async fn claim_combo(&self) -> Result<bool> {
        self.post_flag("/clicker/claim-daily-combo", json!({})).await
    }

    async fn fetch_tasks(&self) -> Result<Vec<DailyTask>> {
        let response: TasksResponse = self.post_json("/clicker/list-tasks", json!({})).await?;
        Ok(response.tasks)
    }

    async fn claim_daily_task(&self) -> Result<bool> {
        let endpoint = "/clicker/check-task";
        let response = self.send(endpoint, json!({ "taskId": "streak_days" })).await?;
        let status = response.status();
        if status.is_client_error() {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(status_error(endpoint, status, response).await.into());
        }
        let checked: CheckTaskResponse = response.json().await.map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        Ok(checked.task.is_completed)
    }

    async fn claim_cipher(&self, decoded: &str) -> Result<bool> {
        self.post_flag("/clicker/claim-daily-cipher", json!({ "cipher": decoded }))
            .await
    }

    async fn fetch_boosts(&self) -> Result<Vec<Boost>> {
        let response: BoostsResponse = self.post_json("/clicker/boosts-for-buy", json!({})).await?;
        Ok(response.boosts_for_buy)
    }

    async fn apply_boost(&self, boost_id: &str) -> Result<bool> {
        self.post_flag(
            "/clicker/buy-boost",
            json!({ "boostId": boost_id, "timestamp": now_ts() }),
        )
        .await
    }

    async fn select_exchange(&self, exchange_id: &str) -> Result<bool> {
        self.post_flag("/clicker/select-exchange", json!({ "exchangeId": exchange_id }))
            .await
    }

    async fn submit_taps(&self, available_energy: i64, taps: u64) -> Result<ProfileSnapshot> {
        let body = json!({
            "count": taps,
            "availableTaps": available_energy,
            "timestamp": now_ts(),
        });
        let response: ClickerUserResponse = self.post_json("/clicker/tap", body).await?;
        Ok(response.clicker_user)
    }
}
