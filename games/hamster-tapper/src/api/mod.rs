//! API Module - capabilities the tapper needs from the game backend
//!
//! The decision loop only talks to the game through [`GameApi`]. The
//! production implementation is [`HttpGameApi`]; tests drive the loop with
//! an in-memory fake.
//!
//! # Failure model
//!
//! - Every call may fail with a transient error (network, HTTP 5xx, decode).
//! - [`GameApi::authenticate`] fails with [`core_logic::SessionError`] when the
//!   credential material cannot produce a token. That error is fatal.
//! - Calls returning `bool` report business-level rejection (already claimed,
//!   not enough coins) as `Ok(false)` rather than an error.

use crate::models::{
    Boost, ComboCards, DailyTask, GameConfig, ProfileSnapshot, PurchaseOutcome, UpgradesForBuy,
};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

pub mod http;

pub use http::HttpGameApi;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Transport closed, cannot call {endpoint}")]
    TransportClosed { endpoint: String },

    #[error("Unexpected payload from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

#[async_trait]
pub trait GameApi: Send + Sync {
    /// True when there is no live transport (never connected, or closed).
    fn is_closed(&self) -> bool;

    /// Builds a fresh transport, dropping any previous one and its proxy
    /// connections. Clears the bearer token.
    async fn connect(&mut self) -> Result<()>;

    /// Drops the transport. Idempotent.
    async fn close(&mut self);

    /// Pre-authentication handshake the web client performs.
    async fn bootstrap(&self) -> Result<()>;

    /// Exchanges the account's credential material for an access token.
    async fn authenticate(&self) -> Result<String>;

    /// Attaches the token as a bearer credential on subsequent calls.
    fn set_bearer(&mut self, token: &str);

    async fn fetch_me(&self) -> Result<()>;

    async fn fetch_config(&self) -> Result<GameConfig>;

    async fn fetch_profile(&self) -> Result<ProfileSnapshot>;

    async fn fetch_upgrades(&self) -> Result<UpgradesForBuy>;

    async fn fetch_combo_cards(&self) -> Result<ComboCards>;

    async fn purchase_upgrade(&self, upgrade_id: &str) -> Result<PurchaseOutcome>;

    async fn claim_combo(&self) -> Result<bool>;

    async fn fetch_tasks(&self) -> Result<Vec<DailyTask>>;

    async fn claim_daily_task(&self) -> Result<bool>;

    async fn claim_cipher(&self, decoded: &str) -> Result<bool>;

    async fn fetch_boosts(&self) -> Result<Vec<Boost>>;

    async fn apply_boost(&self, boost_id: &str) -> Result<bool>;

    async fn select_exchange(&self, exchange_id: &str) -> Result<bool>;

    /// Sends one batch of taps; the returned profile is authoritative.
    async fn submit_taps(&self, available_energy: i64, taps: u64) -> Result<ProfileSnapshot>;
}
