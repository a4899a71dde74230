//! Hamster Tapper - multi-account automation for a tap-to-earn mini-game
//!
//! Each account gets its own worker that keeps its session fresh, taps in
//! randomized batches, spends coins on the best-value upgrades and collects
//! the daily bonuses. Accounts run concurrently and share nothing but the
//! immutable configuration.
//!
//! # Architecture
//!
//! - **[`SessionManager`]**: token freshness and transport rebuilds
//! - **[`GameState`]**: local snapshot of profile, catalog and combo
//! - **[`planner`]**: greedy upgrade selection and the purchase routine
//! - **[`combo`]**: daily combo window, planning and claim
//! - **[`taps`]**: tap batches and the energy-exhaustion policy
//! - **[`bonus`]**: daily reward, cipher and exchange selection
//! - **[`Tapper`]**: the per-account loop, run as a [`core_logic::Worker`]
//!
//! The game backend is reached only through the [`GameApi`] trait.
//! [`HttpGameApi`] is the reqwest implementation.
//!
//! # Quick Start
//!
//! ```bash
//! # Run every account in config/accounts.toml
//! cargo run -p hamster-tapper --bin hamster-tapper
//!
//! # Show configured accounts and their proxies
//! cargo run -p hamster-tapper --bin hamster-tapper -- list
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use hamster_tapper::{HttpGameApi, Tapper, TapperConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use zeroize::Zeroizing;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Arc::new(TapperConfig::from_path("config/config.toml")?);
//! let api = HttpGameApi::new("main", &config, Zeroizing::new("query_id=...".into()), None);
//! let tapper = Tapper::new("main", config, api);
//! let stats = tapper.run(CancellationToken::new()).await?;
//! println!("{} cycles", stats.success);
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod api;
pub mod bonus;
pub mod cipher;
pub mod combo;
pub mod config;
pub mod models;
pub mod pacing;
pub mod planner;
pub mod proxy_check;
pub mod session;
pub mod state;
pub mod tapper;
pub mod taps;
pub mod utils;

pub use accounts::{Account, AccountStore};
pub use api::{ApiError, GameApi, HttpGameApi};
pub use config::{Bounds, TapperConfig};
pub use pacing::{Pacer, StopRequested};
pub use planner::select_best_upgrade;
pub use session::SessionManager;
pub use state::GameState;
pub use tapper::{Tapper, TapperState, Turbo, TurboSwitch};
