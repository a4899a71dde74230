//! Tapper - the per-account decision loop
//!
//! Each account runs one [`Tapper`] as a [`Worker`]. The loop is a small
//! state machine:
//!
//! ```text
//! RefreshingSession -> SyncingState -> Planning -> Tapping -> Sleeping
//!        ^                                                       |
//!        +-------------------------------------------------------+
//! ```
//!
//! `SyncingState` only runs after a new token was issued or after a failed
//! cycle. Bonus claims run once per token. Any error other than an invalid
//! session is logged, counted and followed by a bounded backoff, after which
//! the loop starts over and re-syncs. An invalid session moves to `Fatal`
//! and ends this account's run.

use crate::api::GameApi;
use crate::bonus::{self, best_effort};
use crate::combo;
use crate::config::TapperConfig;
use crate::models::GameConfig;
use crate::pacing::{is_stop_requested, Pacer};
use crate::planner;
use crate::session::SessionManager;
use crate::state::GameState;
use crate::taps::{self, EnergyAction};
use crate::utils::format_coins;
use anyhow::Result;
use async_trait::async_trait;
use core_logic::{is_fatal_session_error, is_transient_error, RetryConfig, Worker, WorkerStats};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapperState {
    RefreshingSession,
    SyncingState,
    Planning,
    Tapping,
    Sleeping(Duration),
    Fatal,
}

/// Turbo mode timer. Once activated it stays on for a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct Turbo {
    duration: Duration,
    active_until: Option<Instant>,
}

impl Turbo {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            active_until: None,
        }
    }

    pub fn activate(&mut self, now: Instant) {
        self.active_until = Some(now + self.duration);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.active_until.is_some_and(|until| now < until)
    }

    /// Clears an elapsed timer. Returns `true` when turbo just ended.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.active_until {
            Some(until) if now >= until => {
                self.active_until = None;
                true
            }
            _ => false,
        }
    }
}

/// Handle for switching turbo on from outside the loop.
#[derive(Debug, Clone, Default)]
pub struct TurboSwitch(Arc<AtomicBool>);

impl TurboSwitch {
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Everything one run of the loop owns besides the transport.
struct Cycle {
    session: SessionManager,
    state: GameState,
    game_config: GameConfig,
    turbo: Turbo,
    needs_sync: bool,
    bonuses_due: bool,
    stats: WorkerStats,
}

pub struct Tapper<A: GameApi> {
    name: String,
    config: Arc<TapperConfig>,
    api: Mutex<A>,
    turbo_switch: TurboSwitch,
}

impl<A: GameApi> Tapper<A> {
    pub fn new(name: impl Into<String>, config: Arc<TapperConfig>, api: A) -> Self {
        Self {
            name: name.into(),
            config,
            api: Mutex::new(api),
            turbo_switch: TurboSwitch::default(),
        }
    }

    pub fn turbo_switch(&self) -> TurboSwitch {
        self.turbo_switch.clone()
    }

    fn error_backoff(&self) -> RetryConfig {
        let base_ms = self.config.error_retry_delay_secs.max(1) * 1000;
        let max_ms = self.config.error_retry_max_delay_secs.max(1) * 1000;
        RetryConfig::new(u32::MAX, base_ms)
            .with_max_delay(max_ms.max(base_ms))
            .without_jitter()
    }

    /// Runs the loop until cancelled or the session turns out invalid.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<WorkerStats> {
        let pacer = Pacer::new(cancellation_token);
        let backoff = self.error_backoff();
        let mut api = self.api.lock().await;
        let mut cycle = Cycle {
            session: SessionManager::new(&self.name),
            state: GameState::default(),
            game_config: GameConfig::default(),
            turbo: Turbo::new(self.config.turbo_duration()),
            needs_sync: true,
            bonuses_due: true,
            stats: WorkerStats::default(),
        };

        let mut phase = TapperState::RefreshingSession;
        let mut consecutive_failures: u32 = 0;
        let mut fatal = None;

        while !pacer.is_stopped() && phase != TapperState::Fatal {
            match self.step(&mut *api, &mut cycle, &pacer, phase).await {
                Ok(next) => {
                    if next == TapperState::RefreshingSession {
                        consecutive_failures = 0;
                    }
                    phase = next;
                }
                Err(e) if is_stop_requested(&e) => break,
                Err(e) if is_fatal_session_error(&e) => {
                    error!(target: "task_result", "{} | Invalid session: {:#}", self.name, e);
                    cycle.stats.record(false);
                    phase = TapperState::Fatal;
                    fatal = Some(e);
                }
                Err(e) => {
                    cycle.stats.record(false);
                    let delay = backoff.delay_for_attempt(consecutive_failures);
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    if is_transient_error(&e) {
                        warn!(
                            target: "task_result",
                            "{} | Network error: {:#} | Retrying in {}s",
                            self.name,
                            e,
                            delay.as_secs()
                        );
                    } else {
                        error!(
                            target: "task_result",
                            "{} | Unknown error: {:#} | Retrying in {}s",
                            self.name,
                            e,
                            delay.as_secs()
                        );
                    }
                    cycle.needs_sync = true;
                    if pacer.pause(delay).await.is_err() {
                        break;
                    }
                    phase = TapperState::RefreshingSession;
                }
            }
        }

        api.close().await;
        info!(
            target: "task_result",
            "{} | Stopped | Cycles: {} | Errors: {}",
            self.name, cycle.stats.success, cycle.stats.failed
        );
        match fatal {
            Some(e) => Err(e),
            None => Ok(cycle.stats),
        }
    }

    async fn step(
        &self,
        api: &mut A,
        cycle: &mut Cycle,
        pacer: &Pacer,
        phase: TapperState,
    ) -> Result<TapperState> {
        let config = self.config.as_ref();
        let name = self.name.as_str();

        match phase {
            TapperState::RefreshingSession => {
                pacer.checkpoint()?;
                if cycle.session.ensure_fresh_session(api).await? {
                    cycle.needs_sync = true;
                    cycle.bonuses_due = true;
                }
                Ok(if cycle.needs_sync {
                    TapperState::SyncingState
                } else {
                    TapperState::Planning
                })
            }

            TapperState::SyncingState => {
                pacer.checkpoint()?;
                if cycle.bonuses_due {
                    api.fetch_me().await?;
                    cycle.game_config = api.fetch_config().await?;
                }
                let profile = api.fetch_profile().await?;
                let upgrades = api.fetch_upgrades().await?;
                cycle.state = GameState::from_sync(profile, upgrades);
                cycle.needs_sync = false;

                info!(
                    target: "task_result",
                    "{} | Last passive earn: +{} | Earn every hour: {}",
                    name,
                    format_coins(cycle.state.profile.last_passive_earn),
                    format_coins(cycle.state.income_per_hour())
                );
                Ok(TapperState::Planning)
            }

            TapperState::Planning => {
                if cycle.bonuses_due {
                    self.claim_bonuses(api, cycle, pacer).await?;
                    cycle.bonuses_due = false;
                }

                let turbo_active = cycle.turbo.is_active(Instant::now());
                if config.auto_upgrade && !turbo_active {
                    planner::run_upgrades(&*api, &mut cycle.state, config, pacer, name).await?;
                }
                Ok(TapperState::Tapping)
            }

            TapperState::Tapping => {
                let now = Instant::now();
                if self.turbo_switch.take() {
                    cycle.turbo.activate(now);
                    info!(target: "task_result", "{} | Turbo activated", name);
                }
                if cycle.turbo.tick(now) {
                    info!(target: "task_result", "{} | Turbo expired", name);
                }
                let turbo_active = cycle.turbo.is_active(now);

                pacer.checkpoint()?;
                taps::tap_once(&*api, &mut cycle.state, config, turbo_active, name).await?;
                cycle.stats.record(true);

                if turbo_active {
                    return Ok(TapperState::Sleeping(config.turbo_sleep()));
                }

                match taps::handle_energy(api, &mut cycle.state, config, pacer, name).await? {
                    EnergyAction::Continue => {
                        let sleep = config
                            .sleep_between_tap
                            .sample_secs(&mut rand::thread_rng());
                        debug!("{} | Sleeping {}s until next taps", name, sleep.as_secs());
                        Ok(TapperState::Sleeping(sleep))
                    }
                    EnergyAction::Refilled => Ok(TapperState::Tapping),
                    EnergyAction::Sleep(sleep) => {
                        cycle.session.invalidate();
                        cycle.needs_sync = true;
                        Ok(TapperState::Sleeping(sleep))
                    }
                }
            }

            TapperState::Sleeping(duration) => {
                pacer.pause(duration).await?;
                Ok(TapperState::RefreshingSession)
            }

            TapperState::Fatal => {
                anyhow::bail!("{} | Tapper already stopped on an invalid session", name)
            }
        }
    }

    /// Combo, daily reward, cipher and exchange. Each one is best-effort.
    async fn claim_bonuses(&self, api: &mut A, cycle: &mut Cycle, pacer: &Pacer) -> Result<()> {
        let config = self.config.as_ref();
        let name = self.name.as_str();

        if config.auto_claim_combo {
            let result = combo::run_daily_combo(
                &*api,
                &mut cycle.state,
                config,
                pacer,
                name,
                chrono::Utc::now(),
            )
            .await;
            best_effort(name, "Daily combo", result)?;
        }

        if config.auto_claim_daily {
            let result = bonus::claim_daily_task(&*api, pacer, name).await;
            best_effort(name, "Daily reward", result)?;
            pacer.pause(config.action_delay()).await?;
        }

        if config.auto_claim_cipher {
            let result =
                bonus::claim_daily_cipher(&*api, &mut cycle.game_config, pacer, name).await;
            best_effort(name, "Daily cipher", result)?;
            pacer.pause(config.action_delay()).await?;
        }

        let result = bonus::select_default_exchange(
            &*api,
            &mut cycle.state,
            &config.default_exchange,
            pacer,
            name,
        )
        .await;
        best_effort(name, "Exchange selection", result)?;
        Ok(())
    }
}

#[async_trait]
impl<A: GameApi + 'static> Worker for Tapper<A> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, cancellation_token: CancellationToken) -> Result<WorkerStats> {
        self.run(cancellation_token).await
    }

    async fn stop(&self) -> Result<()> {
        self.api.lock().await.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_turbo_lasts_configured_duration() {
        let mut turbo = Turbo::new(Duration::from_secs(20));
        let start = Instant::now();
        assert!(!turbo.is_active(start));

        turbo.activate(start);
        assert!(turbo.is_active(start));
        assert!(!turbo.tick(start + Duration::from_secs(19)));
        assert!(turbo.is_active(start + Duration::from_secs(19)));

        assert!(turbo.tick(start + Duration::from_secs(20)));
        assert!(!turbo.is_active(start + Duration::from_secs(20)));
        assert!(!turbo.tick(start + Duration::from_secs(21)));
    }

    #[test]
    fn test_turbo_switch_is_consumed_once() {
        let switch = TurboSwitch::default();
        let remote = switch.clone();
        assert!(!switch.take());
        remote.trigger();
        assert!(switch.take());
        assert!(!switch.take());
    }
}
