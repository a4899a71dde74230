//! Tap/Energy Cycle
//!
//! One batch of taps per call. The server's answer replaces the local
//! profile. When energy drops below the configured floor the worker either
//! spends the free refill boost or closes its transport and sleeps.

use crate::api::GameApi;
use crate::config::TapperConfig;
use crate::models::ENERGY_REFILL_BOOST;
use crate::pacing::Pacer;
use crate::state::GameState;
use crate::utils::{format_coins, format_delta};
use anyhow::Result;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info};

/// Random batch size, plus the turbo bonus, never above available energy.
pub fn roll_tap_count<R: Rng + ?Sized>(
    rng: &mut R,
    config: &TapperConfig,
    turbo_active: bool,
    available_energy: i64,
) -> u64 {
    let mut taps = config.random_taps_count.sample(rng);
    if turbo_active {
        taps = taps.saturating_add(config.add_taps_on_turbo);
    }
    taps.min(available_energy.max(0) as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapReport {
    pub taps: u64,
    pub balance_delta: i64,
}

/// Submits one batch and folds the server's profile into `state`.
pub async fn tap_once<A: GameApi + ?Sized>(
    api: &A,
    state: &mut GameState,
    config: &TapperConfig,
    turbo_active: bool,
    session: &str,
) -> Result<TapReport> {
    let energy = state.available_energy();
    let taps = roll_tap_count(&mut rand::thread_rng(), config, turbo_active, energy);

    let profile = api.submit_taps(energy, taps).await?;
    let balance_delta = state.apply_tap_result(profile);

    info!(
        target: "task_result",
        "{} | Tapped {} | Balance: {} ({}) | Total: {} | Energy: {}",
        session,
        taps,
        format_coins(state.balance()),
        format_delta(balance_delta),
        format_coins(state.profile.total_earned),
        state.available_energy()
    );

    Ok(TapReport {
        taps,
        balance_delta,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyAction {
    /// Energy is above the floor
    Continue,
    /// The refill boost was applied; keep tapping
    Refilled,
    /// Transport closed; sleep this long, then re-authenticate
    Sleep(Duration),
}

/// Applies the energy-exhaustion policy.
pub async fn handle_energy<A: GameApi + ?Sized>(
    api: &mut A,
    state: &mut GameState,
    config: &TapperConfig,
    pacer: &Pacer,
    session: &str,
) -> Result<EnergyAction> {
    if state.available_energy() >= config.min_available_energy {
        return Ok(EnergyAction::Continue);
    }

    if config.apply_daily_energy {
        pacer.checkpoint()?;
        let boosts = api.fetch_boosts().await?;
        let refill = boosts
            .iter()
            .find(|b| b.id == ENERGY_REFILL_BOOST && b.is_ready());

        if let Some(boost) = refill {
            debug!("{} | Applying {}", session, boost.id);
            pacer.pause(config.purchase_delay()).await?;
            if api.apply_boost(&boost.id).await? {
                info!(target: "task_result", "{} | Energy refilled", session);
                let profile = api.fetch_profile().await?;
                state.apply_tap_result(profile);
                pacer.pause(config.action_delay()).await?;
                return Ok(EnergyAction::Refilled);
            }
            debug!("{} | Energy refill was rejected", session);
        }
    }

    api.close().await;
    let sleep = config
        .sleep_by_min_energy
        .sample_secs(&mut rand::thread_rng());
    info!(
        target: "task_result",
        "{} | Minimum energy reached: {} | Sleeping {}s",
        session,
        state.available_energy(),
        sleep.as_secs()
    );
    Ok(EnergyAction::Sleep(sleep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> TapperConfig {
        TapperConfig {
            random_taps_count: Bounds::new(50, 200),
            add_taps_on_turbo: 2_500,
            ..Default::default()
        }
    }

    #[test]
    fn test_roll_within_configured_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let taps = roll_tap_count(&mut rng, &config(), false, 10_000);
            assert!((50..=200).contains(&taps));
        }
    }

    #[test]
    fn test_turbo_adds_bonus() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let taps = roll_tap_count(&mut rng, &config(), true, 100_000);
            assert!((2_550..=2_700).contains(&taps));
        }
    }

    #[test]
    fn test_roll_clamped_to_energy() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(roll_tap_count(&mut rng, &config(), true, 30), 30);
        assert_eq!(roll_tap_count(&mut rng, &config(), false, 0), 0);
        assert_eq!(roll_tap_count(&mut rng, &config(), false, -5), 0);
    }
}
