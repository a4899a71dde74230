//! Upgrade Planner - greedy value-density purchasing
//!
//! # Selection
//!
//! A card is a candidate when it is structurally purchasable (see
//! [`is_purchasable`]) and passes the economic filters:
//!
//! - `level <= max_level` from the config
//! - `profit_per_hour_delta > 0`
//! - `price < max_upgrade_price`
//! - `price < 5 * income_per_hour`
//! - `(balance - balance_to_save) * 0.7 >= price`
//!
//! Among candidates the highest `profit / max(price, 1)` wins; equal
//! densities fall back to the smaller id so the choice is stable.
//!
//! # Routine
//!
//! [`run_upgrades`] buys up to `upgrades_count` cards per cycle, projecting
//! each purchase into the [`GameState`] and excluding cards the server
//! rejected for the rest of the cycle.

use crate::api::GameApi;
use crate::config::TapperConfig;
use crate::models::Upgrade;
use crate::pacing::Pacer;
use crate::state::GameState;
use crate::utils::format_coins;
use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Share of disposable coins a single purchase may use, as a ratio of
/// `SPEND_NUMERATOR / SPEND_DENOMINATOR` (0.7).
pub const SPEND_NUMERATOR: i128 = 7;
pub const SPEND_DENOMINATOR: i128 = 10;

/// A card may cost at most this many hours of passive income.
pub const INCOME_PRICE_MULTIPLIER: i64 = 5;

/// Structural eligibility, independent of budget.
pub fn is_purchasable(upgrade: &Upgrade) -> bool {
    upgrade.is_available
        && !upgrade.is_expired
        && upgrade.cooldown_seconds == 0
        && upgrade.level <= upgrade.own_max_level()
        && !upgrade.needs_channel_subscription()
}

/// True when `(balance - reserve) * 0.7 >= price`.
pub fn within_spend_limit(price: i64, balance: i64, reserve: i64) -> bool {
    let disposable = balance as i128 - reserve as i128;
    disposable * SPEND_NUMERATOR >= price as i128 * SPEND_DENOMINATOR
}

pub fn is_candidate(
    upgrade: &Upgrade,
    balance: i64,
    income_per_hour: i64,
    config: &TapperConfig,
) -> bool {
    is_purchasable(upgrade)
        && upgrade.level <= config.max_level
        && upgrade.profit_per_hour_delta > 0
        && upgrade.price < config.max_upgrade_price
        && upgrade.price < income_per_hour.saturating_mul(INCOME_PRICE_MULTIPLIER)
        && within_spend_limit(upgrade.price, balance, config.balance_to_save)
}

pub fn value_density(upgrade: &Upgrade) -> f64 {
    upgrade.profit_per_hour_delta as f64 / upgrade.price.max(1) as f64
}

/// Picks the candidate with the best profit per coin.
pub fn select_best_upgrade<'a, I>(
    catalog: I,
    balance: i64,
    income_per_hour: i64,
    config: &TapperConfig,
) -> Option<&'a Upgrade>
where
    I: IntoIterator<Item = &'a Upgrade>,
{
    catalog
        .into_iter()
        .filter(|u| is_candidate(u, balance, income_per_hour, config))
        .max_by(|a, b| {
            value_density(a)
                .total_cmp(&value_density(b))
                .then_with(|| b.id.cmp(&a.id))
        })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    pub purchased: u32,
    pub rejected: u32,
}

/// Runs one cycle of greedy purchases against the live API.
pub async fn run_upgrades<A: GameApi + ?Sized>(
    api: &A,
    state: &mut GameState,
    config: &TapperConfig,
    pacer: &Pacer,
    session: &str,
) -> Result<UpgradeReport> {
    let mut report = UpgradeReport::default();
    let mut rejected_ids: HashSet<String> = HashSet::new();

    for _ in 0..config.upgrades_count {
        let balance = state.balance();
        let income = state.income_per_hour();
        let candidates = state
            .catalog
            .iter()
            .filter(|u| is_candidate(u, balance, income, config))
            .count();

        let best = select_best_upgrade(
            state.catalog.iter().filter(|u| !rejected_ids.contains(&u.id)),
            balance,
            income,
            config,
        )
        .cloned();

        let Some(upgrade) = best else {
            debug!("{} | No eligible upgrade", session);
            break;
        };

        info!(
            target: "task_result",
            "{} | Sleeping {}s before upgrading {}",
            session,
            config.purchase_delay_secs,
            upgrade.id
        );
        pacer.pause(config.purchase_delay()).await?;

        let outcome = api.purchase_upgrade(&upgrade.id).await?;
        pacer.pause(config.action_delay()).await?;
        if outcome.success {
            state.apply_purchase(&upgrade, outcome.catalog);
            report.purchased += 1;
            info!(
                target: "task_result",
                "{} | Upgraded {} to level {} | +{} per hour | Money left: {}",
                session,
                upgrade.id,
                upgrade.level + 1,
                format_coins(upgrade.profit_per_hour_delta),
                format_coins(state.balance())
            );
        } else {
            report.rejected += 1;
            rejected_ids.insert(upgrade.id.clone());
            warn!("{} | Upgrade {} was rejected", session, upgrade.id);
            if report.rejected as usize >= candidates {
                debug!(
                    "{} | {} rejections with {} candidates, ending upgrade cycle",
                    session, report.rejected, candidates
                );
                break;
            }
        }
    }

    Ok(report)
}
