//! Daily combo: buy every card of today's combo, then claim the bonus.
//!
//! The combo source publishes the cards together with a `dd-mm-yy` date. A
//! round is valid for 24 hours starting at `combo_start_hour` on that date in
//! `combo_timezone`. Nothing is bought unless the whole remaining set can be
//! bought now for less than the bonus.

use crate::api::GameApi;
use crate::config::TapperConfig;
use crate::models::{ComboCards, Upgrade};
use crate::pacing::Pacer;
use crate::planner::is_purchasable;
use crate::state::GameState;
use crate::utils::format_coins;
use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use tracing::{debug, info, warn};

pub const COMBO_DATE_FORMAT: &str = "%d-%m-%y";

/// Half-open `[start, end)` interval a combo round is valid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ComboWindow {
    pub fn from_date(date: &str, start_hour: u32, tz: Tz) -> Result<Self, ComboSkip> {
        let day = NaiveDate::parse_from_str(date.trim(), COMBO_DATE_FORMAT)
            .map_err(|_| ComboSkip::InvalidDate(date.to_string()))?;
        let local = day
            .and_hms_opt(start_hour, 0, 0)
            .ok_or_else(|| ComboSkip::InvalidDate(date.to_string()))?;
        let start = tz
            .from_local_datetime(&local)
            .earliest()
            .ok_or_else(|| ComboSkip::InvalidDate(date.to_string()))?
            .with_timezone(&Utc);

        Ok(Self {
            start,
            end: start + ChronoDuration::hours(24),
        })
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }
}

/// Why a combo round was left alone. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComboSkip {
    NoCombo,
    AlreadyClaimed,
    InvalidDate(String),
    OutsideWindow,
    UnknownCard(String),
    NotPurchasable(String),
    NotProfitable { cost: i64, bonus: i64 },
    NotAffordable { cost: i64, balance: i64 },
}

impl fmt::Display for ComboSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComboSkip::NoCombo => write!(f, "no combo in catalog"),
            ComboSkip::AlreadyClaimed => write!(f, "already claimed"),
            ComboSkip::InvalidDate(date) => write!(f, "unreadable combo date '{}'", date),
            ComboSkip::OutsideWindow => write!(f, "outside the combo window"),
            ComboSkip::UnknownCard(id) => write!(f, "card {} is not in the catalog", id),
            ComboSkip::NotPurchasable(id) => write!(f, "card {} cannot be bought now", id),
            ComboSkip::NotProfitable { cost, bonus } => write!(
                f,
                "cost {} is not below bonus {}",
                format_coins(*cost),
                format_coins(*bonus)
            ),
            ComboSkip::NotAffordable { cost, balance } => write!(
                f,
                "cost {} exceeds balance {}",
                format_coins(*cost),
                format_coins(*balance)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComboPlan {
    /// Cards still missing from today's combo, in combo order
    pub cards: Vec<Upgrade>,
    pub total_cost: i64,
    pub bonus: i64,
}

/// Decides whether today's combo is worth completing right now.
pub fn plan_combo(
    cards: &ComboCards,
    state: &GameState,
    now: DateTime<Utc>,
    config: &TapperConfig,
) -> Result<ComboPlan, ComboSkip> {
    let combo = state.combo.as_ref().ok_or(ComboSkip::NoCombo)?;
    if combo.is_claimed {
        return Err(ComboSkip::AlreadyClaimed);
    }

    let tz = config
        .combo_tz()
        .map_err(|e| ComboSkip::InvalidDate(e.to_string()))?;
    let window = ComboWindow::from_date(&cards.date, config.combo_start_hour, tz)?;
    if !window.contains(now) {
        return Err(ComboSkip::OutsideWindow);
    }

    let mut required = Vec::new();
    for id in &cards.combo {
        if combo.upgrade_ids.contains(id) {
            continue;
        }
        let upgrade = state
            .catalog
            .iter()
            .find(|u| &u.id == id)
            .ok_or_else(|| ComboSkip::UnknownCard(id.clone()))?;
        if !is_purchasable(upgrade) {
            return Err(ComboSkip::NotPurchasable(id.clone()));
        }
        required.push(upgrade.clone());
    }

    let total_cost: i64 = required.iter().map(|u| u.price).sum();
    if total_cost >= combo.bonus_coins {
        return Err(ComboSkip::NotProfitable {
            cost: total_cost,
            bonus: combo.bonus_coins,
        });
    }
    if total_cost > state.balance() {
        return Err(ComboSkip::NotAffordable {
            cost: total_cost,
            balance: state.balance(),
        });
    }

    Ok(ComboPlan {
        cards: required,
        total_cost,
        bonus: combo.bonus_coins,
    })
}

/// Completes and claims today's combo when [`plan_combo`] allows it.
///
/// Returns `true` when the bonus was claimed.
pub async fn run_daily_combo<A: GameApi + ?Sized>(
    api: &A,
    state: &mut GameState,
    config: &TapperConfig,
    pacer: &Pacer,
    session: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    match state.combo.as_ref() {
        None => {
            debug!("{} | Combo skipped: {}", session, ComboSkip::NoCombo);
            return Ok(false);
        }
        Some(combo) if combo.is_claimed => {
            debug!("{} | Combo skipped: {}", session, ComboSkip::AlreadyClaimed);
            return Ok(false);
        }
        Some(_) => {}
    }

    pacer.checkpoint()?;
    let cards = api.fetch_combo_cards().await?;

    let plan = match plan_combo(&cards, state, now, config) {
        Ok(plan) => plan,
        Err(skip) => {
            info!(target: "task_result", "{} | Combo skipped: {}", session, skip);
            return Ok(false);
        }
    };

    info!(
        target: "task_result",
        "{} | Completing combo with {} cards | Cost: {} | Bonus: {}",
        session,
        plan.cards.len(),
        format_coins(plan.total_cost),
        format_coins(plan.bonus)
    );

    for card in &plan.cards {
        pacer.pause(config.purchase_delay()).await?;
        let outcome = api.purchase_upgrade(&card.id).await?;
        if !outcome.success {
            warn!("{} | Combo card {} was rejected, combo left incomplete", session, card.id);
            return Ok(false);
        }
        state.apply_purchase(card, outcome.catalog);
        state.mark_combo_bought(&card.id);
        debug!("{} | Bought combo card {}", session, card.id);
        pacer.pause(config.action_delay()).await?;
    }

    pacer.checkpoint()?;
    if !api.claim_combo().await? {
        warn!("{} | Combo claim was rejected", session);
        return Ok(false);
    }

    state.profile.balance += plan.bonus;
    state.mark_combo_claimed();
    info!(
        target: "task_result",
        "{} | Claimed daily combo | Bonus: +{}",
        session,
        format_coins(plan.bonus)
    );
    Ok(true)
}
