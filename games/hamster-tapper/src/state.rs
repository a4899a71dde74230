//! State Snapshot - local view of the account between API calls
//!
//! The snapshot is only mutated after a call returns. Purchases are projected
//! locally (balance down, income up) to save a round trip; tap responses are
//! authoritative and overwrite the projection.

use crate::models::{DailyCombo, ProfileSnapshot, Upgrade, UpgradesForBuy};

/// Income assumed when the server reports zero, so a fresh account still
/// gets a non-zero affordability ceiling in the planner.
pub const DEFAULT_INCOME_PER_HOUR: i64 = 100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameState {
    pub profile: ProfileSnapshot,
    pub catalog: Vec<Upgrade>,
    pub combo: Option<DailyCombo>,
}

impl GameState {
    pub fn from_sync(profile: ProfileSnapshot, upgrades: UpgradesForBuy) -> Self {
        Self {
            profile,
            catalog: upgrades.upgrades_for_buy,
            combo: upgrades.daily_combo,
        }
    }

    pub fn balance(&self) -> i64 {
        self.profile.balance
    }

    pub fn income_per_hour(&self) -> i64 {
        self.profile.passive_income_per_hour
    }

    pub fn available_energy(&self) -> i64 {
        self.profile.available_energy
    }

    /// Replaces the profile with the server's tap response.
    ///
    /// Returns the balance change for logging.
    pub fn apply_tap_result(&mut self, server: ProfileSnapshot) -> i64 {
        let delta = server.balance - self.profile.balance;
        let exchange_id = self.profile.exchange_id.take();

        self.profile = server;
        if self.profile.exchange_id.is_none() {
            self.profile.exchange_id = exchange_id;
        }
        if self.profile.passive_income_per_hour == 0 {
            self.profile.passive_income_per_hour = DEFAULT_INCOME_PER_HOUR;
        }
        delta
    }

    /// Projects a successful purchase and swaps in the returned catalog.
    pub fn apply_purchase(&mut self, upgrade: &Upgrade, catalog: Option<Vec<Upgrade>>) {
        self.profile.balance -= upgrade.price;
        self.profile.passive_income_per_hour += upgrade.profit_per_hour_delta;
        if let Some(catalog) = catalog {
            self.catalog = catalog;
        }
    }

    pub fn mark_combo_bought(&mut self, upgrade_id: &str) {
        if let Some(combo) = self.combo.as_mut() {
            if !combo.upgrade_ids.iter().any(|id| id == upgrade_id) {
                combo.upgrade_ids.push(upgrade_id.to_string());
            }
        }
    }

    pub fn mark_combo_claimed(&mut self) {
        if let Some(combo) = self.combo.as_mut() {
            combo.is_claimed = true;
        }
    }

    pub fn set_exchange(&mut self, exchange_id: &str) {
        self.profile.exchange_id = Some(exchange_id.to_string());
    }
}
