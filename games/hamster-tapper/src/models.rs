//! Game state as reported by the API.
//!
//! Field names follow the game's JSON (camelCase). Coin amounts arrive as
//! floats and are truncated to whole coins on the way in.

use serde::{Deserialize, Deserializer};

/// Boost that refills energy to the maximum.
pub const ENERGY_REFILL_BOOST: &str = "BoostFullAvailableTaps";

/// Unlock condition that cannot be met by API calls alone.
pub const SUBSCRIBE_CHANNEL_CONDITION: &str = "SubscribeTelegramChannel";

fn de_coins<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.trunc() as i64)
}

fn de_opt_coins<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.map(|v| v.trunc() as i64).unwrap_or(0))
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    #[serde(rename = "balanceCoins", default, deserialize_with = "de_opt_coins")]
    pub balance: i64,
    #[serde(rename = "totalCoins", default, deserialize_with = "de_opt_coins")]
    pub total_earned: i64,
    #[serde(
        rename = "earnPassivePerHour",
        default,
        deserialize_with = "de_opt_coins"
    )]
    pub passive_income_per_hour: i64,
    #[serde(rename = "availableTaps", default, deserialize_with = "de_opt_coins")]
    pub available_energy: i64,
    #[serde(default, deserialize_with = "de_opt_coins")]
    pub last_passive_earn: i64,
    #[serde(default)]
    pub exchange_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnlockCondition {
    #[serde(rename = "_type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    pub id: String,
    #[serde(default)]
    pub level: u32,
    #[serde(deserialize_with = "de_coins")]
    pub price: i64,
    #[serde(default, deserialize_with = "de_opt_coins")]
    pub profit_per_hour_delta: i64,
    #[serde(default)]
    pub max_level: Option<u32>,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub is_expired: bool,
    #[serde(default)]
    pub cooldown_seconds: u64,
    #[serde(default)]
    pub condition: Option<UnlockCondition>,
}

impl Upgrade {
    /// Card's own level cap; cards without one are capped at their current level.
    pub fn own_max_level(&self) -> u32 {
        self.max_level.unwrap_or(self.level)
    }

    pub fn needs_channel_subscription(&self) -> bool {
        self.condition
            .as_ref()
            .is_some_and(|c| c.kind == SUBSCRIBE_CHANNEL_CONDITION)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCombo {
    /// Cards already bought toward today's combo
    #[serde(default)]
    pub upgrade_ids: Vec<String>,
    #[serde(default, deserialize_with = "de_opt_coins")]
    pub bonus_coins: i64,
    #[serde(default)]
    pub is_claimed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradesForBuy {
    #[serde(default)]
    pub upgrades_for_buy: Vec<Upgrade>,
    #[serde(default)]
    pub daily_combo: Option<DailyCombo>,
}

/// Today's combo as published by the combo source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComboCards {
    pub combo: Vec<String>,
    /// `dd-mm-yy`
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PurchaseOutcome {
    pub success: bool,
    /// Catalog returned with the purchase, replacing the local one when present
    pub catalog: Option<Vec<Upgrade>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayReward {
    pub days: u32,
    #[serde(default, deserialize_with = "de_opt_coins")]
    pub reward_coins: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTask {
    pub id: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub days: u32,
    #[serde(default)]
    pub rewards_by_days: Vec<DayReward>,
}

impl DailyTask {
    /// Reward for the current streak day, if the schedule covers it.
    pub fn current_reward(&self) -> Option<i64> {
        let index = self.days.checked_sub(1)? as usize;
        self.rewards_by_days.get(index).map(|r| r.reward_coins)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCipher {
    #[serde(default)]
    pub cipher: String,
    #[serde(default, deserialize_with = "de_opt_coins")]
    pub bonus_coins: i64,
    #[serde(default)]
    pub is_claimed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    #[serde(default)]
    pub daily_cipher: Option<DailyCipher>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boost {
    pub id: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub max_level: u32,
    #[serde(default)]
    pub cooldown_seconds: u64,
}

impl Boost {
    pub fn is_ready(&self) -> bool {
        self.cooldown_seconds == 0 && self.level <= self.max_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_truncates_float_coins() {
        let profile: ProfileSnapshot = serde_json::from_value(json!({
            "balanceCoins": 1534.987,
            "totalCoins": 99999.5,
            "earnPassivePerHour": 0,
            "availableTaps": 500,
            "lastPassiveEarn": 12.3,
            "exchangeId": null
        }))
        .unwrap();

        assert_eq!(profile.balance, 1534);
        assert_eq!(profile.total_earned, 99999);
        assert_eq!(profile.available_energy, 500);
        assert_eq!(profile.last_passive_earn, 12);
        assert!(profile.exchange_id.is_none());
    }

    #[test]
    fn test_upgrade_without_max_level_caps_at_current() {
        let upgrade: Upgrade = serde_json::from_value(json!({
            "id": "ceo",
            "level": 3,
            "price": 1000,
            "profitPerHourDelta": 50,
            "isAvailable": true,
            "isExpired": false
        }))
        .unwrap();

        assert_eq!(upgrade.own_max_level(), 3);
        assert_eq!(upgrade.cooldown_seconds, 0);
        assert!(!upgrade.needs_channel_subscription());
    }

    #[test]
    fn test_subscribe_condition_detected() {
        let upgrade: Upgrade = serde_json::from_value(json!({
            "id": "tg_channel",
            "level": 1,
            "price": 10,
            "condition": {"_type": "SubscribeTelegramChannel", "channelId": 1}
        }))
        .unwrap();
        assert!(upgrade.needs_channel_subscription());
    }

    #[test]
    fn test_daily_task_reward_for_day() {
        let task: DailyTask = serde_json::from_value(json!({
            "id": "streak_days",
            "isCompleted": false,
            "days": 2,
            "rewardsByDays": [
                {"days": 1, "rewardCoins": 500},
                {"days": 2, "rewardCoins": 1000}
            ]
        }))
        .unwrap();
        assert_eq!(task.current_reward(), Some(1000));

        let day_zero = DailyTask { days: 0, ..task };
        assert_eq!(day_zero.current_reward(), None);
    }
}
