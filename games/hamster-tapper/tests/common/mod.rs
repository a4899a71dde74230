#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use core_logic::SessionError;
use hamster_tapper::models::{
    Boost, ComboCards, DailyCipher, DailyCombo, DailyTask, DayReward, GameConfig, ProfileSnapshot,
    PurchaseOutcome, Upgrade, UpgradesForBuy,
};
use hamster_tapper::GameApi;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// Server-side state of the fake game, shared with the test body.
#[derive(Debug, Default)]
pub struct World {
    pub calls: Vec<String>,
    pub connected: bool,
    pub bearer: Option<String>,
    pub auth_token: Option<String>,
    pub auth_count: u32,
    pub profile: ProfileSnapshot,
    pub catalog: Vec<Upgrade>,
    pub combo: Option<DailyCombo>,
    pub combo_cards: Option<ComboCards>,
    pub game_config: GameConfig,
    pub tasks: Vec<DailyTask>,
    pub boosts: Vec<Boost>,
    pub rejected_upgrades: HashSet<String>,
    /// Endpoints that fail once with a transient error, consumed in order
    pub fail_once: VecDeque<&'static str>,
    pub tap_times: Vec<Instant>,
    /// Tap count of each submitted batch, as requested
    pub tap_counts: Vec<u64>,
    /// Every recorded call with the instant it reached the server
    pub timeline: Vec<(String, Instant)>,
    /// Taps requested above the energy reported with them
    pub over_taps: u32,
}

impl World {
    fn record(&mut self, call: &str) -> Result<()> {
        self.calls.push(call.to_string());
        self.timeline.push((call.to_string(), Instant::now()));
        if self.fail_once.front().copied() == Some(call) {
            self.fail_once.pop_front();
            return Err(anyhow!("connection reset by peer during {}", call));
        }
        Ok(())
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == call).count()
    }

    pub fn times_of(&self, call: &str) -> Vec<Instant> {
        self.timeline
            .iter()
            .filter(|(c, _)| c == call)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[derive(Clone)]
pub struct FakeApi {
    pub world: Arc<Mutex<World>>,
}

impl FakeApi {
    pub fn new(world: World) -> Self {
        Self {
            world: Arc::new(Mutex::new(world)),
        }
    }

    pub fn world(&self) -> std::sync::MutexGuard<'_, World> {
        self.world.lock().unwrap()
    }
}

pub fn card(id: &str, price: i64, profit: i64) -> Upgrade {
    Upgrade {
        id: id.to_string(),
        level: 1,
        price,
        profit_per_hour_delta: profit,
        max_level: Some(10),
        is_available: true,
        is_expired: false,
        cooldown_seconds: 0,
        condition: None,
    }
}

pub fn profile(balance: i64, income: i64, energy: i64) -> ProfileSnapshot {
    ProfileSnapshot {
        balance,
        total_earned: balance,
        passive_income_per_hour: income,
        available_energy: energy,
        last_passive_earn: 0,
        exchange_id: Some("bybit".to_string()),
    }
}

pub fn open_daily_task(days: u32) -> DailyTask {
    DailyTask {
        id: "streak_days".to_string(),
        is_completed: false,
        days,
        rewards_by_days: (1..=10)
            .map(|d| DayReward {
                days: d,
                reward_coins: d as i64 * 500,
            })
            .collect(),
    }
}

pub fn cipher(encoded: &str, claimed: bool) -> GameConfig {
    GameConfig {
        daily_cipher: Some(DailyCipher {
            cipher: encoded.to_string(),
            bonus_coins: 1_000_000,
            is_claimed: claimed,
        }),
    }
}

/// A healthy account with plenty of energy and nothing else to do.
pub fn quiet_world() -> World {
    World {
        auth_token: Some("token-1".to_string()),
        profile: profile(10_000, 1_000, 1_000),
        ..Default::default()
    }
}

#[async_trait]
impl GameApi for FakeApi {
    fn is_closed(&self) -> bool {
        !self.world().connected
    }

    async fn connect(&mut self) -> Result<()> {
        let mut world = self.world();
        world.record("connect")?;
        world.connected = true;
        world.bearer = None;
        Ok(())
    }

    async fn close(&mut self) {
        let mut world = self.world();
        world.calls.push("close".to_string());
        world.connected = false;
        world.bearer = None;
    }

    async fn bootstrap(&self) -> Result<()> {
        self.world().record("bootstrap")
    }

    async fn authenticate(&self) -> Result<String> {
        let mut world = self.world();
        world.record("authenticate")?;
        world.auth_count += 1;
        match world.auth_token.clone() {
            Some(token) => Ok(token),
            None => Err(SessionError::invalid("fake", "init data rejected").into()),
        }
    }

    fn set_bearer(&mut self, token: &str) {
        self.world().bearer = Some(token.to_string());
    }

    async fn fetch_me(&self) -> Result<()> {
        self.world().record("fetch_me")
    }

    async fn fetch_config(&self) -> Result<GameConfig> {
        let mut world = self.world();
        world.record("fetch_config")?;
        Ok(world.game_config.clone())
    }

    async fn fetch_profile(&self) -> Result<ProfileSnapshot> {
        let mut world = self.world();
        world.record("fetch_profile")?;
        Ok(world.profile.clone())
    }

    async fn fetch_upgrades(&self) -> Result<UpgradesForBuy> {
        let mut world = self.world();
        world.record("fetch_upgrades")?;
        Ok(UpgradesForBuy {
            upgrades_for_buy: world.catalog.clone(),
            daily_combo: world.combo.clone(),
        })
    }

    async fn fetch_combo_cards(&self) -> Result<ComboCards> {
        let mut world = self.world();
        world.record("fetch_combo_cards")?;
        world
            .combo_cards
            .clone()
            .ok_or_else(|| anyhow!("combo source unavailable"))
    }

    async fn purchase_upgrade(&self, upgrade_id: &str) -> Result<PurchaseOutcome> {
        let mut world = self.world();
        world.record(&format!("purchase:{}", upgrade_id))?;
        if world.rejected_upgrades.contains(upgrade_id) {
            return Ok(PurchaseOutcome::default());
        }

        let Some(index) = world.catalog.iter().position(|u| u.id == upgrade_id) else {
            return Ok(PurchaseOutcome::default());
        };
        let bought = world.catalog[index].clone();
        if bought.price > world.profile.balance {
            return Ok(PurchaseOutcome::default());
        }

        world.profile.balance -= bought.price;
        world.profile.passive_income_per_hour += bought.profit_per_hour_delta;
        let next = &mut world.catalog[index];
        next.level += 1;
        next.price *= 2;
        if let Some(combo) = world.combo.as_mut() {
            combo.upgrade_ids.push(upgrade_id.to_string());
        }

        Ok(PurchaseOutcome {
            success: true,
            catalog: Some(world.catalog.clone()),
        })
    }

    async fn claim_combo(&self) -> Result<bool> {
        let mut world = self.world();
        world.record("claim_combo")?;
        let Some(combo) = world.combo.clone() else {
            return Ok(false);
        };
        if combo.is_claimed {
            return Ok(false);
        }
        world.profile.balance += combo.bonus_coins;
        if let Some(combo) = world.combo.as_mut() {
            combo.is_claimed = true;
        }
        Ok(true)
    }

    async fn fetch_tasks(&self) -> Result<Vec<DailyTask>> {
        let mut world = self.world();
        world.record("fetch_tasks")?;
        Ok(world.tasks.clone())
    }

    async fn claim_daily_task(&self) -> Result<bool> {
        let mut world = self.world();
        world.record("claim_daily_task")?;
        match world.tasks.last_mut() {
            Some(task) if !task.is_completed => {
                task.is_completed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn claim_cipher(&self, decoded: &str) -> Result<bool> {
        let mut world = self.world();
        world.record(&format!("claim_cipher:{}", decoded))?;
        match world.game_config.daily_cipher.as_mut() {
            Some(cipher) if !cipher.is_claimed => {
                cipher.is_claimed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn fetch_boosts(&self) -> Result<Vec<Boost>> {
        let mut world = self.world();
        world.record("fetch_boosts")?;
        Ok(world.boosts.clone())
    }

    async fn apply_boost(&self, boost_id: &str) -> Result<bool> {
        let mut world = self.world();
        world.record(&format!("apply_boost:{}", boost_id))?;
        world.profile.available_energy = 1_000;
        if let Some(boost) = world.boosts.iter_mut().find(|b| b.id == boost_id) {
            boost.level += 1;
            boost.cooldown_seconds = 3600;
        }
        Ok(true)
    }

    async fn select_exchange(&self, exchange_id: &str) -> Result<bool> {
        let mut world = self.world();
        world.record(&format!("select_exchange:{}", exchange_id))?;
        world.profile.exchange_id = Some(exchange_id.to_string());
        Ok(true)
    }

    async fn submit_taps(&self, available_energy: i64, taps: u64) -> Result<ProfileSnapshot> {
        let mut world = self.world();
        world.record("submit_taps")?;
        world.tap_times.push(Instant::now());
        world.tap_counts.push(taps);
        if taps as i64 > available_energy {
            world.over_taps += 1;
        }
        let taps = (taps as i64).min(world.profile.available_energy);
        world.profile.available_energy -= taps;
        world.profile.balance += taps;
        world.profile.total_earned += taps;
        Ok(world.profile.clone())
    }
}
