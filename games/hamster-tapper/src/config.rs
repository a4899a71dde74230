//! Configuration loader for hamster-tapper
//!
//! Every operator tunable lives in [`TapperConfig`]. The value is loaded once
//! at startup, validated, wrapped in an `Arc` and handed to each account's
//! worker; nothing reads settings from global state.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use core_logic::ConfigError;
use rand::Rng;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

/// Inclusive `[min, max]` pair, written as a two-element array in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "[u64; 2]")]
pub struct Bounds {
    pub min: u64,
    pub max: u64,
}

impl From<[u64; 2]> for Bounds {
    fn from([min, max]: [u64; 2]) -> Self {
        Self { min, max }
    }
}

impl Bounds {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Uniform sample in `[min, max]`. Callers validate `min <= max` first.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    pub fn sample_secs<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_secs(self.sample(rng))
    }

    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvalidRange {
                field: field.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Configuration for the tapper
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TapperConfig {
    /// Game API root, e.g. `https://api.hamsterkombatgame.io`
    pub api_base_url: String,
    /// Endpoint publishing today's combo cards
    pub combo_source_url: String,
    /// Optional page fetched before authentication, like the web client does
    pub bootstrap_url: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Taps per batch
    pub random_taps_count: Bounds,
    /// Seconds between tap batches
    pub sleep_between_tap: Bounds,
    /// Energy level below which the worker refills or sleeps
    pub min_available_energy: i64,
    /// Seconds to sleep when energy is exhausted
    pub sleep_by_min_energy: Bounds,
    /// Extra taps per batch while turbo is active
    pub add_taps_on_turbo: u64,
    /// Seconds between batches while turbo is active
    pub turbo_sleep_secs: u64,
    /// How long turbo lasts once activated
    pub turbo_duration_secs: u64,

    pub auto_upgrade: bool,
    /// Purchase attempts per cycle
    pub upgrades_count: u32,
    pub max_level: u32,
    pub max_upgrade_price: i64,
    /// Coins never spent by the planner
    pub balance_to_save: i64,
    /// Use the free energy refill boost when energy runs out
    pub apply_daily_energy: bool,

    pub auto_claim_combo: bool,
    pub auto_claim_cipher: bool,
    pub auto_claim_daily: bool,
    pub default_exchange: String,

    /// IANA zone the combo date is expressed in
    pub combo_timezone: String,
    /// Hour of day the combo round opens
    pub combo_start_hour: u32,

    /// Pause before each purchase or boost call
    pub purchase_delay_secs: u64,
    /// Pause after purchases and between bonus claims
    pub action_delay_secs: u64,
    /// Base delay after a failed cycle; grows while failures repeat
    pub error_retry_delay_secs: u64,
    /// Ceiling for the failed-cycle delay
    pub error_retry_max_delay_secs: u64,

    /// Hand out proxies from proxies.txt to accounts without their own
    pub use_proxy_from_file: bool,
}

impl Default for TapperConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.hamsterkombatgame.io".to_string(),
            combo_source_url: "https://api21.datavibe.top/api/GetCombo".to_string(),
            bootstrap_url: None,
            request_timeout_secs: 30,
            random_taps_count: Bounds::new(50, 200),
            sleep_between_tap: Bounds::new(10, 25),
            min_available_energy: 100,
            sleep_by_min_energy: Bounds::new(1800, 2400),
            add_taps_on_turbo: 2500,
            turbo_sleep_secs: 4,
            turbo_duration_secs: 20,
            auto_upgrade: true,
            upgrades_count: 5,
            max_level: 20,
            max_upgrade_price: 50_000_000,
            balance_to_save: 1_000_000,
            apply_daily_energy: true,
            auto_claim_combo: true,
            auto_claim_cipher: true,
            auto_claim_daily: true,
            default_exchange: "bybit".to_string(),
            combo_timezone: "Europe/Moscow".to_string(),
            combo_start_hour: 15,
            purchase_delay_secs: 5,
            action_delay_secs: 2,
            error_retry_delay_secs: 3,
            error_retry_max_delay_secs: 3,
            use_proxy_from_file: false,
        }
    }
}

impl TapperConfig {
    /// Load configuration from a TOML file
    ///
    /// # Example
    /// ```ignore
    /// let config = TapperConfig::from_path("config/config.toml")?;
    /// ```
    pub fn from_path(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).context(format!("Failed to read config from {}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.random_taps_count.validate("random_taps_count")?;
        self.sleep_between_tap.validate("sleep_between_tap")?;
        self.sleep_by_min_energy.validate("sleep_by_min_energy")?;

        for (field, value) in [
            ("api_base_url", &self.api_base_url),
            ("combo_source_url", &self.combo_source_url),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(ConfigError::InvalidUrl {
                    field: field.to_string(),
                    url: value.clone(),
                });
            }
        }

        if self.error_retry_delay_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "error_retry_delay_secs".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.error_retry_max_delay_secs < self.error_retry_delay_secs {
            return Err(ConfigError::InvalidRange {
                field: "error_retry_delay_secs".to_string(),
                min: self.error_retry_delay_secs,
                max: self.error_retry_max_delay_secs,
            });
        }
        if self.combo_start_hour > 23 {
            return Err(ConfigError::InvalidValue {
                field: "combo_start_hour".to_string(),
                reason: format!("{} is not an hour of day", self.combo_start_hour),
            });
        }
        self.combo_tz()?;
        if self.min_available_energy < 0 {
            return Err(ConfigError::InvalidValue {
                field: "min_available_energy".to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        Ok(())
    }

    pub fn combo_tz(&self) -> Result<Tz, ConfigError> {
        self.combo_timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidValue {
                field: "combo_timezone".to_string(),
                reason: format!("unknown time zone '{}'", self.combo_timezone),
            })
    }

    pub fn purchase_delay(&self) -> Duration {
        Duration::from_secs(self.purchase_delay_secs)
    }

    pub fn action_delay(&self) -> Duration {
        Duration::from_secs(self.action_delay_secs)
    }

    pub fn turbo_sleep(&self) -> Duration {
        Duration::from_secs(self.turbo_sleep_secs)
    }

    pub fn turbo_duration(&self) -> Duration {
        Duration::from_secs(self.turbo_duration_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_defaults_are_valid() {
        assert!(TapperConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let config = TapperConfig::from_toml_str(
            r#"
            random_taps_count = [10, 20]
            max_level = 7
            combo_timezone = "UTC"
            "#,
        )
        .unwrap();

        assert_eq!(config.random_taps_count, Bounds::new(10, 20));
        assert_eq!(config.max_level, 7);
        assert_eq!(config.default_exchange, "bybit");
        assert_eq!(config.combo_start_hour, 15);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = TapperConfig::from_toml_str("sleep_between_tap = [30, 5]").unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("sleep_between_tap"), "{}", msg);
    }

    #[test]
    fn test_zero_retry_delay_rejected() {
        let config = TapperConfig {
            error_retry_delay_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let config = TapperConfig {
            combo_timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bounds_sample_within_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let bounds = Bounds::new(3, 9);
        for _ in 0..200 {
            let v = bounds.sample(&mut rng);
            assert!((3..=9).contains(&v));
        }
        assert_eq!(Bounds::new(4, 4).sample(&mut rng), 4);
    }
}
