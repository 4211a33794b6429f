//! Trial configuration
//!
//! Holds:
//! - Rounds per trial and per-trial phase delays
//! - Telekinesis arena layout and overshoot allowance
//! - JSON loading with defaults for every missing field

use crate::error::{Result, TrialError};
use crate::registry::TrialId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Rounds per trial in the shipped game
pub const DEFAULT_ROUNDS: u32 = 5;

/// Widest accepted arena, keeps position and score arithmetic in range
pub const MAX_ARENA_WIDTH: i64 = 1_000_000;

/// Phase delays for one trial, in milliseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Presenting -> WaitingForInput
    pub presentation_ms: u64,
    /// Revealing -> Presenting between rounds
    pub feedback_ms: u64,
    /// Revealing -> Finished after the last round
    pub final_ms: u64,
}

impl DelayConfig {
    pub const fn new(presentation_ms: u64, feedback_ms: u64, final_ms: u64) -> Self {
        DelayConfig {
            presentation_ms,
            feedback_ms,
            final_ms,
        }
    }
}

/// Telekinesis arena geometry
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Arena width in layout units
    pub width: i64,
    /// Distance from each edge to the start and target markers
    pub margin: i64,
    /// Overshoot allowance as a fraction of the max possible distance
    pub overshoot_ratio: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            width: 800,
            margin: 150,
            overshoot_ratio: 0.2,
        }
    }
}

impl ArenaConfig {
    /// Displacement from the start marker to the target marker
    pub fn target_distance(&self) -> i64 {
        (self.width - self.margin) - self.margin
    }

    /// Normalizer for the distance score
    pub fn max_possible_distance(&self) -> i64 {
        self.width - 2 * self.margin
    }

    pub fn overshoot_allowance(&self) -> i64 {
        (self.max_possible_distance() as f64 * self.overshoot_ratio).round() as i64
    }

    /// Furthest displacement the ball may reach
    pub fn position_limit(&self) -> i64 {
        self.target_distance() + self.overshoot_allowance()
    }
}

/// Delay overrides as read from JSON; gaps come from the trial's defaults
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
struct PartialDelays {
    presentation_ms: Option<u64>,
    feedback_ms: Option<u64>,
    final_ms: Option<u64>,
}

impl PartialDelays {
    fn over(self, base: DelayConfig) -> DelayConfig {
        DelayConfig {
            presentation_ms: self.presentation_ms.unwrap_or(base.presentation_ms),
            feedback_ms: self.feedback_ms.unwrap_or(base.feedback_ms),
            final_ms: self.final_ms.unwrap_or(base.final_ms),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAppConfig {
    rounds: Option<u32>,
    arena: ArenaConfig,
    telekinesis: PartialDelays,
    clairvoyance: PartialDelays,
    precognition: PartialDelays,
}

impl From<RawAppConfig> for AppConfig {
    fn from(raw: RawAppConfig) -> Self {
        let base = AppConfig::default();
        AppConfig {
            rounds: raw.rounds.unwrap_or(base.rounds),
            arena: raw.arena,
            telekinesis: raw.telekinesis.over(base.telekinesis),
            clairvoyance: raw.clairvoyance.over(base.clairvoyance),
            precognition: raw.precognition.over(base.precognition),
        }
    }
}

/// Application configuration, loadable from JSON
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAppConfig")]
pub struct AppConfig {
    pub rounds: u32,
    pub arena: ArenaConfig,
    pub telekinesis: DelayConfig,
    pub clairvoyance: DelayConfig,
    pub precognition: DelayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            rounds: DEFAULT_ROUNDS,
            arena: ArenaConfig::default(),
            telekinesis: DelayConfig::new(0, 0, 500),
            clairvoyance: DelayConfig::new(0, 2000, 2000),
            precognition: DelayConfig::new(5000, 3000, 3000),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file; missing fields fall back to defaults
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| TrialError::ConfigIo {
            path: path.to_string(),
            source,
        })?;
        let config: AppConfig =
            serde_json::from_str(&content).map_err(|source| TrialError::ConfigParse {
                path: path.to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(TrialError::InvalidConfig("rounds must be at least 1".into()));
        }
        if self.arena.width > MAX_ARENA_WIDTH {
            return Err(TrialError::InvalidConfig(format!(
                "arena width {} exceeds {}",
                self.arena.width, MAX_ARENA_WIDTH
            )));
        }
        let span = self
            .arena
            .margin
            .checked_mul(2)
            .filter(|&twice| self.arena.margin >= 0 && twice < self.arena.width);
        if span.is_none() {
            return Err(TrialError::InvalidConfig(format!(
                "arena width {} must exceed twice the margin {}",
                self.arena.width, self.arena.margin
            )));
        }
        if !(0.0..=1.0).contains(&self.arena.overshoot_ratio) {
            return Err(TrialError::InvalidConfig(format!(
                "overshoot_ratio {} outside [0, 1]",
                self.arena.overshoot_ratio
            )));
        }
        Ok(())
    }

    /// Build the per-trial session configuration
    pub fn trial(&self, trial: TrialId) -> TrialConfig {
        let delays = match trial {
            TrialId::Telekinesis => self.telekinesis,
            TrialId::Clairvoyance => self.clairvoyance,
            TrialId::Precognition => self.precognition,
        };
        TrialConfig {
            trial,
            total_rounds: self.rounds,
            presentation_delay: Duration::from_millis(delays.presentation_ms),
            feedback_delay: Duration::from_millis(delays.feedback_ms),
            final_delay: Duration::from_millis(delays.final_ms),
            arena: self.arena,
        }
    }
}

/// Everything a session needs to run one trial
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrialConfig {
    pub trial: TrialId,
    pub total_rounds: u32,
    pub presentation_delay: Duration,
    pub feedback_delay: Duration,
    pub final_delay: Duration,
    pub arena: ArenaConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_arena_geometry() {
        let arena = ArenaConfig::default();
        assert_eq!(arena.target_distance(), 500);
        assert_eq!(arena.max_possible_distance(), 500);
        assert_eq!(arena.overshoot_allowance(), 100);
        assert_eq!(arena.position_limit(), 600);
    }

    #[test]
    fn test_default_delays() {
        let config = AppConfig::default();
        let precog = config.trial(TrialId::Precognition);
        assert_eq!(precog.presentation_delay, Duration::from_millis(5000));
        assert_eq!(precog.total_rounds, 5);

        let clair = config.trial(TrialId::Clairvoyance);
        assert_eq!(clair.presentation_delay, Duration::ZERO);
        assert_eq!(clair.feedback_delay, Duration::from_millis(2000));

        let tele = config.trial(TrialId::Telekinesis);
        assert_eq!(tele.feedback_delay, Duration::ZERO);
        assert_eq!(tele.final_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"rounds": 3, "arena": {"overshoot_ratio": 0.5}}"#).unwrap();
        assert_eq!(config.rounds, 3);
        assert_eq!(config.arena.width, 800);
        assert_eq!(config.arena.overshoot_allowance(), 250);
        assert_eq!(config.precognition, AppConfig::default().precognition);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_delays_fill_from_trial_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"precognition": {"presentation_ms": 1000}}"#).unwrap();
        assert_eq!(config.precognition, DelayConfig::new(1000, 3000, 3000));
        assert_eq!(config.clairvoyance, DelayConfig::new(0, 2000, 2000));

        let config: AppConfig =
            serde_json::from_str(r#"{"telekinesis": {"final_ms": 0}, "clairvoyance": {}}"#)
                .unwrap();
        assert_eq!(config.telekinesis, DelayConfig::new(0, 0, 0));
        assert_eq!(config.clairvoyance, AppConfig::default().clairvoyance);
        assert_eq!(config.rounds, DEFAULT_ROUNDS);
    }

    #[test]
    fn test_serialized_config_loads_back() {
        let mut config = AppConfig::default();
        config.precognition.feedback_ms = 1234;
        let json = serde_json::to_string(&config).unwrap();
        let loaded: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_validate_rejects_oversized_arena() {
        let config: AppConfig =
            serde_json::from_str(r#"{"arena": {"width": 9223372036854775807, "margin": 0}}"#)
                .unwrap();
        assert!(matches!(
            config.validate(),
            Err(TrialError::InvalidConfig(_))
        ));

        let mut config = AppConfig::default();
        config.arena.margin = i64::MAX;
        assert!(config.validate().is_err());

        config.arena.width = MAX_ARENA_WIDTH;
        config.arena.margin = 0;
        config.arena.overshoot_ratio = 1.0;
        assert!(config.validate().is_ok());
        assert_eq!(config.arena.position_limit(), 2 * MAX_ARENA_WIDTH);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.rounds = 0;
        assert!(matches!(
            config.validate(),
            Err(TrialError::InvalidConfig(_))
        ));

        let mut config = AppConfig::default();
        config.arena.margin = 400;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.arena.overshoot_ratio = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/esp-trials.json").unwrap_err();
        assert!(matches!(err, TrialError::ConfigIo { .. }));
    }
}
