use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::pool::FACTOR_RANGE;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_max_factor")]
    pub max_factor: u32,
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
    #[serde(default = "default_proposal_count")]
    pub proposal_count: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_correct_points")]
    pub correct_points: u32,
    #[serde(default = "default_min_star_pct")]
    pub min_star_pct: f64,
    #[serde(default = "default_question_count")]
    pub question_count: u32,
    #[serde(default = "default_answer_delay_ms")]
    pub answer_delay_ms: u64,
    #[serde(default = "default_max_delete_score")]
    pub max_delete_score: u32,
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_max_factor() -> u32 {
    12
}
fn default_repetitions() -> u32 {
    3
}
fn default_proposal_count() -> usize {
    6
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_correct_points() -> u32 {
    10
}
fn default_min_star_pct() -> f64 {
    0.6
}
fn default_question_count() -> u32 {
    5
}
fn default_answer_delay_ms() -> u64 {
    1_500
}
fn default_max_delete_score() -> u32 {
    100
}
fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_factor: default_max_factor(),
            repetitions: default_repetitions(),
            proposal_count: default_proposal_count(),
            timeout_ms: default_timeout_ms(),
            correct_points: default_correct_points(),
            min_star_pct: default_min_star_pct(),
            question_count: default_question_count(),
            answer_delay_ms: default_answer_delay_ms(),
            max_delete_score: default_max_delete_score(),
            theme: default_theme(),
        }
    }
}

/// Immutable engine parameters, fixed for the lifetime of a pool or session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub max_factor: u32,
    pub repetitions: u32,
    pub proposal_count: usize,
    pub timeout: Duration,
    pub correct_points: u32,
    pub min_star_pct: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Config::default().engine()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("multidrill")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Clamp values into ranges the engine can always satisfy. The smallest
    /// plausibility window, [2, 9], holds eight values, which bounds the
    /// proposal count.
    pub fn validate(&mut self) {
        self.max_factor = self.max_factor.clamp(3, *FACTOR_RANGE.end());
        self.repetitions = self.repetitions.clamp(1, 10);
        self.proposal_count = self.proposal_count.clamp(2, 8);
        self.timeout_ms = self.timeout_ms.clamp(1_000, 60_000);
        self.correct_points = self.correct_points.clamp(1, 1_000);
        if !self.min_star_pct.is_finite() {
            self.min_star_pct = default_min_star_pct();
        }
        self.min_star_pct = self.min_star_pct.clamp(0.0, 1.0);
        self.question_count = self.question_count.clamp(1, 100);
        self.answer_delay_ms = self.answer_delay_ms.min(10_000);
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            max_factor: self.max_factor,
            repetitions: self.repetitions,
            proposal_count: self.proposal_count,
            timeout: Duration::from_millis(self.timeout_ms),
            correct_points: self.correct_points,
            min_star_pct: self.min_star_pct,
        }
    }

    pub fn answer_delay(&self) -> Duration {
        Duration::from_millis(self.answer_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.max_factor, 12);
        assert_eq!(config.repetitions, 3);
        assert_eq!(config.proposal_count, 6);
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.correct_points, 10);
        assert!((config.min_star_pct - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.theme, "catppuccin-mocha");
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
max_factor = 10
question_count = 20
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_factor, 10);
        assert_eq!(config.question_count, 20);
        assert_eq!(config.proposal_count, 6);
        assert_eq!(config.answer_delay_ms, 1_500);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.max_factor, deserialized.max_factor);
        assert_eq!(config.timeout_ms, deserialized.timeout_ms);
        assert_eq!(config.theme, deserialized.theme);
    }

    #[test]
    fn test_validate_clamps_values() {
        let mut config = Config::default();
        config.max_factor = 1;
        config.proposal_count = 40;
        config.timeout_ms = 5;
        config.min_star_pct = 3.0;
        config.question_count = 0;
        config.validate();

        assert_eq!(config.max_factor, 3);
        assert_eq!(config.proposal_count, 8);

        let mut big = Config {
            max_factor: 99,
            ..Config::default()
        };
        big.validate();
        assert_eq!(big.max_factor, 20);
        assert_eq!(config.timeout_ms, 1_000);
        assert_eq!(config.min_star_pct, 1.0);
        assert_eq!(config.question_count, 1);
    }

    #[test]
    fn test_validate_resets_nan_star_threshold() {
        let mut config = Config::default();
        config.min_star_pct = f64::NAN;
        config.validate();
        assert!((config.min_star_pct - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_engine_view() {
        let engine = Config::default().engine();
        assert_eq!(engine.timeout, Duration::from_secs(10));
        assert_eq!(engine.proposal_count, 6);
        assert_eq!(engine.correct_points, 10);
    }
}
