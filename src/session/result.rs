use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one completed quiz. Never mutated once appended to a history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    pub score: u32,
    /// Fraction of questions answered correctly, in [0, 1].
    #[serde(rename = "note")]
    pub accuracy: f64,
}

impl QuizResult {
    pub fn new(score: u32, accuracy: f64) -> Self {
        Self::at(Utc::now(), score, accuracy)
    }

    pub fn at(date: DateTime<Utc>, score: u32, accuracy: f64) -> Self {
        Self {
            date,
            score,
            accuracy,
        }
    }

    /// Placeholder result every new player starts with.
    pub fn zero() -> Self {
        Self::new(0, 0.0)
    }

    pub fn is_star_eligible(&self, min_star_pct: f64) -> bool {
        self.accuracy >= min_star_pct
    }

    pub fn is_perfect(&self) -> bool {
        self.accuracy >= 1.0
    }
}
