use serde::{Deserialize, Serialize};
use tracing::info;

use crate::session::result::QuizResult;

/// Snapshot of a player's best result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighScore {
    pub score: u32,
    pub accuracy: f64,
    pub index: usize,
}

impl HighScore {
    pub fn is_star_eligible(&self, min_star_pct: f64) -> bool {
        self.accuracy >= min_star_pct
    }
}

/// What the results screen should do with the high-score star after a quiz.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StarReport {
    pub previous: HighScore,
    pub current: HighScore,
    /// Where the star is first drawn, if anywhere.
    pub star_at: Option<usize>,
    /// `(from, to)` when the star travels to a new high score.
    pub star_move: Option<(usize, usize)>,
    /// Every question answered correctly.
    pub perfect: bool,
}

impl StarReport {
    /// Index the star rests on once any move has played out.
    pub fn final_star(&self) -> Option<usize> {
        self.star_move.map(|(_, to)| to).or(self.star_at)
    }
}

/// Append-only, chronologically ordered results of one player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<QuizResult>", into = "Vec<QuizResult>")]
pub struct PlayerHistory {
    results: Vec<QuizResult>,
}

impl Default for PlayerHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerHistory {
    /// A fresh history holding the zero result, so a high score always exists.
    pub fn new() -> Self {
        Self {
            results: vec![QuizResult::zero()],
        }
    }

    pub fn from_results(results: Vec<QuizResult>) -> Self {
        if results.is_empty() {
            Self::new()
        } else {
            Self { results }
        }
    }

    pub fn results(&self) -> &[QuizResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn last(&self) -> Option<&QuizResult> {
        self.results.last()
    }

    /// Best score; ties resolve to the earliest result.
    pub fn high_score(&self) -> HighScore {
        let mut best = HighScore {
            score: 0,
            accuracy: 0.0,
            index: 0,
        };
        for (index, result) in self.results.iter().enumerate() {
            if index == 0 || result.score > best.score {
                best = HighScore {
                    score: result.score,
                    accuracy: result.accuracy,
                    index,
                };
            }
        }
        best
    }

    pub fn append(&mut self, result: QuizResult) {
        self.results.push(result);
    }

    /// Append `result` and work out the star cue. The previous high score is
    /// captured before the append.
    pub fn record(&mut self, result: QuizResult, min_star_pct: f64) -> StarReport {
        let previous = self.high_score();
        let perfect = result.is_perfect();
        self.append(result);
        let current = self.high_score();

        let previous_eligible = previous.is_star_eligible(min_star_pct);
        let current_eligible = current.is_star_eligible(min_star_pct);

        let star_at = if previous_eligible {
            Some(previous.index)
        } else if current_eligible {
            Some(current.index)
        } else {
            None
        };

        let star_move = (previous_eligible && current_eligible && current.score > previous.score)
            .then_some((previous.index, current.index));

        if current.index != previous.index {
            info!(
                score = current.score,
                previous = previous.score,
                "new high score"
            );
        }

        StarReport {
            previous,
            current,
            star_at,
            star_move,
            perfect,
        }
    }

    /// `(timestamp in ms, score)` points for charting.
    pub fn score_series(&self) -> Vec<(f64, f64)> {
        self.results
            .iter()
            .map(|r| (r.date.timestamp_millis() as f64, r.score as f64))
            .collect()
    }
}

impl From<Vec<QuizResult>> for PlayerHistory {
    fn from(results: Vec<QuizResult>) -> Self {
        Self::from_results(results)
    }
}

impl From<PlayerHistory> for Vec<QuizResult> {
    fn from(history: PlayerHistory) -> Self {
        history.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(entries: &[(u32, f64)]) -> PlayerHistory {
        PlayerHistory::from_results(
            entries
                .iter()
                .map(|&(score, accuracy)| QuizResult::new(score, accuracy))
                .collect(),
        )
    }

    #[test]
    fn test_new_history_has_zero_result() {
        let h = PlayerHistory::new();
        assert_eq!(h.len(), 1);
        let hs = h.high_score();
        assert_eq!(hs.score, 0);
        assert_eq!(hs.index, 0);
    }

    #[test]
    fn test_empty_results_are_seeded() {
        assert_eq!(PlayerHistory::from_results(Vec::new()).len(), 1);
    }

    #[test]
    fn test_high_score_ties_take_earliest() {
        let h = history(&[(0, 0.0), (70, 0.5), (90, 0.8), (90, 1.0), (40, 0.9)]);
        let hs = h.high_score();
        assert_eq!(hs.score, 90);
        assert_eq!(hs.index, 2);
        assert_eq!(hs.accuracy, 0.8);
    }

    #[test]
    fn test_star_moves_to_new_high_score() {
        let mut h = history(&[(0, 0.0), (50, 0.7)]);
        let report = h.record(QuizResult::new(80, 0.9), 0.6);
        assert_eq!(report.previous.score, 50);
        assert_eq!(report.previous.index, 1);
        assert_eq!(report.current.score, 80);
        assert_eq!(report.current.index, 2);
        assert_eq!(report.star_at, Some(1));
        assert_eq!(report.star_move, Some((1, 2)));
        assert_eq!(report.final_star(), Some(2));
        assert!(!report.perfect);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn test_star_stays_when_new_high_score_not_eligible() {
        let mut h = history(&[(0, 0.0), (50, 0.7)]);
        let report = h.record(QuizResult::new(80, 0.4), 0.6);
        assert_eq!(report.current.index, 2);
        assert_eq!(report.star_at, Some(1));
        assert_eq!(report.star_move, None);
        assert_eq!(report.final_star(), Some(1));
    }

    #[test]
    fn test_first_star_appears_at_new_result() {
        let mut h = history(&[(0, 0.0), (50, 0.3)]);
        let report = h.record(QuizResult::new(60, 0.8), 0.6);
        assert_eq!(report.star_at, Some(2));
        assert_eq!(report.star_move, None);
    }

    #[test]
    fn test_no_star_without_eligible_high_score() {
        let mut h = history(&[(0, 0.0), (50, 0.3)]);
        let report = h.record(QuizResult::new(20, 0.9), 0.6);
        assert_eq!(report.current.index, 1);
        assert_eq!(report.star_at, None);
        assert_eq!(report.final_star(), None);
    }

    #[test]
    fn test_equal_score_does_not_move_star() {
        let mut h = history(&[(0, 0.0), (50, 0.7)]);
        let report = h.record(QuizResult::new(50, 1.0), 0.6);
        assert_eq!(report.current.index, 1);
        assert_eq!(report.star_move, None);
        assert!(report.perfect);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let h = history(&[(0, 0.0), (30, 0.5)]);
        let json = serde_json::to_value(&h).unwrap();
        assert!(json.is_array());
        assert_eq!(json.as_array().unwrap().len(), 2);
        let empty: PlayerHistory = serde_json::from_str("[]").unwrap();
        assert_eq!(empty.len(), 1);
    }
}
