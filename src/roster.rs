use std::cmp::Ordering;

use tracing::info;

use crate::config::EngineConfig;
use crate::engine::pool::CombinationPool;
use crate::error::RosterError;
use crate::session::history::{PlayerHistory, StarReport};
use crate::session::result::QuizResult;

/// A player with their result history and their own weighted fact pool.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    name: String,
    pub history: PlayerHistory,
    pub pool: CombinationPool,
}

impl Player {
    pub fn new(name: &str, config: &EngineConfig) -> Result<Self, RosterError> {
        let pool = CombinationPool::generate(config.max_factor, config.repetitions)?;
        Ok(Self::with_data(name, PlayerHistory::new(), pool))
    }

    pub fn with_data(name: &str, history: PlayerHistory, pool: CombinationPool) -> Self {
        Self {
            name: name.to_string(),
            history,
            pool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn high_score(&self) -> u32 {
        self.history.high_score().score
    }
}

/// Highest score first, then alphabetical.
fn player_order(a: &Player, b: &Player) -> Ordering {
    b.high_score()
        .cmp(&a.high_score())
        .then_with(|| a.name.cmp(&b.name))
}

#[derive(Clone, Debug, Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_players(mut players: Vec<Player>) -> Self {
        players.sort_by(player_order);
        Self { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn into_players(self) -> Vec<Player> {
        self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn find(&self, name: &str) -> Result<&Player, RosterError> {
        self.players
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| RosterError::UnknownPlayer(name.to_string()))
    }

    pub fn find_mut(&mut self, name: &str) -> Result<&mut Player, RosterError> {
        self.players
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| RosterError::UnknownPlayer(name.to_string()))
    }

    pub fn add_player(&mut self, name: &str, config: &EngineConfig) -> Result<(), RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::EmptyName);
        }
        if self.contains(name) {
            return Err(RosterError::DuplicateName(name.to_string()));
        }
        self.players.push(Player::new(name, config)?);
        self.players.sort_by(player_order);
        info!(name, "player added");
        Ok(())
    }

    /// Remove a player unless their high score is above `max_delete_score`.
    pub fn delete_player(
        &mut self,
        name: &str,
        max_delete_score: u32,
    ) -> Result<Player, RosterError> {
        let ix = self
            .position(name)
            .ok_or_else(|| RosterError::UnknownPlayer(name.to_string()))?;
        let high_score = self.players[ix].high_score();
        if high_score > max_delete_score {
            return Err(RosterError::Protected {
                name: name.to_string(),
                high_score,
            });
        }
        info!(name, "player deleted");
        Ok(self.players.remove(ix))
    }

    pub fn delete_all(&mut self) {
        info!(count = self.players.len(), "all players deleted");
        self.players.clear();
    }

    /// Append a finished quiz to a player's history and keep the roster
    /// ordered.
    pub fn record_result(
        &mut self,
        name: &str,
        result: QuizResult,
        min_star_pct: f64,
    ) -> Result<StarReport, RosterError> {
        let report = self.find_mut(name)?.history.record(result, min_star_pct);
        self.players.sort_by(player_order);
        Ok(report)
    }

    pub fn score_series(&self, name: &str) -> Result<Vec<(f64, f64)>, RosterError> {
        Ok(self.find(name)?.history.score_series())
    }
}
