use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::engine::pool::{CombinationPool, FactPair};
use crate::error::{PlayerDataError, PoolError};
use crate::roster::Player;
use crate::session::history::PlayerHistory;
use crate::session::result::QuizResult;

pub const PLAYERS_FILE: &str = "players.json";
pub const BACKUP_FILE: &str = "players-backup.json";
pub const UNREADABLE_FILE: &str = "players-unreadable.json";

/// Serialized shape of one player:
/// `{ name, results: [{date, score, note}], combinations: [[a, b], ...] }`.
///
/// `results` stay in chronological order. Order inside `combinations` carries
/// no meaning but the occurrence count of every pair is preserved exactly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub results: Vec<QuizResult>,
    pub combinations: Vec<FactPair>,
}

impl From<&Player> for PlayerRecord {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name().to_string(),
            results: player.history.results().to_vec(),
            combinations: player.pool.pairs().to_vec(),
        }
    }
}

impl PlayerRecord {
    pub fn into_player(self) -> Result<Player, PlayerDataError> {
        if self.name.trim().is_empty() {
            return Err(PlayerDataError::EmptyName);
        }
        let pool = match CombinationPool::from_pairs(self.combinations) {
            Ok(pool) => pool,
            Err(PoolError::Empty) => return Err(PlayerDataError::EmptyCombinations(self.name)),
            Err(PoolError::FactorOutOfRange { a, b }) => {
                return Err(PlayerDataError::FactorOutOfRange {
                    name: self.name,
                    a,
                    b,
                });
            }
        };
        let history = PlayerHistory::from_results(self.results);
        Ok(Player::with_data(&self.name, history, pool))
    }
}

/// Validate a roster document and turn it into players.
pub fn parse_players(json: &str) -> Result<Vec<Player>, PlayerDataError> {
    let records: Vec<PlayerRecord> = serde_json::from_str(json)?;

    let mut seen = HashSet::new();
    for record in &records {
        if !seen.insert(record.name.as_str()) {
            return Err(PlayerDataError::DuplicateName(record.name.clone()));
        }
    }

    records.into_iter().map(PlayerRecord::into_player).collect()
}

pub fn serialize_players(players: &[Player]) -> serde_json::Result<String> {
    let records: Vec<PlayerRecord> = players.iter().map(PlayerRecord::from).collect();
    serde_json::to_string_pretty(&records)
}
