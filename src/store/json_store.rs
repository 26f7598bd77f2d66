use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::roster::{Player, Roster};
use crate::store::schema::{self, BACKUP_FILE, PLAYERS_FILE, UNREADABLE_FILE};

pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = Self::default_dir();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("multidrill")
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn write_atomic(path: &Path, json: &str) -> Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Load the saved roster. A missing file is an empty roster; a file that
    /// fails validation is an error the caller decides how to handle.
    pub fn load_roster(&self) -> Result<Roster> {
        let path = self.file_path(PLAYERS_FILE);
        if !path.exists() {
            return Ok(Roster::new());
        }
        let content = fs::read_to_string(&path)?;
        let players = schema::parse_players(&content)
            .with_context(|| format!("invalid player data in {}", path.display()))?;
        Ok(Roster::from_players(players))
    }

    pub fn save_roster(&self, roster: &Roster) -> Result<()> {
        let json = schema::serialize_players(roster.players())?;
        Self::write_atomic(&self.file_path(PLAYERS_FILE), &json)
    }

    /// Write the roster to an arbitrary file in the stored format.
    pub fn export_to(&self, roster: &Roster, path: &Path) -> Result<()> {
        let json = schema::serialize_players(roster.players())?;
        fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
        info!(path = %path.display(), players = roster.len(), "roster exported");
        Ok(())
    }

    /// Replace the saved roster with the players in `path`.
    ///
    /// The file is fully validated first; only then is the current roster
    /// copied to the backup file and overwritten. A rejected file leaves both
    /// untouched.
    pub fn import_from(&self, path: &Path) -> Result<Roster> {
        let content =
            fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
        let players: Vec<Player> = schema::parse_players(&content)
            .with_context(|| format!("error during import of {}", path.display()))?;
        let roster = Roster::from_players(players);

        let current = self.file_path(PLAYERS_FILE);
        if current.exists() {
            fs::copy(&current, self.file_path(BACKUP_FILE))?;
        }
        self.save_roster(&roster)?;
        info!(path = %path.display(), players = roster.len(), "roster imported");
        Ok(roster)
    }

    /// Load the roster, falling back to an empty one when the saved file is
    /// unreadable.
    ///
    /// The bad file is moved to `players-unreadable.json` first; the import
    /// backup is never touched. If it cannot be moved aside (or an earlier
    /// unreadable file is still there) the error is returned and nothing on
    /// disk changes, so the caller must not save over it.
    pub fn load_roster_or_reset(&self) -> Result<Roster> {
        let err = match self.load_roster() {
            Ok(roster) => return Ok(roster),
            Err(err) => err,
        };
        warn!(error = ?err, "cannot load players, starting with an empty roster");

        let current = self.file_path(PLAYERS_FILE);
        let aside = self.file_path(UNREADABLE_FILE);
        if aside.exists() {
            bail!(
                "{} is unreadable and {} already exists; move one of them away",
                current.display(),
                aside.display()
            );
        }
        fs::rename(&current, &aside).with_context(|| {
            format!("cannot move unreadable {} aside", current.display())
        })?;
        info!(path = %aside.display(), "unreadable player data kept aside");
        Ok(Roster::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::session::result::QuizResult;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    fn sample_roster() -> Roster {
        let config = EngineConfig {
            max_factor: 5,
            repetitions: 2,
            ..EngineConfig::default()
        };
        let mut roster = Roster::new();
        roster.add_player("Ada", &config).unwrap();
        roster.add_player("Bob", &config).unwrap();
        roster
            .record_result("Bob", QuizResult::new(120, 0.8), 0.6)
            .unwrap();
        roster
    }

    #[test]
    fn test_missing_file_is_empty_roster() {
        let (_dir, store) = make_test_store();
        assert!(store.load_roster().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, store) = make_test_store();
        let roster = sample_roster();
        store.save_roster(&roster).unwrap();

        let loaded = store.load_roster().unwrap();
        assert_eq!(loaded.players(), roster.players());
        assert!(!store.file_path("players.json.tmp").exists());
    }

    #[test]
    fn test_export_import_round_trip_with_backup() {
        let (dir, store) = make_test_store();
        let original = sample_roster();
        store.save_roster(&original).unwrap();

        let export_path = dir.path().join("export.json");
        store.export_to(&original, &export_path).unwrap();

        let (_dir2, store2) = make_test_store();
        let mut existing = Roster::new();
        existing
            .add_player("Old", &EngineConfig::default())
            .unwrap();
        store2.save_roster(&existing).unwrap();

        let imported = store2.import_from(&export_path).unwrap();
        assert_eq!(imported.players(), original.players());
        assert_eq!(store2.load_roster().unwrap().players(), original.players());

        let backup = fs::read_to_string(store2.file_path(BACKUP_FILE)).unwrap();
        assert!(backup.contains("\"Old\""));
    }

    #[test]
    fn test_rejected_import_preserves_current_roster() {
        let (dir, store) = make_test_store();
        let roster = sample_roster();
        store.save_roster(&roster).unwrap();
        let before = fs::read_to_string(store.file_path(PLAYERS_FILE)).unwrap();

        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"[{"name": "x", "results": [], "combinations": [[1]]}]"#).unwrap();
        let err = store.import_from(&bad).unwrap_err();
        assert!(err.to_string().contains("error during import"));

        let after = fs::read_to_string(store.file_path(PLAYERS_FILE)).unwrap();
        assert_eq!(before, after);
        assert!(!store.file_path(BACKUP_FILE).exists());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_empty() {
        let (_dir, store) = make_test_store();
        fs::write(store.file_path(BACKUP_FILE), "good backup").unwrap();
        fs::write(store.file_path(PLAYERS_FILE), "{ definitely not a roster").unwrap();
        assert!(store.load_roster().is_err());

        assert!(store.load_roster_or_reset().unwrap().is_empty());
        assert!(!store.file_path(PLAYERS_FILE).exists());
        assert_eq!(
            fs::read_to_string(store.file_path(UNREADABLE_FILE)).unwrap(),
            "{ definitely not a roster"
        );
        assert_eq!(
            fs::read_to_string(store.file_path(BACKUP_FILE)).unwrap(),
            "good backup"
        );
    }

    #[test]
    fn test_corrupt_file_kept_when_it_cannot_be_set_aside() {
        let (_dir, store) = make_test_store();
        fs::write(store.file_path(PLAYERS_FILE), "{ broken again").unwrap();
        fs::write(store.file_path(UNREADABLE_FILE), "{ broken earlier").unwrap();

        let err = store.load_roster_or_reset().unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(
            fs::read_to_string(store.file_path(PLAYERS_FILE)).unwrap(),
            "{ broken again"
        );
        assert_eq!(
            fs::read_to_string(store.file_path(UNREADABLE_FILE)).unwrap(),
            "{ broken earlier"
        );
    }
}
