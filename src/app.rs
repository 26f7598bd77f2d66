use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::roster::Roster;
use crate::session::history::StarReport;
use crate::session::quiz::{QuestionOutcome, QuizSession, SessionState, SessionSummary};
use crate::session::result::QuizResult;
use crate::store::json_store::JsonStore;
use crate::ui::components::quiz_area::Reveal;
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// How long the star takes to travel to a new high score.
pub const STAR_MOVE_DURATION: Duration = Duration::from_millis(1200);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Players,
    Quiz,
    Reveal,
    GameOver,
}

pub struct RevealState {
    pub reveal: Reveal,
    pub until: Instant,
}

pub struct GameOver {
    pub summary: SessionSummary,
    pub report: Option<StarReport>,
    pub shown_at: Instant,
}

pub struct App {
    pub screen: AppScreen,
    pub theme: &'static Theme,
    pub config: Config,
    pub roster: Roster,
    pub store: Option<JsonStore>,
    pub session: QuizSession<SmallRng>,
    pub player: Option<String>,
    pub selected: usize,
    pub name_input: Option<LineInput>,
    pub confirm_delete: bool,
    pub status: Option<String>,
    pub reveal: Option<RevealState>,
    pub game_over: Option<GameOver>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Self {
        let theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(theme));

        let mut status = None;
        let (roster, store) = match JsonStore::new() {
            Ok(store) => match store.load_roster_or_reset() {
                Ok(roster) => (roster, Some(store)),
                Err(err) => {
                    error!(error = ?err, "player data kept as is, saving disabled");
                    status = Some(format!("{err:#} (saving disabled)"));
                    (Roster::new(), None)
                }
            },
            Err(err) => {
                warn!(error = %err, "player data directory unavailable, nothing will be saved");
                (Roster::new(), None)
            }
        };

        let mut app = Self::with_parts(config, roster, store, theme, SmallRng::from_entropy());
        app.status = status;
        app
    }

    pub fn with_parts(
        config: Config,
        roster: Roster,
        store: Option<JsonStore>,
        theme: &'static Theme,
        rng: SmallRng,
    ) -> Self {
        let session = QuizSession::new(config.engine(), rng);
        Self {
            screen: AppScreen::Players,
            theme,
            config,
            roster,
            store,
            session,
            player: None,
            selected: 0,
            name_input: None,
            confirm_delete: false,
            status: None,
            reveal: None,
            game_over: None,
            should_quit: false,
        }
    }

    pub fn selected_name(&self) -> Option<String> {
        self.roster
            .players()
            .get(self.selected)
            .map(|p| p.name().to_string())
    }

    pub fn select_next(&mut self) {
        if !self.roster.is_empty() {
            self.selected = (self.selected + 1) % self.roster.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.roster.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.roster.len() - 1);
        }
    }

    fn select_name(&mut self, name: &str) {
        if let Some(ix) = self.roster.players().iter().position(|p| p.name() == name) {
            self.selected = ix;
        }
    }

    /// Show a failed action in the status line instead of aborting.
    pub fn report(&mut self, result: Result<()>) {
        if let Err(err) = result {
            warn!(error = %err, "action failed");
            self.status = Some(err.to_string());
        }
    }

    pub fn persist(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = store.save_roster(&self.roster) {
            warn!(error = %err, "cannot save players");
            self.status = Some(format!("Could not save players: {err}"));
        }
    }

    pub fn add_player(&mut self, name: &str) -> Result<()> {
        self.roster.add_player(name, &self.config.engine())?;
        self.select_name(name.trim());
        self.persist();
        Ok(())
    }

    pub fn delete_selected(&mut self) -> Result<()> {
        let Some(name) = self.selected_name() else {
            return Ok(());
        };
        self.roster
            .delete_player(&name, self.config.max_delete_score)?;
        self.selected = self.selected.min(self.roster.len().saturating_sub(1));
        self.persist();
        Ok(())
    }

    pub fn start_quiz(&mut self, name: &str, now: Instant) -> Result<()> {
        self.roster.find(name)?;
        self.player = Some(name.to_string());
        self.status = None;
        self.game_over = None;
        self.session.start(self.config.question_count);
        info!(player = name, "quiz starting");
        self.advance(now)
    }

    fn active_player(&self) -> Result<String> {
        self.player.clone().context("no player is taking a quiz")
    }

    /// Ask the next question, or close the quiz when none are left.
    pub fn advance(&mut self, now: Instant) -> Result<()> {
        let name = self.active_player()?;
        self.reveal = None;
        let pool = &self.roster.find(&name)?.pool;
        match self.session.next_question_at(now, pool)? {
            QuestionOutcome::Continue(_) => self.screen = AppScreen::Quiz,
            QuestionOutcome::Finished(summary) => self.finish(&name, summary, now)?,
        }
        Ok(())
    }

    fn finish(&mut self, name: &str, summary: SessionSummary, now: Instant) -> Result<()> {
        let result = QuizResult::new(summary.score, summary.accuracy);
        let report = self
            .roster
            .record_result(name, result, self.config.min_star_pct)?;
        self.select_name(name);
        self.persist();
        self.game_over = Some(GameOver {
            summary,
            report: Some(report),
            shown_at: now,
        });
        self.screen = AppScreen::GameOver;
        Ok(())
    }

    /// Answer with the proposal at `index` (0-based).
    pub fn answer(&mut self, index: usize, now: Instant) -> Result<()> {
        if self.screen != AppScreen::Quiz {
            return Ok(());
        }
        let Some(chosen) = self
            .session
            .current_problem()
            .and_then(|p| p.proposals.get(index).copied())
        else {
            return Ok(());
        };
        if self.session.poll_timeout(now).is_some() {
            return self.on_tick(now);
        }
        let name = self.active_player()?;
        let player = self.roster.find_mut(&name)?;
        self.session.check_answer_at(chosen, now, &mut player.pool)?;
        self.show_reveal(Reveal::Answered { chosen }, now);
        Ok(())
    }

    fn show_reveal(&mut self, reveal: Reveal, now: Instant) {
        self.reveal = Some(RevealState {
            reveal,
            until: now + self.config.answer_delay(),
        });
        self.screen = AppScreen::Reveal;
    }

    /// Deliver an expired question timer and end the reveal pause.
    pub fn on_tick(&mut self, now: Instant) -> Result<()> {
        match self.screen {
            AppScreen::Quiz => {
                if let Some(event) = self.session.poll_timeout(now) {
                    let name = self.active_player()?;
                    let player = self.roster.find_mut(&name)?;
                    if self.session.handle_timeout(event, &mut player.pool) {
                        self.show_reveal(Reveal::TimedOut, now);
                    }
                }
            }
            AppScreen::Reveal => {
                if self.reveal.as_ref().is_some_and(|r| now >= r.until) {
                    self.advance(now)?;
                }
            }
            AppScreen::Players | AppScreen::GameOver => {}
        }
        Ok(())
    }

    /// Leave a running quiz. Pool changes made so far are kept; no result is
    /// recorded.
    pub fn abandon_quiz(&mut self) {
        if matches!(
            self.session.state(),
            SessionState::AwaitingAnswer | SessionState::Resolved
        ) {
            info!(player = ?self.player, "quiz abandoned");
            self.persist();
        }
        self.reveal = None;
        self.go_to_players();
    }

    pub fn go_to_players(&mut self) {
        self.screen = AppScreen::Players;
        self.confirm_delete = false;
        self.name_input = None;
    }

    /// Milliseconds left to answer the pending question.
    pub fn remaining_ms(&self, now: Instant) -> Option<u64> {
        self.session
            .deadline()
            .map(|d| d.saturating_duration_since(now).as_millis() as u64)
    }

    /// Progress of the star's move, 0 to 1, on the game-over screen.
    pub fn star_progress(&self, now: Instant) -> f64 {
        self.game_over.as_ref().map_or(1.0, |g| {
            now.saturating_duration_since(g.shown_at).as_secs_f64()
                / STAR_MOVE_DURATION.as_secs_f64()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn theme() -> &'static Theme {
        Box::leak(Box::new(Theme::default()))
    }

    fn make_app(store: Option<JsonStore>) -> App {
        let config = Config {
            max_factor: 4,
            repetitions: 1,
            question_count: 3,
            timeout_ms: 5_000,
            answer_delay_ms: 1_000,
            ..Config::default()
        };
        let mut roster = Roster::new();
        roster.add_player("Ada", &config.engine()).unwrap();
        App::with_parts(config, roster, store, theme(), SmallRng::seed_from_u64(3))
    }

    fn correct_index(app: &App) -> usize {
        let problem = app.session.current_problem().unwrap();
        problem
            .proposals
            .iter()
            .position(|&v| v == problem.solution)
            .unwrap()
    }

    #[test]
    fn test_full_quiz_records_result() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let mut app = make_app(Some(store));
        let mut now = Instant::now();

        app.start_quiz("Ada", now).unwrap();
        assert_eq!(app.screen, AppScreen::Quiz);

        for _ in 0..3 {
            let ix = correct_index(&app);
            app.answer(ix, now).unwrap();
            assert_eq!(app.screen, AppScreen::Reveal);
            app.on_tick(now).unwrap();
            assert_eq!(app.screen, AppScreen::Reveal);
            now += Duration::from_millis(1_000);
            app.on_tick(now).unwrap();
        }

        assert_eq!(app.screen, AppScreen::GameOver);
        let over = app.game_over.as_ref().unwrap();
        assert_eq!(over.summary.correct, 3);
        assert_eq!(over.summary.score, 3 * 20);
        let report = over.report.unwrap();
        assert!(report.perfect);
        assert_eq!(report.current.score, 60);

        let saved = app.store.as_ref().unwrap().load_roster().unwrap();
        assert_eq!(saved.find("Ada").unwrap().high_score(), 60);
    }

    #[test]
    fn test_timeout_on_tick_reveals_and_penalises() {
        let mut app = make_app(None);
        let now = Instant::now();
        app.start_quiz("Ada", now).unwrap();
        let pair = app.session.current_problem().unwrap().pair;
        let before = app.roster.find("Ada").unwrap().pool.count(pair);

        app.on_tick(now + Duration::from_millis(4_999)).unwrap();
        assert_eq!(app.screen, AppScreen::Quiz);

        app.on_tick(now + Duration::from_millis(5_000)).unwrap();
        assert_eq!(app.screen, AppScreen::Reveal);
        assert_eq!(app.reveal.as_ref().unwrap().reveal, Reveal::TimedOut);
        assert_eq!(app.roster.find("Ada").unwrap().pool.count(pair), before + 1);

        // A late answer after the timeout is ignored.
        assert!(app.answer(0, now + Duration::from_millis(5_100)).is_ok());
        assert_eq!(app.roster.find("Ada").unwrap().pool.count(pair), before + 1);
    }

    #[test]
    fn test_key_after_expiry_reveals_timeout() {
        let mut app = make_app(None);
        let now = Instant::now();
        app.start_quiz("Ada", now).unwrap();
        let pair = app.session.current_problem().unwrap().pair;
        let before = app.roster.find("Ada").unwrap().pool.count(pair);

        // No tick has delivered the timeout yet; the key still loses.
        let right = correct_index(&app);
        app.answer(right, now + Duration::from_millis(5_050)).unwrap();
        assert_eq!(app.screen, AppScreen::Reveal);
        assert_eq!(app.reveal.as_ref().unwrap().reveal, Reveal::TimedOut);
        assert_eq!(app.session.score(), 0);
        assert_eq!(app.roster.find("Ada").unwrap().pool.count(pair), before + 1);
    }

    #[test]
    fn test_players_screen_actions() {
        let mut app = make_app(None);
        app.add_player("  Bob ").unwrap();
        assert_eq!(app.selected_name().as_deref(), Some("Bob"));
        assert!(app.add_player("Bob").is_err());

        app.select_next();
        app.select_prev();
        assert_eq!(app.selected_name().as_deref(), Some("Bob"));

        app.delete_selected().unwrap();
        assert_eq!(app.roster.len(), 1);
        assert_eq!(app.selected, 0);

        let result = app.start_quiz("Nobody", Instant::now());
        assert!(result.is_err());
        app.report(result);
        assert!(app.status.as_deref().unwrap_or("").contains("Nobody"));
    }

    #[test]
    fn test_abandon_returns_to_players() {
        let mut app = make_app(None);
        app.start_quiz("Ada", Instant::now()).unwrap();
        app.abandon_quiz();
        assert_eq!(app.screen, AppScreen::Players);
        assert_eq!(app.roster.find("Ada").unwrap().history.len(), 1);
    }
}
