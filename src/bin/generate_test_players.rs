use std::fs;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use multidrill::config::EngineConfig;
use multidrill::roster::Player;
use multidrill::session::quiz::{QuestionOutcome, QuizSession};
use multidrill::session::result::QuizResult;
use multidrill::store::schema::serialize_players;

const OUT_DIR: &str = "test-players";
const QUESTIONS_PER_QUIZ: u32 = 5;

// ── Helpers ──────────────────────────────────────────────────────────────

fn base_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 17, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// One quiz per day, starting at `base_date`.
fn quiz_date(day: u32) -> DateTime<Utc> {
    base_date() + chrono::Duration::days(day as i64)
}

/// Play `quizzes` simulated quizzes through the real engine. The player
/// answers correctly with probability `skill` and takes a random share of
/// the answer window.
fn practiced_player(
    name: &str,
    skill: f64,
    quizzes: u32,
    config: &EngineConfig,
    seed: u64,
) -> Result<Player> {
    let mut player = Player::new(name, config)?;
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut session = QuizSession::new(*config, SmallRng::seed_from_u64(seed ^ 0x5eed));
    let mut clock = Instant::now();

    for day in 0..quizzes {
        session.start(QUESTIONS_PER_QUIZ);
        let summary = loop {
            match session.next_question_at(clock, &player.pool)? {
                QuestionOutcome::Finished(summary) => break summary,
                QuestionOutcome::Continue(problem) => {
                    let think = config.timeout.mul_f64(rng.gen_range(0.1..0.9));
                    clock += think;
                    let answer = if rng.gen_bool(skill) {
                        problem.solution
                    } else {
                        problem
                            .proposals
                            .iter()
                            .copied()
                            .find(|&p| p != problem.solution)
                            .unwrap_or(problem.solution)
                    };
                    session.check_answer_at(answer, clock, &mut player.pool)?;
                    clock += Duration::from_millis(1_500);
                }
            }
        };
        let result = QuizResult::at(quiz_date(day), summary.score, summary.accuracy);
        player.history.record(result, config.min_star_pct);
    }
    Ok(player)
}

// ── Rosters ──────────────────────────────────────────────────────────────

fn build_roster_empty() -> Result<Vec<Player>> {
    Ok(Vec::new())
}

fn build_roster_family(config: &EngineConfig) -> Result<Vec<Player>> {
    Ok(vec![
        practiced_player("Florence", 0.55, 6, config, 1)?,
        practiced_player("Léo", 0.8, 12, config, 2)?,
        Player::new("Maman", config)?,
    ])
}

fn build_roster_veteran(config: &EngineConfig) -> Result<Vec<Player>> {
    Ok(vec![practiced_player("Veteran", 0.95, 120, config, 3)?])
}

// ── Main ─────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    fs::create_dir_all(OUT_DIR)?;
    let config = EngineConfig::default();

    let rosters: Vec<(&str, Vec<Player>)> = vec![
        ("01-empty", build_roster_empty()?),
        ("02-family", build_roster_family(&config)?),
        ("03-veteran", build_roster_veteran(&config)?),
    ];

    for (name, players) in &rosters {
        if players.iter().any(|p| p.history.is_empty() || p.pool.is_empty()) {
            bail!("generated roster {name} has an incomplete player");
        }
        let json = serialize_players(players)?;
        let path = format!("{OUT_DIR}/{name}.json");
        fs::write(&path, &json)?;
        println!("Wrote {path} ({} bytes)", json.len());
    }

    println!("\nGenerated {} test rosters.", rosters.len());
    Ok(())
}
