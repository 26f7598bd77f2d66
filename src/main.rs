use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};
use tracing::info;
use tracing_subscriber::EnvFilter;

use multidrill::app::{App, AppScreen};
use multidrill::config::Config;
use multidrill::event::{AppEvent, EventHandler, TICK_RATE};
use multidrill::store::json_store::JsonStore;
use multidrill::ui::components::chart::ScoreChart;
use multidrill::ui::components::dashboard::Dashboard;
use multidrill::ui::components::player_list::PlayerList;
use multidrill::ui::components::progress_bar::ProgressBar;
use multidrill::ui::components::quiz_area::QuizArea;
use multidrill::ui::layout::{QuizLayout, centered_rect, pack_hint_lines};
use multidrill::ui::line_input::{InputResult, LineInput};
use multidrill::ui::theme::Theme;

#[derive(Parser)]
#[command(name = "multidrill", version, about = "Adaptive multiplication table quiz")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Number of questions per quiz")]
    questions: Option<u32>,

    #[arg(short, long, help = "Start a quiz for this player right away")]
    player: Option<String>,

    #[arg(long, value_name = "FILE", help = "Replace the saved players with this file and exit")]
    import: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Write the saved players to this file and exit")]
    export: Option<PathBuf>,
}

fn init_logging() -> Result<()> {
    let dir = JsonStore::default_dir();
    fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("multidrill.log"))
        .context("cannot open log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("multidrill=info".parse()?))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let mut config = Config::load().unwrap_or_else(|err| {
        eprintln!("Ignoring unreadable config: {err:#}");
        Config::default()
    });
    if let Some(questions) = cli.questions {
        config.question_count = questions;
    }
    if let Some(theme) = cli.theme {
        if Theme::load(&theme).is_none() {
            bail!(
                "unknown theme \"{theme}\" (bundled: {})",
                Theme::available_themes().join(", ")
            );
        }
        config.theme = theme;
    }
    config.validate();

    if cli.import.is_some() || cli.export.is_some() {
        return run_headless(cli.import, cli.export);
    }

    let mut app = App::new(config);
    if let Some(name) = cli.player {
        if !app.roster.contains(&name) {
            bail!("unknown player \"{name}\"");
        }
        app.start_quiz(&name, Instant::now())?;
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(TICK_RATE);
    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }
    Ok(())
}

fn run_headless(import: Option<PathBuf>, export: Option<PathBuf>) -> Result<()> {
    let store = JsonStore::new()?;
    if let Some(path) = import {
        let roster = store.import_from(&path)?;
        println!("Imported {} players from {}", roster.len(), path.display());
    }
    if let Some(path) = export {
        let roster = store.load_roster()?;
        store.export_to(&roster, &path)?;
        println!("Exported {} players to {}", roster.len(), path.display());
    }
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        let (now, key) = match events.next()? {
            AppEvent::Key(key) => (Instant::now(), Some(key)),
            AppEvent::Tick(now) => (now, None),
            AppEvent::Resize => (Instant::now(), None),
        };
        // Expired timers fire before the key that arrived after them.
        let ticked = app.on_tick(now);
        app.report(ticked);
        if let Some(key) = key {
            handle_key(app, key, now);
        }

        if app.should_quit {
            info!("quitting");
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent, now: Instant) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Players => handle_players_key(app, key, now),
        AppScreen::Quiz => handle_quiz_key(app, key, now),
        AppScreen::Reveal => handle_reveal_key(app, key, now),
        AppScreen::GameOver => handle_game_over_key(app, key, now),
    }
}

fn handle_players_key(app: &mut App, key: KeyEvent, now: Instant) {
    if let Some(input) = app.name_input.as_mut() {
        match input.handle(key) {
            InputResult::Continue => {}
            InputResult::Cancel => app.name_input = None,
            InputResult::Submit => {
                let name = input.value().to_string();
                app.name_input = None;
                let added = app.add_player(&name);
                app.report(added);
            }
        }
        return;
    }

    if app.confirm_delete {
        match key.code {
            KeyCode::Char('y') => {
                app.confirm_delete = false;
                let deleted = app.delete_selected();
                app.report(deleted);
            }
            KeyCode::Char('n') | KeyCode::Esc => app.confirm_delete = false,
            _ => {}
        }
        return;
    }

    app.status = None;
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Char('a') => app.name_input = Some(LineInput::new("")),
        KeyCode::Char('d') | KeyCode::Delete => {
            app.confirm_delete = app.selected_name().is_some();
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            if let Some(name) = app.selected_name() {
                let started = app.start_quiz(&name, now);
                app.report(started);
            }
        }
        _ => {}
    }
}

fn handle_quiz_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Esc => app.abandon_quiz(),
        KeyCode::Char(ch @ '1'..='9') => {
            let index = ch as usize - '1' as usize;
            let answered = app.answer(index, now);
            app.report(answered);
        }
        _ => {}
    }
}

fn handle_reveal_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Esc => app.abandon_quiz(),
        KeyCode::Enter | KeyCode::Char(' ') => {
            let advanced = app.advance(now);
            app.report(advanced);
        }
        _ => {}
    }
}

fn handle_game_over_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Char('r') | KeyCode::Enter => {
            if let Some(name) = app.player.clone() {
                let started = app.start_quiz(&name, now);
                app.report(started);
            }
        }
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_players(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Players => render_players(frame, app),
        AppScreen::Quiz | AppScreen::Reveal => render_quiz(frame, app),
        AppScreen::GameOver => render_game_over(frame, app),
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect, info: &str) {
    let colors = &app.theme.colors;
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " multidrill ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info.to_string(),
            Style::default().fg(colors.dim()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: Rect, hints: &[&str]) {
    let colors = &app.theme.colors;
    let lines: Vec<Line> = match &app.status {
        Some(status) => vec![Line::from(Span::styled(
            format!(" {status}"),
            Style::default().fg(colors.error()),
        ))],
        None => pack_hint_lines(hints, area.width as usize)
            .into_iter()
            .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.dim()))))
            .collect(),
    };
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_players(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(area);

    let info = format!(
        " {} players | {} questions per quiz",
        app.roster.len(),
        app.config.question_count
    );
    render_header(frame, app, layout[0], &info);

    let list = PlayerList::new(
        app.roster.players(),
        app.selected,
        app.config.min_star_pct,
        app.theme,
    );
    frame.render_widget(&list, centered_rect(60, 90, layout[1]));

    render_footer(
        frame,
        app,
        layout[2],
        &["[Enter] Play", "[a] Add", "[d] Delete", "[j/k] Move", "[q] Quit"],
    );

    if let Some(input) = &app.name_input {
        let popup = centered_rect(40, 20, area);
        let popup = Rect::new(popup.x, popup.y, popup.width, popup.height.min(5));
        let (before, cursor, after) = input.render_parts();
        let cursor_style = Style::default().fg(colors.bg()).bg(colors.fg());
        let line = Line::from(vec![
            Span::styled(format!(" {before}"), Style::default().fg(colors.fg())),
            Span::styled(cursor.unwrap_or(' ').to_string(), cursor_style),
            Span::styled(after.to_string(), Style::default().fg(colors.fg())),
        ]);
        let block = Block::bordered()
            .title(" New player ")
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(vec![Line::from(""), line]).block(block), popup);
    }

    if app.confirm_delete {
        if let Some(name) = app.selected_name() {
            let popup = centered_rect(40, 20, area);
            let popup = Rect::new(popup.x, popup.y, popup.width, popup.height.min(5));
            let block = Block::bordered()
                .title(" Delete player ")
                .border_style(Style::default().fg(colors.warning()))
                .style(Style::default().bg(colors.bg()));
            let text = vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("Delete {name}? [y/n]"),
                    Style::default().fg(colors.warning()),
                )),
            ];
            frame.render_widget(Clear, popup);
            frame.render_widget(
                Paragraph::new(text)
                    .alignment(Alignment::Center)
                    .block(block),
                popup,
            );
        }
    }
}

fn render_quiz(frame: &mut ratatui::Frame, app: &App) {
    let layout = QuizLayout::new(frame.area());
    let now = Instant::now();
    let session = &app.session;

    let asked = session.total() - session.remaining();
    let info = format!(
        " {} | Question {asked}/{} | Score {}",
        app.player.as_deref().unwrap_or(""),
        session.total(),
        session.score()
    );
    render_header(frame, app, layout.header, &info);

    let progress = ProgressBar::new("Quiz", session.progress(), app.theme)
        .caption(format!("{asked}/{}", session.total()));
    frame.render_widget(progress, layout.progress);

    if let Some(problem) = session.current_problem() {
        let reveal = app.reveal.as_ref().map(|r| r.reveal);
        frame.render_widget(QuizArea::new(problem, reveal, app.theme), layout.problem);
    }

    let total_ms = session.timeout().as_millis() as u64;
    let remaining_ms = app.remaining_ms(now).unwrap_or(0);
    frame.render_widget(
        ProgressBar::countdown(remaining_ms, total_ms, app.theme),
        layout.countdown,
    );

    let hints: &[&str] = match app.screen {
        AppScreen::Reveal => &["[Enter] Next", "[Esc] Stop"],
        _ => &["[1-9] Answer", "[Esc] Stop"],
    };
    render_footer(frame, app, layout.footer, hints);
}

fn render_game_over(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let Some(over) = &app.game_over else {
        return;
    };
    let name = app.player.as_deref().unwrap_or("");

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(8),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, app, layout[0], " Quiz complete");
    frame.render_widget(
        Dashboard::new(name, &over.summary, over.report.as_ref(), app.theme),
        layout[1],
    );

    if let Ok(player) = app.roster.find(name) {
        let mut chart = ScoreChart::new(player.history.results(), app.theme);
        if let Some(report) = &over.report {
            if let Some((from, to)) = report.star_move {
                chart = chart.star_between(from, to, app.star_progress(Instant::now()));
            } else if let Some(at) = report.star_at {
                chart = chart.star_at(at);
            }
        }
        frame.render_widget(chart, layout[2]);
    }

    render_footer(frame, app, layout[3], &["[r] Play again", "[q] Players"]);
}
