use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::quiz::Problem;
use crate::ui::theme::Theme;

/// What the player did with the problem, once it is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reveal {
    Answered { chosen: u32 },
    TimedOut,
}

/// The problem and its numbered answer choices. With a reveal, the solution
/// is highlighted and a wrong choice is marked.
pub struct QuizArea<'a> {
    problem: &'a Problem,
    reveal: Option<Reveal>,
    theme: &'a Theme,
}

impl<'a> QuizArea<'a> {
    pub fn new(problem: &'a Problem, reveal: Option<Reveal>, theme: &'a Theme) -> Self {
        Self {
            problem,
            reveal,
            theme,
        }
    }

    fn question_line(&self) -> String {
        match self.reveal {
            None => format!("{} = ?", self.problem.pair),
            Some(_) => format!("{} = {}", self.problem.pair, self.problem.solution),
        }
    }

    fn verdict(&self) -> Option<(&'static str, bool)> {
        match self.reveal? {
            Reveal::Answered { chosen } if chosen == self.problem.solution => {
                Some(("Correct!", true))
            }
            Reveal::Answered { .. } => Some(("Not quite.", false)),
            Reveal::TimedOut => Some(("Time's up!", false)),
        }
    }
}

impl Widget for QuizArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let question_color = match self.verdict() {
            Some((_, true)) => colors.correct(),
            Some((_, false)) => colors.incorrect(),
            None => colors.accent(),
        };
        Paragraph::new(Line::from(Span::styled(
            self.question_line(),
            Style::default()
                .fg(question_color)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(layout[1], buf);

        let chosen = match self.reveal {
            Some(Reveal::Answered { chosen }) => Some(chosen),
            _ => None,
        };
        let mut spans = Vec::with_capacity(self.problem.proposals.len() * 2);
        for (i, &value) in self.problem.proposals.iter().enumerate() {
            let style = match self.reveal {
                Some(_) if value == self.problem.solution => Style::default()
                    .fg(colors.bg())
                    .bg(colors.correct())
                    .add_modifier(Modifier::BOLD),
                Some(_) if Some(value) == chosen => Style::default()
                    .fg(colors.incorrect())
                    .bg(colors.incorrect_bg())
                    .add_modifier(Modifier::CROSSED_OUT),
                Some(_) => Style::default().fg(colors.dim()),
                None => Style::default().fg(colors.fg()),
            };
            if i > 0 {
                spans.push(Span::raw("   "));
            }
            spans.push(Span::styled(format!("[{}] {value}", i + 1), style));
        }
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(layout[3], buf);

        if let Some((text, correct)) = self.verdict() {
            let color = if correct {
                colors.success()
            } else {
                colors.error()
            };
            Paragraph::new(Line::from(Span::styled(
                text,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center)
            .render(layout[4], buf);
        }
    }
}
