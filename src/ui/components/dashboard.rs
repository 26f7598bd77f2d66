use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::history::StarReport;
use crate::session::quiz::SessionSummary;
use crate::ui::components::player_list::STAR;
use crate::ui::theme::Theme;

/// End-of-quiz figures and the high-score news.
pub struct Dashboard<'a> {
    pub player: &'a str,
    pub summary: &'a SessionSummary,
    pub report: Option<&'a StarReport>,
    pub theme: &'a Theme,
}

impl<'a> Dashboard<'a> {
    pub fn new(
        player: &'a str,
        summary: &'a SessionSummary,
        report: Option<&'a StarReport>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            player,
            summary,
            report,
            theme,
        }
    }

    fn headline(&self) -> Option<String> {
        let report = self.report?;
        if report.perfect {
            Some(format!("{STAR} Perfect round! {STAR}"))
        } else if report.current.index != report.previous.index {
            Some(format!("New high score: {}", report.current.score))
        } else {
            None
        }
    }
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" Well played, {} ", self.player))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        if let Some(headline) = self.headline() {
            Paragraph::new(Line::from(Span::styled(
                headline,
                Style::default()
                    .fg(colors.star())
                    .add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center)
            .render(layout[0], buf);
        }

        let score_line = Line::from(vec![
            Span::styled("  Score:    ", Style::default().fg(colors.fg())),
            Span::styled(
                self.summary.score.to_string(),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        Paragraph::new(score_line).render(layout[1], buf);

        let accuracy = self.summary.accuracy * 100.0;
        let acc_color = if accuracy >= 100.0 {
            colors.success()
        } else if accuracy >= 50.0 {
            colors.warning()
        } else {
            colors.error()
        };
        let acc_line = Line::from(vec![
            Span::styled("  Accuracy: ", Style::default().fg(colors.fg())),
            Span::styled(
                format!("{accuracy:.0}%"),
                Style::default().fg(acc_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ({}/{} correct)", self.summary.correct, self.summary.total),
                Style::default().fg(colors.dim()),
            ),
        ]);
        Paragraph::new(acc_line).render(layout[2], buf);

        if let Some(report) = self.report {
            let best_line = Line::from(vec![
                Span::styled("  Best:     ", Style::default().fg(colors.fg())),
                Span::styled(
                    report.current.score.to_string(),
                    Style::default().fg(colors.fg()),
                ),
            ]);
            Paragraph::new(best_line).render(layout[3], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::history::PlayerHistory;
    use crate::session::result::QuizResult;

    fn screen(dashboard: Dashboard) -> String {
        let area = Rect::new(0, 0, 50, 8);
        let mut buf = Buffer::empty(area);
        dashboard.render(area, &mut buf);
        (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|pos| buf[pos].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_new_high_score_headline() {
        let theme = Theme::default();
        let mut history = PlayerHistory::new();
        let report = history.record(QuizResult::new(90, 0.8), 0.6);
        let summary = SessionSummary {
            score: 90,
            accuracy: 0.8,
            correct: 4,
            total: 5,
        };
        let out = screen(Dashboard::new("Ada", &summary, Some(&report), &theme));
        assert!(out.contains("New high score: 90"));
        assert!(out.contains("(4/5 correct)"));
        assert!(out.contains("80%"));
    }

    #[test]
    fn test_perfect_round_headline() {
        let theme = Theme::default();
        let mut history = PlayerHistory::new();
        let report = history.record(QuizResult::new(150, 1.0), 0.6);
        let summary = SessionSummary {
            score: 150,
            accuracy: 1.0,
            correct: 5,
            total: 5,
        };
        let out = screen(Dashboard::new("Ada", &summary, Some(&report), &theme));
        assert!(out.contains("Perfect round!"));
    }

    #[test]
    fn test_no_headline_without_improvement() {
        let theme = Theme::default();
        let mut history = PlayerHistory::new();
        history.record(QuizResult::new(150, 0.8), 0.6);
        let report = history.record(QuizResult::new(20, 0.2), 0.6);
        let summary = SessionSummary {
            score: 20,
            accuracy: 0.2,
            correct: 1,
            total: 5,
        };
        let dashboard = Dashboard::new("Ada", &summary, Some(&report), &theme);
        assert_eq!(dashboard.headline(), None);
    }
}
