use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::roster::Player;
use crate::ui::theme::Theme;

pub const STAR: &str = "\u{2605}";

pub struct PlayerList<'a> {
    pub players: &'a [Player],
    pub selected: usize,
    pub min_star_pct: f64,
    pub theme: &'a Theme,
}

impl<'a> PlayerList<'a> {
    pub fn new(players: &'a [Player], selected: usize, min_star_pct: f64, theme: &'a Theme) -> Self {
        Self {
            players,
            selected,
            min_star_pct,
            theme,
        }
    }

    /// First row shown so that `selected` stays visible in `rows` lines.
    fn scroll_offset(&self, rows: usize) -> usize {
        if rows == 0 {
            return 0;
        }
        self.selected.saturating_sub(rows - 1)
    }
}

impl Widget for &PlayerList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Players ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(inner);

        let title = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "multidrill",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Times tables that adapt to you",
                Style::default().fg(colors.fg()),
            )),
        ])
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        if self.players.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "No players yet. Press [a] to add one.",
                Style::default().fg(colors.dim()),
            )))
            .alignment(Alignment::Center)
            .render(layout[1], buf);
            return;
        }

        let rows = layout[1].height as usize;
        let offset = self.scroll_offset(rows);
        let lines: Vec<Line> = self
            .players
            .iter()
            .enumerate()
            .skip(offset)
            .take(rows)
            .map(|(i, player)| {
                let is_selected = i == self.selected;
                let indicator = if is_selected { ">" } else { " " };
                let best = player.history.high_score();
                let star = if best.is_star_eligible(self.min_star_pct) && best.score > 0 {
                    STAR
                } else {
                    " "
                };
                let played = player.history.len().saturating_sub(1);

                let name_style = if is_selected {
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.fg())
                };
                Line::from(vec![
                    Span::styled(format!(" {indicator} {:<24}", player.name()), name_style),
                    Span::styled(format!("{:>7} ", best.score), Style::default().fg(colors.fg())),
                    Span::styled(star, Style::default().fg(colors.star())),
                    Span::styled(
                        format!("  {played} quizzes"),
                        Style::default().fg(colors.dim()),
                    ),
                ])
            })
            .collect();

        Paragraph::new(lines).render(layout[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::session::result::QuizResult;

    fn render_to_string(list: &PlayerList, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        list.render(area, &mut buf);
        let mut out = String::new();
        for y in 0..height {
            for x in 0..width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_lists_players_with_star() {
        let theme = Theme::default();
        let mut ada = Player::new("Ada", &EngineConfig::default()).unwrap();
        ada.history.append(QuizResult::new(120, 0.8));
        let bob = Player::new("Bob", &EngineConfig::default()).unwrap();
        let players = vec![ada, bob];

        let list = PlayerList::new(&players, 1, 0.6, &theme);
        let screen = render_to_string(&list, 70, 10);
        assert!(screen.contains("Ada"));
        assert!(screen.contains("> Bob"));
        assert!(screen.contains(STAR));
        assert!(screen.contains("1 quizzes"));
    }

    #[test]
    fn test_empty_roster_hint() {
        let theme = Theme::default();
        let list = PlayerList::new(&[], 0, 0.6, &theme);
        assert!(render_to_string(&list, 60, 10).contains("No players yet"));
    }

    #[test]
    fn test_scroll_keeps_selection_visible() {
        let theme = Theme::default();
        let list = PlayerList::new(&[], 7, 0.6, &theme);
        assert_eq!(list.scroll_offset(3), 5);
        assert_eq!(list.scroll_offset(10), 0);
    }
}
