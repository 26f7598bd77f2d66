use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType, Widget};

use crate::session::result::QuizResult;
use crate::ui::theme::Theme;

/// Score of every quiz a player took, with the high-score star drawn on top.
pub struct ScoreChart<'a> {
    points: Vec<(f64, f64)>,
    /// Position of the star along the x axis; fractional while it travels.
    star: Option<f64>,
    theme: &'a Theme,
}

impl<'a> ScoreChart<'a> {
    pub fn new(results: &[QuizResult], theme: &'a Theme) -> Self {
        let points = results
            .iter()
            .enumerate()
            .map(|(i, r)| (i as f64, r.score as f64))
            .collect();
        Self {
            points,
            star: None,
            theme,
        }
    }

    /// Place the star `progress` of the way from one result to another.
    pub fn star_between(mut self, from: usize, to: usize, progress: f64) -> Self {
        let t = progress.clamp(0.0, 1.0);
        self.star = Some(from as f64 + (to as f64 - from as f64) * t);
        self
    }

    pub fn star_at(self, index: usize) -> Self {
        self.star_between(index, index, 1.0)
    }

    /// Score on the polyline at a (possibly fractional) x.
    fn score_at(&self, x: f64) -> f64 {
        let lower = x.floor().max(0.0) as usize;
        let Some(&(_, y0)) = self.points.get(lower) else {
            return 0.0;
        };
        match self.points.get(lower + 1) {
            Some(&(_, y1)) => y0 + (y1 - y0) * (x - lower as f64),
            None => y0,
        }
    }
}

impl Widget for ScoreChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(" Scores ")
            .border_style(Style::default().fg(colors.border()));

        if self.points.is_empty() {
            block.render(area, buf);
            return;
        }

        let max_x = (self.points.len().saturating_sub(1) as f64).max(1.0);
        let max_y = self
            .points
            .iter()
            .map(|(_, y)| *y)
            .fold(0.0f64, f64::max)
            .max(10.0);

        let star_point: Vec<(f64, f64)> = self
            .star
            .map(|x| vec![(x, self.score_at(x))])
            .unwrap_or_default();

        let mut datasets = vec![
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(colors.accent()))
                .data(&self.points),
        ];
        if !star_point.is_empty() {
            datasets.push(
                Dataset::default()
                    .name("high score")
                    .marker(symbols::Marker::Dot)
                    .graph_type(GraphType::Scatter)
                    .style(
                        Style::default()
                            .fg(colors.star())
                            .add_modifier(Modifier::BOLD),
                    )
                    .data(&star_point),
            );
        }

        Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .title("Quiz #")
                    .style(Style::default().fg(colors.dim()))
                    .bounds([0.0, max_x]),
            )
            .y_axis(
                Axis::default()
                    .title("Score")
                    .style(Style::default().fg(colors.dim()))
                    .labels(["0".to_string(), format!("{max_y:.0}")])
                    .bounds([0.0, max_y * 1.1]),
            )
            .render(area, buf);
    }
}
