use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Widget};

use crate::ui::theme::Theme;

pub struct ProgressBar<'a> {
    pub label: String,
    pub ratio: f64,
    /// Text drawn in the middle of the bar; a percentage when unset.
    pub caption: Option<String>,
    pub fill: Option<Color>,
    pub theme: &'a Theme,
}

impl<'a> ProgressBar<'a> {
    pub fn new(label: &str, ratio: f64, theme: &'a Theme) -> Self {
        Self {
            label: label.to_string(),
            ratio: if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) },
            caption: None,
            fill: None,
            theme,
        }
    }

    pub fn caption(mut self, caption: String) -> Self {
        self.caption = Some(caption);
        self
    }

    pub fn fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    /// A bar draining from full to empty as `remaining_ms` runs out.
    pub fn countdown(remaining_ms: u64, total_ms: u64, theme: &'a Theme) -> Self {
        let ratio = if total_ms == 0 {
            0.0
        } else {
            remaining_ms as f64 / total_ms as f64
        };
        let colors = &theme.colors;
        let fill = if ratio <= 0.25 {
            colors.error()
        } else if ratio <= 0.5 {
            colors.warning()
        } else {
            colors.bar_filled()
        };
        Self::new("Time", ratio, theme)
            .caption(format!("{:.1}s", remaining_ms as f64 / 1000.0))
            .fill(fill)
    }
}

impl Widget for ProgressBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.label))
            .border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let fill = self.fill.unwrap_or_else(|| colors.bar_filled());
        let filled_width = (self.ratio * inner.width as f64).round() as u16;
        let caption = self
            .caption
            .unwrap_or_else(|| format!("{:.0}%", self.ratio * 100.0));

        for x in inner.x..inner.x + inner.width {
            let style = if x < inner.x + filled_width {
                Style::default().fg(colors.bg()).bg(fill)
            } else {
                Style::default().fg(colors.fg()).bg(colors.bar_empty())
            };
            buf[(x, inner.y)].set_style(style);
        }

        let caption_width = caption.chars().count() as u16;
        let caption_x = inner.x + inner.width.saturating_sub(caption_width) / 2;
        buf.set_stringn(
            caption_x,
            inner.y,
            &caption,
            inner.width as usize,
            Style::default(),
        );
    }
}
