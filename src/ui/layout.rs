use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen split used while a quiz is running.
pub struct QuizLayout {
    pub header: Rect,
    pub progress: Rect,
    pub problem: Rect,
    pub countdown: Rect,
    pub footer: Rect,
}

impl QuizLayout {
    pub fn new(area: Rect) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area);

        Self {
            header: vertical[0],
            progress: vertical[1],
            problem: vertical[2],
            countdown: vertical[3],
            footer: vertical[4],
        }
    }
}

/// Greedily pack key hints into as few lines as fit `width`.
pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = " ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();

    for hint in hints.iter().filter(|h| !h.is_empty()) {
        let candidate = if current.is_empty() {
            format!("{prefix}{hint}")
        } else {
            format!("{current}{separator}{hint}")
        };
        if current.is_empty() || candidate.chars().count() <= width {
            current = candidate;
        } else {
            out.push(std::mem::take(&mut current));
            current = format!("{prefix}{hint}");
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 40;
    const MIN_POPUP_HEIGHT: u16 = 12;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area.x + (area.width - target_w) / 2;
    let top = area.y + (area.height - target_h) / 2;

    Rect::new(left, top, target_w, target_h)
}
