//! Keybinding overlay.

use crate::keys::HELP;
use crate::state::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let popup = centered(area, 50, HELP.len() as u16 + 2);
    let lines: Vec<Line> = HELP
        .iter()
        .map(|(keys, description)| {
            Line::from(vec![
                Span::styled(format!("{:>10}  ", keys), Style::default().fg(app.theme.primary)),
                Span::raw(*description),
            ])
        })
        .collect();
    let widget = Paragraph::new(lines).block(
        Block::default()
            .title("Atajos [?]")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border_focus)),
    );
    f.render_widget(Clear, popup);
    f.render_widget(widget, popup);
}

pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height.min(area.height)),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width.min(area.width)),
            Constraint::Min(0),
        ])
        .split(vertical[1])[1]
}
