//! View rendering dispatch.

pub mod form;
pub mod help;
pub mod table;

use crate::nav::View;
use crate::screen::ScreenSnapshot;
use crate::state::App;
use crate::theme::notification_color;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

const HINT: &str =
    "Tab pantalla • j/k mover • / buscar • n nuevo • e editar • ? ayuda • q salir";

pub fn render_view(f: &mut Frame<'_>, app: &App, snapshot: Option<&ScreenSnapshot>) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);

    if let Some(snapshot) = snapshot {
        table::render(f, app, snapshot, layout[1]);
    }

    render_footer(f, app, layout[2]);

    if let Some(form) = snapshot.and_then(|snapshot| snapshot.form.as_ref()) {
        form::render(f, app, form, layout[1]);
    }

    if app.help_visible {
        help::render(f, app, layout[1]);
    }
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let titles: Vec<Line> = View::all()
        .iter()
        .enumerate()
        .map(|(index, view)| Line::from(format!("{} {}", index + 1, view.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.active_view.index())
        .block(Block::default().borders(Borders::ALL).title("Aula"))
        .style(Style::default().fg(app.theme.text_dim))
        .highlight_style(
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (text, style) = match app.notifications.latest() {
        Some(note) => (
            format!("{}: {}", note.level.label(), note.text()),
            Style::default().fg(notification_color(note.level, &app.theme)),
        ),
        None => (HINT.to_string(), Style::default().fg(app.theme.text_dim)),
    };
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(style);
    f.render_widget(footer, area);
}
