//! Generic list screen: filter bar, table, status line.

use crate::keys::InputMode;
use crate::screen::ScreenSnapshot;
use crate::state::App;
use crate::theme::record_status_color;
use crate::widgets::{FilterBar, StatusIndicator};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, snapshot: &ScreenSnapshot, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    FilterBar {
        search_term: &snapshot.search_term,
        filters: &snapshot.filters,
        editing: app.mode == InputMode::Search,
        active_style: Style::default().fg(app.theme.primary),
        inactive_style: Style::default().fg(app.theme.text_dim),
    }
    .render(f, chunks[0]);

    let block = Block::default()
        .title(snapshot.view.title())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_focus));

    if snapshot.rows.is_empty() {
        let message = if snapshot.is_loading {
            "Cargando…"
        } else if snapshot.error.is_some() {
            "No se pudieron cargar los datos"
        } else {
            "Sin resultados"
        };
        let empty = Paragraph::new(message)
            .style(Style::default().fg(app.theme.text_dim))
            .block(block);
        f.render_widget(empty, chunks[1]);
    } else {
        render_rows(f, app, snapshot, block, chunks[1]);
    }

    StatusIndicator::from_snapshot(
        snapshot,
        Style::default().fg(app.theme.text_dim),
        Style::default().fg(app.theme.warning),
        Style::default().fg(app.theme.error),
    )
    .render(f, chunks[2]);
}

fn render_rows(f: &mut Frame<'_>, app: &App, snapshot: &ScreenSnapshot, block: Block, area: Rect) {
    let header = Row::new(snapshot.headers.iter().enumerate().map(|(index, label)| {
        let style = if index == snapshot.focused_column {
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(app.theme.secondary)
        };
        Cell::from(Span::styled(label.clone(), style))
    }));

    let rows = snapshot.rows.iter().map(|row| {
        let mut style = Style::default().fg(record_status_color(row.status, &app.theme));
        if row.pending {
            style = style.add_modifier(Modifier::DIM | Modifier::ITALIC);
        }
        Row::new(row.cells.iter().map(|cell| Cell::from(cell.clone()))).style(style)
    });

    let count = snapshot.headers.len().max(1) as u32;
    let widths: Vec<Constraint> = (0..count).map(|_| Constraint::Ratio(1, count)).collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(Style::default().bg(app.theme.bg_highlight))
        .highlight_symbol("› ");

    let mut state = TableState::default().with_selected(snapshot.selected);
    f.render_stateful_widget(table, area, &mut state);
}
