//! Create/edit form popup.

use crate::forms::FormSnapshot;
use crate::state::App;
use crate::views::help::centered;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, form: &FormSnapshot, area: Rect) {
    let mut lines: Vec<Line> = form
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let marker = if field.required { "*" } else { " " };
            let label = format!("{:>24}{} ", field.label, marker);
            let value_style = if index == form.focused {
                Style::default()
                    .fg(app.theme.text)
                    .bg(app.theme.bg_highlight)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme.text)
            };
            let cursor = if index == form.focused && !form.submitting { "_" } else { "" };
            Line::from(vec![
                Span::styled(label, Style::default().fg(app.theme.text_dim)),
                Span::styled(format!("{}{}", field.value, cursor), value_style),
            ])
        })
        .collect();

    lines.push(Line::from(""));
    if form.submitting {
        lines.push(Line::styled("Guardando…", Style::default().fg(app.theme.info)));
    } else if let Some(error) = &form.error {
        lines.push(Line::styled(error.clone(), Style::default().fg(app.theme.error)));
    } else {
        lines.push(Line::styled(
            "Enter guardar • Tab campo • Esc cerrar",
            Style::default().fg(app.theme.text_dim),
        ));
    }

    let popup = centered(area, 72, lines.len() as u16 + 2);
    let widget = Paragraph::new(lines).block(
        Block::default()
            .title(form.title.as_str())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border_focus)),
    );
    f.render_widget(Clear, popup);
    f.render_widget(widget, popup);
}
