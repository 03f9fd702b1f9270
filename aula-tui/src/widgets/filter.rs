//! Search prompt and active filter chips.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub struct FilterBar<'a> {
    pub search_term: &'a str,
    pub filters: &'a [(String, String)],
    /// The prompt has keyboard focus.
    pub editing: bool,
    pub active_style: Style,
    pub inactive_style: Style,
}

impl<'a> FilterBar<'a> {
    pub fn spans(&self) -> Vec<Span<'a>> {
        let prompt_style = if self.editing {
            self.active_style.add_modifier(Modifier::BOLD)
        } else {
            self.inactive_style
        };
        let cursor = if self.editing { "▏" } else { "" };
        let mut spans = vec![
            Span::styled("Buscar: ", prompt_style),
            Span::raw(self.search_term),
            Span::styled(cursor, self.active_style),
        ];
        for (key, value) in self.filters {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(format!("[{}={}]", key, value), self.active_style));
        }
        spans
    }

    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let title = if self.editing {
            "Filtros (Enter para terminar)"
        } else {
            "Filtros"
        };
        let paragraph = Paragraph::new(Line::from(self.spans()))
            .block(Block::default().title(title).borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }
}
