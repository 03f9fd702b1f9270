//! Loading, error and pager indicator shown under a table.

use crate::screen::ScreenSnapshot;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub struct StatusIndicator {
    pub state: String,
    pub pager: String,
    pub style: Style,
}

impl StatusIndicator {
    pub fn from_snapshot(
        snapshot: &ScreenSnapshot,
        normal: Style,
        busy: Style,
        failed: Style,
    ) -> Self {
        let (state, style) = if let Some(error) = &snapshot.error {
            (format!("Error: {}", error), failed)
        } else if snapshot.is_loading {
            ("Cargando…".to_string(), busy)
        } else if snapshot.is_fetching {
            ("Actualizando…".to_string(), busy)
        } else if snapshot.is_optimistic {
            ("Guardando…".to_string(), busy)
        } else {
            (String::new(), normal)
        };
        let pager = format!(
            "Página {}/{} · {} de {} registros",
            snapshot.current_page, snapshot.total_pages, snapshot.match_count, snapshot.total_count
        );
        Self {
            state,
            pager,
            style,
        }
    }

    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let mut spans = vec![Span::raw(self.pager.clone())];
        if !self.state.is_empty() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(self.state.clone(), self.style));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
