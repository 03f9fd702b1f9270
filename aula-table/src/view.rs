//! Stateful table view kept by a list screen.

use crate::column::Column;
use crate::engine::{apply_view, ViewResult};
use crate::state::{SortCycle, ViewState};

/// Columns, view state and row selection of one list screen.
///
/// Every [`render`](TableView::render) writes the clamped page back into the
/// state, so a shrinking result set never leaves the pager on a page that
/// no longer exists.
pub struct TableView<R> {
    columns: Vec<Column<R>>,
    state: ViewState,
    cycle: SortCycle,
    total_pages: usize,
    /// Index into the rows of the current page.
    selected: Option<usize>,
}

impl<R> TableView<R> {
    pub fn new(columns: Vec<Column<R>>) -> Self {
        Self::with_state(columns, ViewState::default())
    }

    pub fn with_state(columns: Vec<Column<R>>, state: ViewState) -> Self {
        Self {
            columns,
            state,
            cycle: SortCycle::default(),
            total_pages: 1,
            selected: None,
        }
    }

    pub fn with_sort_cycle(mut self, cycle: SortCycle) -> Self {
        self.cycle = cycle;
        self
    }

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn set_state(&mut self, state: ViewState) {
        self.state = state;
        self.selected = None;
    }

    pub fn sort_cycle(&self) -> SortCycle {
        self.cycle
    }

    /// Evaluate the view over `rows` and adopt the clamped page.
    pub fn render<'a>(&mut self, rows: &'a [R]) -> ViewResult<'a, R> {
        let result = apply_view(rows, &self.columns, &self.state);
        self.state.current_page = result.current_page;
        self.total_pages = result.total_pages;
        self.selected = match (self.selected, result.rows.len()) {
            (_, 0) => None,
            (Some(index), len) => Some(index.min(len - 1)),
            (None, _) => None,
        };
        result
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.state.set_search(term);
        self.selected = None;
    }

    pub fn push_search_char(&mut self, c: char) {
        let mut term = self.state.search_term.clone();
        term.push(c);
        self.set_search(term);
    }

    pub fn pop_search_char(&mut self) {
        let mut term = self.state.search_term.clone();
        term.pop();
        self.set_search(term);
    }

    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.state.set_filter(key, value);
        self.selected = None;
    }

    pub fn reset_filters(&mut self) {
        self.state.reset_filters();
        self.selected = None;
    }

    pub fn toggle_sort(&mut self, key: &str) {
        self.state.toggle_sort(key, self.cycle);
    }

    /// Sort by the column at `index` (as shown, left to right).
    pub fn toggle_sort_at(&mut self, index: usize) {
        if let Some(key) = self.columns.get(index).map(|c| c.key) {
            self.toggle_sort(key);
        }
    }

    pub fn set_page(&mut self, page: usize) {
        let page = page.clamp(1, self.total_pages.max(1));
        if page != self.state.current_page {
            self.state.set_page(page);
            self.selected = None;
        }
    }

    pub fn next_page(&mut self) {
        self.set_page(self.state.current_page + 1);
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.state.current_page.saturating_sub(1));
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn select_next(&mut self, page_len: usize) {
        self.selected = match (self.selected, page_len) {
            (_, 0) => None,
            (Some(index), len) => Some((index + 1) % len),
            (None, _) => Some(0),
        };
    }

    pub fn select_prev(&mut self, page_len: usize) {
        self.selected = match (self.selected, page_len) {
            (_, 0) => None,
            (Some(0), len) | (None, len) => Some(len - 1),
            (Some(index), _) => Some(index - 1),
        };
    }

    /// The selected row of a result produced by [`render`](Self::render).
    pub fn selected_row<'a>(&self, result: &ViewResult<'a, R>) -> Option<&'a R> {
        self.selected.and_then(|index| result.rows.get(index).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    fn view() -> TableView<(u32, &'static str)> {
        TableView::with_state(
            vec![
                Column::number("id", "Id", |r: &(u32, &'static str)| r.0.into()),
                Column::text("name", "Nombre", |r: &(u32, &'static str)| r.1.into()),
            ],
            ViewState::new(2),
        )
    }

    #[test]
    fn test_render_writes_back_clamped_page() {
        let rows = vec![(1, "ana"), (2, "luis"), (3, "ana maria"), (4, "marta")];
        let mut table = view();
        table.render(&rows);
        table.next_page();
        assert_eq!(table.state().current_page, 2);

        // search leaves one page of matches: page clamps instead of resetting
        table.set_search("ana");
        let result = table.render(&rows);
        assert_eq!(result.current_page, 1);
        assert_eq!(table.state().current_page, 1);
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_paging_stays_in_range() {
        let rows = vec![(1, "a"), (2, "b"), (3, "c")];
        let mut table = view();
        table.render(&rows);
        table.prev_page();
        assert_eq!(table.state().current_page, 1);
        table.next_page();
        table.next_page();
        assert_eq!(table.state().current_page, 2);
        let result = table.render(&rows);
        assert_eq!(result.rows, vec![&(3, "c")]);
    }

    #[test]
    fn test_selection_wraps_and_resolves_rows() {
        let rows = vec![(1, "a"), (2, "b")];
        let mut table = view();
        let result = table.render(&rows);
        assert_eq!(table.selected_row(&result), None);
        table.select_next(result.rows.len());
        table.select_next(result.rows.len());
        assert_eq!(table.selected_row(&result), Some(&(2, "b")));
        table.select_next(result.rows.len());
        assert_eq!(table.selected(), Some(0));
        table.select_prev(result.rows.len());
        assert_eq!(table.selected(), Some(1));
    }

    #[test]
    fn test_sort_by_column_index() {
        let rows = vec![(2, "b"), (1, "a")];
        let mut table = view();
        table.toggle_sort_at(0);
        let result = table.render(&rows);
        assert_eq!(result.rows, vec![&(1, "a"), &(2, "b")]);
        table.toggle_sort_at(9);
        assert_eq!(table.state().sort.as_ref().map(|s| s.key.as_str()), Some("id"));
    }
}
