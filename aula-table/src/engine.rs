//! Pure evaluation of a view: filter, then sort, then paginate.

use std::cmp::Ordering;

use crate::column::{Column, FieldValue};
use crate::state::{SortDirection, ViewState};

/// Rows of the visible page and the numbers the pager shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewResult<'a, R> {
    pub rows: Vec<&'a R>,
    /// Rows surviving search and filters, across all pages.
    pub match_count: usize,
    /// At least 1, even with no matches.
    pub total_pages: usize,
    /// The requested page clamped to `1..=total_pages`.
    pub current_page: usize,
    pub page_size: usize,
}

impl<'a, R> ViewResult<'a, R> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_prev_page(&self) -> bool {
        self.current_page > 1
    }
}

/// `ceil(match_count / page_size)`, never less than 1.
pub fn total_pages(match_count: usize, page_size: usize) -> usize {
    match_count.div_ceil(page_size.max(1)).max(1)
}

/// Evaluate `state` over `rows`.
///
/// Search matches case-insensitively against every searchable column and
/// keeps a row when any of them contains the term. Column filters require
/// equality; filters on unknown columns are ignored. Sorting is stable,
/// missing values go last in either direction, and an unknown sort key
/// leaves the order untouched. An out-of-range page is clamped.
pub fn apply_view<'a, R>(
    rows: &'a [R],
    columns: &[Column<R>],
    state: &ViewState,
) -> ViewResult<'a, R> {
    let mut matched: Vec<&'a R> = rows
        .iter()
        .filter(|row| matches_search(*row, columns, &state.search_term))
        .filter(|row| matches_filters(*row, columns, state))
        .collect();

    if let Some(sort) = &state.sort {
        if let Some(column) = columns.iter().find(|c| c.key == sort.key) {
            sort_rows(&mut matched, column, sort.direction);
        }
    }

    let page_size = state.effective_page_size();
    let match_count = matched.len();
    let total_pages = total_pages(match_count, page_size);
    let current_page = state.current_page.clamp(1, total_pages);
    let start = (current_page - 1) * page_size;
    let rows = matched.into_iter().skip(start).take(page_size).collect();

    ViewResult {
        rows,
        match_count,
        total_pages,
        current_page,
        page_size,
    }
}

fn matches_search<R>(row: &R, columns: &[Column<R>], term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    columns
        .iter()
        .filter(|column| column.searchable)
        .any(|column| column.value(row).contains_lowercase(&needle))
}

fn matches_filters<R>(row: &R, columns: &[Column<R>], state: &ViewState) -> bool {
    state.filters.iter().all(|(key, expected)| {
        match columns.iter().find(|column| column.key == key.as_str()) {
            Some(column) => column.value(row).equals_filter(expected),
            None => true,
        }
    })
}

fn sort_rows<R>(rows: &mut Vec<&R>, column: &Column<R>, direction: SortDirection) {
    let mut keyed: Vec<(FieldValue, &R)> = rows
        .drain(..)
        .map(|row| (column.value(row), row))
        .collect();
    // `sort_by` is stable, so equal keys keep their source order.
    keyed.sort_by(|(a, _), (b, _)| compare_directed(a, b, direction));
    rows.extend(keyed.into_iter().map(|(_, row)| row));
}

fn compare_directed(a: &FieldValue, b: &FieldValue, direction: SortDirection) -> Ordering {
    match (a.is_missing(), b.is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match direction {
            SortDirection::Asc => a.compare(b),
            SortDirection::Desc => b.compare(a),
        },
    }
}
