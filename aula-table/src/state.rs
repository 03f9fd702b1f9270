//! Serializable view state of a list screen.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

/// What repeated selection of the sorted column does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortCycle {
    /// asc, desc, asc, ...
    #[default]
    Toggle,
    /// asc, desc, unsorted, asc, ...
    TriState,
}

/// Search term, column filters, sort and page of one list screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub search_term: String,
    /// Column key to expected value; empty values are inactive.
    pub filters: BTreeMap<String, String>,
    pub sort: Option<SortSpec>,
    /// 1-indexed.
    pub current_page: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            filters: BTreeMap::new(),
            sort: None,
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Replace the search term. The page is kept and clamped on the next
    /// evaluation.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let key = key.into();
        if value.is_empty() {
            self.filters.remove(&key);
        } else {
            self.filters.insert(key, value);
        }
    }

    pub fn clear_filter(&mut self, key: &str) {
        self.filters.remove(key);
    }

    /// Clear the search term and every column filter and go back to the
    /// first page. Sorting is kept.
    pub fn reset_filters(&mut self) {
        self.search_term.clear();
        self.filters.clear();
        self.current_page = 1;
    }

    pub fn has_active_filters(&self) -> bool {
        !self.search_term.trim().is_empty() || !self.filters.is_empty()
    }

    /// Select `key` as the sort column. Selecting the current column again
    /// advances the direction per `cycle`; a new column starts ascending.
    pub fn toggle_sort(&mut self, key: &str, cycle: SortCycle) {
        self.sort = match self.sort.take() {
            Some(current) if current.key == key => match (cycle, current.direction) {
                (SortCycle::TriState, SortDirection::Desc) => None,
                (_, direction) => Some(SortSpec {
                    key: current.key,
                    direction: direction.toggled(),
                }),
            },
            _ => Some(SortSpec {
                key: key.to_string(),
                direction: SortDirection::Asc,
            }),
        };
    }

    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    pub fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_cycles_between_directions() {
        let mut state = ViewState::default();
        state.toggle_sort("nombres", SortCycle::Toggle);
        assert_eq!(state.sort.as_ref().unwrap().direction, SortDirection::Asc);
        state.toggle_sort("nombres", SortCycle::Toggle);
        assert_eq!(state.sort.as_ref().unwrap().direction, SortDirection::Desc);
        state.toggle_sort("nombres", SortCycle::Toggle);
        assert_eq!(state.sort.as_ref().unwrap().direction, SortDirection::Asc);
    }

    #[test]
    fn test_new_column_resets_to_ascending() {
        let mut state = ViewState::default();
        state.toggle_sort("nombres", SortCycle::Toggle);
        state.toggle_sort("nombres", SortCycle::Toggle);
        state.toggle_sort("dni", SortCycle::Toggle);
        assert_eq!(
            state.sort,
            Some(SortSpec {
                key: "dni".into(),
                direction: SortDirection::Asc
            })
        );
    }

    #[test]
    fn test_tri_state_returns_to_unsorted() {
        let mut state = ViewState::default();
        state.toggle_sort("dni", SortCycle::TriState);
        state.toggle_sort("dni", SortCycle::TriState);
        state.toggle_sort("dni", SortCycle::TriState);
        assert!(state.sort.is_none());
    }

    #[test]
    fn test_reset_filters_keeps_sort() {
        let mut state = ViewState::default();
        state.set_search("ana");
        state.set_filter("estado", "activo");
        state.toggle_sort("dni", SortCycle::Toggle);
        state.set_page(3);
        state.reset_filters();
        assert!(!state.has_active_filters());
        assert_eq!(state.current_page, 1);
        assert!(state.sort.is_some());
    }

    #[test]
    fn test_empty_filter_value_removes_filter() {
        let mut state = ViewState::default();
        state.set_filter("estado", "activo");
        state.set_filter("estado", "");
        assert!(state.filters.is_empty());
    }

    #[test]
    fn test_serde_uses_defaults_for_missing_fields() {
        let state: ViewState = serde_json::from_str(r#"{"search_term":"ana"}"#).unwrap();
        assert_eq!(state.search_term, "ana");
        assert_eq!(state.current_page, 1);
        assert_eq!(state.page_size, DEFAULT_PAGE_SIZE);

        let json = serde_json::to_string(&SortDirection::Desc).unwrap();
        assert_eq!(json, "\"desc\"");
    }
}
