//! Aula Table - Tabular View Engine
//!
//! Turns a slice of rows plus a [`ViewState`] (search term, column filters,
//! sort, page) into the rows of the visible page. [`apply_view`] is a pure
//! function; [`TableView`] is the stateful wrapper list screens keep.

pub mod column;
pub mod engine;
pub mod state;
pub mod view;

pub use column::{Column, ColumnKind, FieldValue};
pub use engine::{apply_view, total_pages, ViewResult};
pub use state::{SortCycle, SortDirection, SortSpec, ViewState, DEFAULT_PAGE_SIZE};
pub use view::TableView;
