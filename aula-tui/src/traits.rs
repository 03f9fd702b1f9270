//! Common traits for TUI components

use crate::keys::Action;
use crate::nav::View;
use crate::screen::ScreenSnapshot;
use aula_core::MutationError;
use aula_table::ViewState;

/// A list screen the application can switch to.
///
/// Implemented by [`crate::screen::ResourceScreen`] for every resource, so
/// the application keeps the six screens behind one object type.
pub trait Screen {
    fn view(&self) -> View;

    /// Evaluate the table over the current data for drawing.
    fn snapshot(&mut self) -> ScreenSnapshot;

    /// Search, filters, sort and page, for persistence.
    fn view_state(&self) -> &ViewState;

    /// Handle a screen-level action. Write actions that cannot start (a
    /// write for the record is already pending) return the rejection.
    fn apply(&mut self, action: Action) -> Result<(), MutationError>;

    /// Mark the collection stale and reload it. Returns the number of cache
    /// entries invalidated.
    fn refresh(&self) -> usize;

    /// Revalidate in the background if the data is missing or stale.
    fn ensure_fresh(&self) -> bool;

    /// Whether the cache entry changed since the last [`mark_seen`](Self::mark_seen).
    fn has_changed(&self) -> bool;

    fn mark_seen(&mut self);

    /// A create or edit form is open and takes the keyboard.
    fn has_form(&self) -> bool;
}
