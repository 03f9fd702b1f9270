//! Reusable widget components.

pub mod filter;
pub mod status;

pub use filter::FilterBar;
pub use status::StatusIndicator;
