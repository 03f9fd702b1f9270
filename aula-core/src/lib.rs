//! Aula Core - Entity Types
//!
//! Pure data structures shared by the cache, table and client crates:
//! administrative records, resource naming and the error taxonomy.
//! No I/O lives here.

pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod resource;

pub use entities::*;
pub use enums::{RecordStatus, Shift};
pub use error::{AulaError, AulaResult, ConfigError, FetchError, MutationError};
pub use identity::{Date, EntityId, Timestamp};
pub use resource::{Drafted, Resource};
