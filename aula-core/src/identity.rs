//! Identity types for Aula entities

use chrono::{DateTime, NaiveDate, Utc};

/// Backend-assigned numeric identifier shared by every resource.
pub type EntityId = i64;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Calendar date without time of day (birth dates, period bounds).
pub type Date = NaiveDate;
