//! Column descriptors and cell values.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

/// Value of one cell, as seen by search, filters and sorting.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Missing,
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    /// Interpret the value according to the column kind. Text that parses
    /// as a number (or ISO date) is compared as one.
    pub fn coerce(self, kind: ColumnKind) -> Self {
        match (kind, self) {
            (ColumnKind::Number, FieldValue::Text(text)) => match text.trim().parse::<f64>() {
                Ok(number) => FieldValue::Number(number),
                Err(_) => FieldValue::Text(text),
            },
            (ColumnKind::Date, FieldValue::Text(text)) => {
                match NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d") {
                    Ok(date) => FieldValue::Date(date),
                    Err(_) => FieldValue::Text(text),
                }
            }
            (_, value) => value,
        }
    }

    /// Case-insensitive substring match; `needle` must already be lowercase.
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        match self {
            FieldValue::Missing => false,
            FieldValue::Text(text) => text.to_lowercase().contains(needle),
            other => other.to_string().to_lowercase().contains(needle),
        }
    }

    /// Equality against a filter value typed by the user.
    pub fn equals_filter(&self, expected: &str) -> bool {
        match self {
            FieldValue::Missing => false,
            FieldValue::Text(text) => text == expected,
            FieldValue::Number(number) => expected
                .trim()
                .parse::<f64>()
                .is_ok_and(|wanted| wanted == *number),
            FieldValue::Date(date) => NaiveDate::parse_from_str(expected.trim(), "%Y-%m-%d")
                .is_ok_and(|wanted| wanted == *date),
        }
    }

    /// Ordering of two present values. Numbers and dates compare by value,
    /// text compares case-sensitively; mixed kinds compare as text.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Missing, FieldValue::Missing) => Ordering::Equal,
            (FieldValue::Missing, _) => Ordering::Greater,
            (_, FieldValue::Missing) => Ordering::Less,
            (a, b) => a.to_string().cmp(&b.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => {
                write!(f, "{}", *number as i64)
            }
            FieldValue::Number(number) => write!(f, "{}", number),
            FieldValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            FieldValue::Missing => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Missing, Into::into)
    }
}

/// How a column's values are compared and aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnKind {
    #[default]
    Text,
    Number,
    Date,
}

/// A column of a list screen: where its value comes from and how it
/// participates in search and sorting.
pub struct Column<R> {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ColumnKind,
    pub searchable: bool,
    accessor: fn(&R) -> FieldValue,
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Column<R> {}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("searchable", &self.searchable)
            .finish()
    }
}

impl<R> Column<R> {
    pub fn new(
        key: &'static str,
        label: &'static str,
        kind: ColumnKind,
        accessor: fn(&R) -> FieldValue,
    ) -> Self {
        Self {
            key,
            label,
            kind,
            searchable: kind == ColumnKind::Text,
            accessor,
        }
    }

    /// Searchable text column.
    pub fn text(key: &'static str, label: &'static str, accessor: fn(&R) -> FieldValue) -> Self {
        Self::new(key, label, ColumnKind::Text, accessor)
    }

    pub fn number(key: &'static str, label: &'static str, accessor: fn(&R) -> FieldValue) -> Self {
        Self::new(key, label, ColumnKind::Number, accessor)
    }

    pub fn date(key: &'static str, label: &'static str, accessor: fn(&R) -> FieldValue) -> Self {
        Self::new(key, label, ColumnKind::Date, accessor)
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// Value of this column for `row`, interpreted per the column kind.
    pub fn value(&self, row: &R) -> FieldValue {
        (self.accessor)(row).coerce(self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_text_sorts_as_number() {
        let nine = FieldValue::from("9").coerce(ColumnKind::Number);
        let ten = FieldValue::from("10").coerce(ColumnKind::Number);
        assert_eq!(nine.compare(&ten), Ordering::Less);
        assert_eq!(
            FieldValue::from("9").compare(&FieldValue::from("10")),
            Ordering::Greater
        );
    }

    #[test]
    fn test_dates_compare_chronologically() {
        let march = FieldValue::from("2024-03-01").coerce(ColumnKind::Date);
        let december = FieldValue::from("2023-12-31").coerce(ColumnKind::Date);
        assert_eq!(december.compare(&march), Ordering::Less);
    }

    #[test]
    fn test_missing_sorts_after_present() {
        assert_eq!(
            FieldValue::Missing.compare(&FieldValue::from("a")),
            Ordering::Greater
        );
        assert_eq!(
            FieldValue::from(1.0).compare(&FieldValue::Missing),
            Ordering::Less
        );
    }

    #[test]
    fn test_search_is_case_insensitive() {
        assert!(FieldValue::from("Ana Torres").contains_lowercase("ana"));
        assert!(FieldValue::from(42_i64).contains_lowercase("42"));
        assert!(!FieldValue::Missing.contains_lowercase(""));
    }

    #[test]
    fn test_filter_equality() {
        assert!(FieldValue::from("activo").equals_filter("activo"));
        assert!(!FieldValue::from("activo").equals_filter("Activo"));
        assert!(FieldValue::from(20_i64).equals_filter("20"));
        assert!(FieldValue::from(NaiveDate::from_ymd_opt(2024, 3, 1))
            .equals_filter("2024-03-01"));
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::from(20_i64).to_string(), "20");
        assert_eq!(FieldValue::from(2.5).to_string(), "2.5");
        assert_eq!(FieldValue::Missing.to_string(), "");
    }
}
