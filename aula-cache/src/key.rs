//! Cache keys.
//!
//! A key is an ordered tuple: the resource name followed by zero or more
//! parameter values. Two keys are equal iff every part is deep-equal, and a
//! key matches a pattern iff the pattern's parts are a prefix of the key's
//! parts (`["clase"]` matches every `["clase", id]`).

use std::collections::BTreeMap;
use std::fmt;

/// One component of a [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    /// Named parameters, e.g. list filters `{seccion, estado, search}`.
    /// Ordered so that insertion order never affects equality.
    Params(BTreeMap<String, KeyPart>),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Null => f.write_str("null"),
            KeyPart::Bool(b) => write!(f, "{}", b),
            KeyPart::Int(i) => write!(f, "{}", i),
            KeyPart::Str(s) => write!(f, "{:?}", s),
            KeyPart::Params(params) => {
                f.write_str("{")?;
                for (i, (name, value)) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{}", name, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<i32> for KeyPart {
    fn from(value: i32) -> Self {
        KeyPart::Int(i64::from(value))
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        KeyPart::Int(i64::from(value))
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(KeyPart::Null)
    }
}

/// Address of a cached resource, and the unit of invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    parts: Vec<KeyPart>,
}

impl CacheKey {
    /// Key (or pattern) consisting of just a resource name.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            parts: vec![KeyPart::Str(resource.into())],
        }
    }

    /// Append a positional part, e.g. an entity id.
    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.parts.push(part.into());
        self
    }

    /// Append a named-parameter part. Parameters whose value is
    /// [`KeyPart::Null`] are kept, so "no filter" and "filter absent" only
    /// compare equal when both callers spell them the same way.
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<KeyPart>,
    {
        let map = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.parts.push(KeyPart::Params(map));
        self
    }

    /// The resource name (first part).
    pub fn resource(&self) -> &str {
        match self.parts.first() {
            Some(KeyPart::Str(name)) => name,
            _ => "",
        }
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Array-prefix match: `self` is addressed by `pattern`.
    pub fn matches(&self, pattern: &CacheKey) -> bool {
        self.parts.starts_with(&pattern.parts)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", part)?;
        }
        f.write_str("]")
    }
}
