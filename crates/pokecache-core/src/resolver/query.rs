use std::fmt;

use crate::utils::sanitize_text;

/// A normalized name-or-id lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Id(i64),
    Name(String),
}

impl Query {
    /// Trim and lowercase the input, then classify it. Input that parses
    /// entirely as an integer is an id; anything else is a name.
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        Some(match normalized.parse::<i64>() {
            Ok(id) => Query::Id(id),
            Err(_) => Query::Name(normalized),
        })
    }

    /// Path segment used for the network request.
    pub fn as_path(&self) -> String {
        match self {
            Query::Id(id) => id.to_string(),
            Query::Name(name) => name.clone(),
        }
    }

    /// Name as it would be stored: sanitized the same way records are.
    pub fn stored_name(&self) -> Option<String> {
        match self {
            Query::Id(_) => None,
            Query::Name(name) => Some(sanitize_text(name)),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Id(id) => write!(f, "#{}", id),
            Query::Name(name) => f.write_str(name),
        }
    }
}
