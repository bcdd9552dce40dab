//! Search query model

use crate::error::SearchError;
use crate::store::Document;
use serde::Serialize;
use serde_json::Value;

/// Field searched when none is configured
pub const DEFAULT_FIELD: &str = "Domain";

/// Immutable equality filter: `field == value`
///
/// The value is trimmed on construction and cannot change afterwards; one
/// query is shared by every partition search of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    field: String,
    value: String,
}

impl SearchQuery {
    /// Create a query, rejecting a blank value
    pub fn new(field: impl Into<String>, value: &str) -> Result<Self, SearchError> {
        let field = field.into();
        let value = value.trim();
        if value.is_empty() {
            return Err(SearchError::invalid_input(
                field,
                "Please enter a domain name to search.",
            ));
        }
        Ok(Self {
            field,
            value: value.to_string(),
        })
    }

    /// Create a query on the `Domain` field
    pub fn domain(value: &str) -> Result<Self, SearchError> {
        Self::new(DEFAULT_FIELD, value)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Check whether a stored document satisfies the filter
    pub fn matches(&self, document: &Document) -> bool {
        match document.get(&self.field) {
            Some(Value::String(s)) => *s == self.value,
            Some(Value::Number(n)) => n.to_string() == self.value,
            Some(Value::Bool(b)) => b.to_string() == self.value,
            _ => false,
        }
    }
}
