//! Projection of heterogeneous records onto one tabular schema

use super::types::Record;
use serde::Serialize;
use std::collections::HashSet;

/// Records reshaped to a uniform column set
///
/// Columns are the canonical fields in canonical order, followed by every
/// other field in the order it was first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl NormalizedTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Convert rows back into records carrying every column
    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| Record::from_pairs(self.columns.iter().cloned().zip(row.iter().cloned())))
            .collect()
    }
}

/// Normalize records to the canonical schema
pub fn normalize<S: AsRef<str>>(records: &[Record], canonical: &[S]) -> NormalizedTable {
    let mut columns: Vec<String> = Vec::with_capacity(canonical.len());
    let mut seen: HashSet<String> = HashSet::new();

    for field in canonical {
        let field = field.as_ref();
        if seen.insert(field.to_string()) {
            columns.push(field.to_string());
        }
    }

    for record in records {
        for field in record.fields() {
            if !seen.contains(field) {
                seen.insert(field.to_string());
                columns.push(field.to_string());
            }
        }
    }

    let rows = records
        .iter()
        .map(|record| columns.iter().map(|c| record.text(c)).collect())
        .collect();

    NormalizedTable { columns, rows }
}
