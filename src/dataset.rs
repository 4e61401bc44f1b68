//! Dataset loading - the initial record collection
//!
//! A dataset file is a JSON array of objects, one object per row. Without a
//! file the built-in two-person sample table is used.

use crate::grid::RawRecord;
use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use std::path::Path;

/// Read a JSON dataset file
pub fn load_records(path: &Path) -> Result<Vec<RawRecord>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    parse_records(&contents).with_context(|| format!("Invalid dataset {}", path.display()))
}

/// Parse a JSON array of objects
///
/// Non-object entries are an error: silently dropping them would shift
/// positional ids.
pub fn parse_records(contents: &str) -> Result<Vec<RawRecord>> {
    let value: Value = serde_json::from_str(contents).context("Dataset is not valid JSON")?;
    let Value::Array(items) = value else {
        bail!("Dataset must be a JSON array of objects");
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            other => bail!("Entry {} is not an object: {}", index, other),
        })
        .collect()
}

/// The built-in sample table
pub fn sample_records() -> Vec<RawRecord> {
    let rows = json!([
        { "id": 1, "name": "John Doe", "age": 28, "city": "New York", "active": true },
        { "id": 2, "name": "Jane Smith", "age": 32, "city": "Los Angeles", "active": false },
    ]);

    match rows {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
