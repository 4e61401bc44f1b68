//! Column configuration and the per-cell projection handed to the UI
//!
//! A `TableSchema` never refuses a configuration. Problems are reported by
//! [`TableSchema::problems`] and the affected cells degrade to a disabled
//! display of their current value.

use super::{is_reserved_field, FieldValue, Record};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Widget kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Checkbox,
    Select,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Checkbox => "checkbox",
            Self::Select => "select",
        }
    }
}

/// Static definition of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Record field this column reads and writes
    pub field: String,
    /// Header text
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Choices for `select` columns, in display order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl FieldSpec {
    pub fn text(field: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            display_name: display_name.into(),
            kind: FieldKind::Text,
            options: None,
        }
    }

    pub fn checkbox(field: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            display_name: display_name.into(),
            kind: FieldKind::Checkbox,
            options: None,
        }
    }

    pub fn select(
        field: impl Into<String>,
        display_name: impl Into<String>,
        options: Vec<String>,
    ) -> Self {
        Self {
            field: field.into(),
            display_name: display_name.into(),
            kind: FieldKind::Select,
            options: Some(options),
        }
    }

    /// A select column with no usable options, or one bound to a reserved
    /// name, cannot offer an editor
    pub fn is_degraded(&self) -> bool {
        is_reserved_field(&self.field)
            || (self.kind == FieldKind::Select && self.options.as_ref().map_or(true, Vec::is_empty))
    }

    /// Next value of a checkbox cell. Anything that is not `true` counts as unchecked.
    pub fn toggled(&self, current: Option<&FieldValue>) -> Option<FieldValue> {
        if self.kind != FieldKind::Checkbox {
            return None;
        }
        let checked = current.and_then(FieldValue::as_bool).unwrap_or(false);
        Some(FieldValue::Bool(!checked))
    }

    /// Next option of a select cell, wrapping around
    ///
    /// A current value outside the option list moves to the first option.
    pub fn next_choice(&self, current: Option<&FieldValue>) -> Option<FieldValue> {
        if self.kind != FieldKind::Select || self.is_degraded() {
            return None;
        }
        let options = self.options.as_deref()?;
        let current = current.map(ToString::to_string);
        let next = match current.and_then(|c| options.iter().position(|o| *o == c)) {
            Some(idx) => (idx + 1) % options.len(),
            None => 0,
        };
        options.get(next).map(|o| FieldValue::Text(o.clone()))
    }
}

/// A configuration problem. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A `select` column without options
    MissingOptions { field: String },
    /// Two columns bound to the same field
    DuplicateField { field: String },
    /// A column with an empty field name
    EmptyFieldName { index: usize },
    /// A column bound to `id` or `isEditing`
    ReservedField { field: String },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOptions { field } => {
                write!(f, "select column '{}' has no options", field)
            }
            Self::DuplicateField { field } => {
                write!(f, "field '{}' is bound to more than one column", field)
            }
            Self::EmptyFieldName { index } => write!(f, "column {} has an empty field name", index),
            Self::ReservedField { field } => {
                write!(f, "field '{}' is reserved and cannot be edited", field)
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// What the presentation layer needs to draw one cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellView<'a> {
    pub spec: &'a FieldSpec,
    pub value: Option<&'a FieldValue>,
    /// Widget accepts input (row is editing and the column is usable)
    pub editable: bool,
    /// Column is misconfigured; show the value only, disabled
    pub degraded: bool,
}

impl CellView<'_> {
    /// Text shown for the cell
    pub fn display(&self) -> String {
        match (self.spec.kind, self.value) {
            (FieldKind::Checkbox, value) => {
                let checked = value.and_then(FieldValue::as_bool).unwrap_or(false);
                let mark = if checked { "[x]" } else { "[ ]" };
                mark.to_string()
            }
            (_, Some(value)) => value.to_string(),
            (_, None) => String::new(),
        }
    }
}

/// Ordered column definitions for one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSchema {
    fields: Vec<FieldSpec>,
}

impl TableSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column at a display index
    pub fn column(&self, index: usize) -> Option<&FieldSpec> {
        self.fields.get(index)
    }

    /// Column bound to a field (first match)
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.field == name)
    }

    /// All configuration problems, in column order
    pub fn problems(&self) -> Vec<ConfigurationError> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();

        for (index, spec) in self.fields.iter().enumerate() {
            if spec.field.trim().is_empty() {
                problems.push(ConfigurationError::EmptyFieldName { index });
                continue;
            }
            if !seen.insert(spec.field.as_str()) {
                problems.push(ConfigurationError::DuplicateField {
                    field: spec.field.clone(),
                });
            }
            if is_reserved_field(&spec.field) {
                problems.push(ConfigurationError::ReservedField {
                    field: spec.field.clone(),
                });
                continue;
            }
            if spec.is_degraded() {
                problems.push(ConfigurationError::MissingOptions {
                    field: spec.field.clone(),
                });
            }
        }
        problems
    }

    /// Cell projection of one record, one entry per column
    pub fn cells<'a>(&'a self, record: &'a Record) -> Vec<CellView<'a>> {
        self.fields
            .iter()
            .map(|spec| {
                let degraded = spec.is_degraded();
                CellView {
                    spec,
                    value: record.get(&spec.field),
                    editable: record.is_editing() && !degraded,
                    degraded,
                }
            })
            .collect()
    }
}
