//! Row store - the in-memory table and its per-row edit state
//!
//! `RowStore` owns the ordered record collection. Every record carries an
//! `is_editing` flag and, while editing, a snapshot of its field values taken
//! when editing began. Cancelling an edit restores that snapshot; accepting an
//! edit (a successful commit) drops it.
//!
//! All operations are synchronous. Unknown ids are never an error: mutators
//! report `false`/`None` and leave the table untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub mod schema;

#[cfg(test)]
mod tests;

pub use schema::{CellView, ConfigurationError, FieldKind, FieldSpec, TableSchema};

/// Raw record as supplied by the embedding application (one JSON object per row)
pub type RawRecord = Map<String, Value>;

/// Row store shared between the UI and in-flight commits
pub type SharedRowStore = Arc<Mutex<RowStore>>;

/// Key under which a caller-supplied stable id is read from a raw record
const ID_KEY: &str = "id";

/// Key of the edit flag in serialized records (never stored as a field)
const EDITING_KEY: &str = "isEditing";

/// Names that serialize alongside the fields and cannot be used as one
pub const RESERVED_FIELDS: [&str; 2] = [ID_KEY, EDITING_KEY];

/// True for names that collide with a record's own keys
pub fn is_reserved_field(field: &str) -> bool {
    RESERVED_FIELDS.contains(&field)
}

// ─────────────────────────────────────────────────────────────────────────────
// RowId
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier of a row, unique within one loaded table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RowId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FieldValue
// ─────────────────────────────────────────────────────────────────────────────

/// A scalar cell value
///
/// Select columns hold `Text` values drawn from their option list; numbers
/// are kept as JSON numbers so they round-trip to the persistence payload
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl FieldValue {
    /// Convert a JSON value, returning `None` for null, arrays and objects
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Record
// ─────────────────────────────────────────────────────────────────────────────

/// One row of the table
///
/// Serializes as a flat object (`{"id": 1, "isEditing": true, "name": ...}`),
/// which is the payload handed to persistence providers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    id: RowId,
    is_editing: bool,
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,
    /// Field values captured when editing began
    #[serde(skip)]
    snapshot: Option<BTreeMap<String, FieldValue>>,
}

impl Record {
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            is_editing: false,
            fields: BTreeMap::new(),
            snapshot: None,
        }
    }

    /// Builder-style field setter, mainly for tests and fixtures
    pub fn with_field(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// True while editing and at least one field differs from the pre-edit values
    pub fn has_unsaved_changes(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|original| *original != self.fields)
    }

    fn begin_edit(&mut self) {
        if !self.is_editing {
            self.snapshot = Some(self.fields.clone());
            self.is_editing = true;
        }
    }

    fn accept_edit(&mut self) {
        self.snapshot = None;
        self.is_editing = false;
    }

    /// Settle a successful commit of `persisted`
    ///
    /// Accepts the edit when the row still holds exactly what was sent.
    /// Otherwise the row is (re)opened for editing with the persisted values
    /// as its new baseline, so the later changes still count as unsaved.
    fn accept_persisted(&mut self, persisted: &BTreeMap<String, FieldValue>) -> bool {
        if self.fields == *persisted {
            self.accept_edit();
            return true;
        }
        self.snapshot = Some(persisted.clone());
        self.is_editing = true;
        false
    }

    fn revert_edit(&mut self) {
        if let Some(original) = self.snapshot.take() {
            self.fields = original;
        }
        self.is_editing = false;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RowStore
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered record collection with per-row edit state
#[derive(Debug, Default)]
pub struct RowStore {
    records: Vec<Record>,
    /// Bumped on every load so late commit results can detect a replaced table
    generation: u64,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a store for sharing with the controller and UI
    pub fn shared(self) -> SharedRowStore {
        Arc::new(Mutex::new(self))
    }

    /// Replace the whole collection
    ///
    /// A record keeps a caller-supplied non-negative integer `id`. Records
    /// without one, or whose id was already claimed by an earlier record, get
    /// their positional index, or the next id above the current maximum when
    /// that index is taken. Every record starts read-only.
    ///
    /// Returns the number of records loaded.
    pub fn load(&mut self, rows: Vec<RawRecord>) -> usize {
        let explicit: Vec<Option<u64>> = rows
            .iter()
            .map(|row| row.get(ID_KEY).and_then(Value::as_u64))
            .collect();

        let mut taken: HashSet<u64> = HashSet::with_capacity(rows.len());
        let mut ids: Vec<Option<u64>> = Vec::with_capacity(rows.len());
        for id in &explicit {
            match id {
                Some(id) if taken.insert(*id) => ids.push(Some(*id)),
                Some(id) => {
                    tracing::warn!("Duplicate row id {} in dataset, reassigning", id);
                    ids.push(None);
                }
                None => ids.push(None),
            }
        }

        let mut next_free = taken.iter().max().map_or(0, |max| max + 1);
        let mut records = Vec::with_capacity(rows.len());

        for (index, (row, id)) in rows.into_iter().zip(ids).enumerate() {
            let id = match id {
                Some(id) => id,
                None => {
                    let positional = index as u64;
                    if taken.insert(positional) {
                        positional
                    } else {
                        while taken.contains(&next_free) {
                            next_free += 1;
                        }
                        taken.insert(next_free);
                        next_free
                    }
                }
            };

            let mut record = Record::new(RowId(id));
            for (field, value) in row {
                if field == ID_KEY || field == EDITING_KEY {
                    continue;
                }
                match FieldValue::from_json(&value) {
                    Some(value) => {
                        record.fields.insert(field, value);
                    }
                    None => {
                        tracing::warn!("Row {}: skipping non-scalar field '{}'", id, field);
                    }
                }
            }
            records.push(record);
        }

        self.records = records;
        self.generation += 1;

        tracing::debug!(
            "Loaded {} record(s), generation {}",
            self.records.len(),
            self.generation
        );
        self.records.len()
    }

    /// Replace a single field's value
    ///
    /// Returns false for unknown ids and for the reserved `id` and
    /// `isEditing` names.
    pub fn set_field(&mut self, id: RowId, field: &str, value: FieldValue) -> bool {
        if is_reserved_field(field) {
            tracing::warn!("Refusing to set reserved field '{}' on row {}", field, id);
            return false;
        }
        let Some(record) = self.find_mut(id) else {
            tracing::debug!("set_field on unknown row {}", id);
            return false;
        };
        record.fields.insert(field.to_string(), value);
        true
    }

    /// Flip the edit flag. Leaving edit mode this way is a cancel and
    /// restores the pre-edit values. Returns the new state.
    pub fn toggle_edit(&mut self, id: RowId) -> Option<bool> {
        let record = self.find_mut(id)?;
        if record.is_editing {
            record.revert_edit();
        } else {
            record.begin_edit();
        }
        Some(record.is_editing)
    }

    /// Set the edit flag explicitly
    ///
    /// `false` accepts the current values (commit success), it does not
    /// revert. Returns false for unknown ids.
    pub fn set_edit_state(&mut self, id: RowId, editing: bool) -> bool {
        let Some(record) = self.find_mut(id) else {
            return false;
        };
        if editing {
            record.begin_edit();
        } else if record.is_editing {
            record.accept_edit();
        }
        true
    }

    /// Apply a successful commit of `sent`, a copy of the row taken when the
    /// commit started
    ///
    /// Returns `Some(true)` when the row was accepted and is read-only again,
    /// `Some(false)` when it changed in the meantime (edited, or cancelled)
    /// and stays in edit mode with the persisted values as its baseline.
    /// `None` for unknown ids.
    pub fn settle_commit(&mut self, id: RowId, sent: &Record) -> Option<bool> {
        let record = self.find_mut(id)?;
        Some(record.accept_persisted(&sent.fields))
    }

    /// Leave edit mode, restoring the values from before editing began.
    /// Returns false for unknown ids or rows that are not being edited.
    pub fn cancel_edit(&mut self, id: RowId) -> bool {
        match self.find_mut(id) {
            Some(record) if record.is_editing => {
                record.revert_edit();
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: RowId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Index of a row in load order
    pub fn position(&self, id: RowId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// All records in load order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of rows currently in edit mode
    pub fn editing_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_editing).count()
    }

    fn find_mut(&mut self, id: RowId) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.id == id)
    }
}

/// Lock a shared store, recovering the guard if a previous holder panicked
pub fn lock_store(store: &SharedRowStore) -> MutexGuard<'_, RowStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}
