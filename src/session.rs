use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::GridError;
use crate::model::{Field, FlatRecord, RowKey};

pub const TABLE_DATA_KEY: &str = "tableData";
pub const TABLE_EDITS_KEY: &str = "tableEdits";
pub const TABLE_REMARKS_KEY: &str = "tableRemarks";

/// Tab-scoped key/value storage holding JSON strings.
pub trait SessionStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: String);
    fn remove_item(&mut self, key: &str);
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct MemoryStore {
    items: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) {
        self.items.insert(key.to_string(), value);
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

/// Inline edits and remarks layered over the flat rows.
///
/// Entries are keyed by [`RowKey`], so an edit stays attached to its record
/// when the flat order changes under a sort or a filter.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct EditOverlay {
    edits: BTreeMap<RowKey, BTreeMap<Field, String>>,
    remarks: BTreeMap<RowKey, String>,
}

impl EditOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.remarks.is_empty()
    }

    pub fn set_edit(&mut self, key: RowKey, field: Field, value: String) {
        if field == Field::Remarks {
            self.set_remarks(key, value);
            return;
        }
        self.edits.entry(key).or_default().insert(field, value);
    }

    pub fn edit(&self, key: &RowKey, field: Field) -> Option<&str> {
        if field == Field::Remarks {
            return self.remarks(key);
        }
        self.edits
            .get(key)
            .and_then(|fields| fields.get(&field))
            .map(String::as_str)
    }

    pub fn set_remarks(&mut self, key: RowKey, value: String) {
        self.remarks.insert(key, value);
    }

    pub fn remarks(&self, key: &RowKey) -> Option<&str> {
        self.remarks.get(key).map(String::as_str)
    }

    /// Displayed value of a cell: the override when one exists, otherwise
    /// the record's own value.
    pub fn cell_value(&self, record: &FlatRecord, field: Field) -> String {
        let key = record.key();
        match self.edit(&key, field) {
            Some(value) => value.to_string(),
            None => record
                .value(field)
                .map(|value| value.to_string())
                .unwrap_or_default(),
        }
    }

    /// Write both maps under their session keys.
    pub fn save(&self, store: &mut dyn SessionStore) -> Result<(), GridError> {
        let edits: BTreeMap<String, BTreeMap<&str, &str>> = self
            .edits
            .iter()
            .map(|(key, fields)| {
                let fields = fields
                    .iter()
                    .map(|(field, value)| (field.key(), value.as_str()))
                    .collect();
                (key.to_string(), fields)
            })
            .collect();
        let remarks: BTreeMap<String, &str> = self
            .remarks
            .iter()
            .map(|(key, value)| (key.to_string(), value.as_str()))
            .collect();

        store.set_item(TABLE_EDITS_KEY, serde_json::to_string(&edits)?);
        store.set_item(TABLE_REMARKS_KEY, serde_json::to_string(&remarks)?);
        Ok(())
    }

    /// Read both maps back from the session.
    ///
    /// Keys written by older sessions are bare row positions; those are
    /// resolved against `rows` (the current flat order).
    pub fn load<S: SessionStore + ?Sized>(store: &S, rows: &[FlatRecord]) -> Result<Self, GridError> {
        let mut overlay = EditOverlay::new();

        if let Some(raw) = store.get_item(TABLE_EDITS_KEY) {
            let edits: BTreeMap<String, BTreeMap<String, String>> = serde_json::from_str(&raw)?;
            for (raw_key, fields) in edits {
                let Some(key) = resolve_key(&raw_key, rows) else {
                    continue;
                };
                for (raw_field, value) in fields {
                    match raw_field.parse::<Field>() {
                        Ok(field) => overlay.set_edit(key.clone(), field, value),
                        Err(e) => warn!("dropping stored edit for {}: {}", key, e),
                    }
                }
            }
        }

        if let Some(raw) = store.get_item(TABLE_REMARKS_KEY) {
            let remarks: BTreeMap<String, String> = serde_json::from_str(&raw)?;
            for (raw_key, value) in remarks {
                if let Some(key) = resolve_key(&raw_key, rows) {
                    overlay.set_remarks(key, value);
                }
            }
        }

        Ok(overlay)
    }
}

fn resolve_key(raw: &str, rows: &[FlatRecord]) -> Option<RowKey> {
    if let Ok(position) = raw.parse::<usize>() {
        let key = rows.get(position).map(FlatRecord::key);
        if key.is_none() {
            warn!("stored overlay row {} is outside the current view", position);
        }
        return key;
    }
    match raw.parse::<RowKey>() {
        Ok(key) => Some(key),
        Err(e) => {
            warn!("dropping stored overlay entry: {}", e);
            None
        }
    }
}
