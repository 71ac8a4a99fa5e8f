//! Field-level diffs between a stored and a canonical `packages` array.

use serde::Serialize;
use serde_json::Value;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Changes to one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDiff {
    pub record_id: String,
    pub packages: Vec<PackageDiff>,
}

/// Changes to the package at `index`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageDiff {
    pub index: usize,
    pub changes: Vec<FieldChange>,
}

/// One top-level package field that was added, removed or rewritten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FieldChange {
    pub fn is_removal(&self) -> bool {
        self.before.is_some() && self.after.is_none()
    }

    pub fn is_addition(&self) -> bool {
        self.before.is_none() && self.after.is_some()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Diff two `packages` arrays element by element.
///
/// Returns `None` when nothing differs. Non-object elements are compared whole under
/// the field name `.`.
pub fn diff_packages(record_id: &str, before: &Value, after: &Value) -> Option<RecordDiff> {
    let empty = Vec::new();
    let old = before.as_array().unwrap_or(&empty);
    let new = after.as_array().unwrap_or(&empty);

    let packages: Vec<PackageDiff> = (0..old.len().max(new.len()))
        .filter_map(|index| {
            let changes = diff_package(old.get(index), new.get(index));
            (!changes.is_empty()).then_some(PackageDiff { index, changes })
        })
        .collect();

    (!packages.is_empty()).then(|| RecordDiff {
        record_id: record_id.to_string(),
        packages,
    })
}

fn diff_package(before: Option<&Value>, after: Option<&Value>) -> Vec<FieldChange> {
    match (before, after) {
        (Some(Value::Object(old)), Some(Value::Object(new))) => {
            let mut changes = Vec::new();
            for (field, value) in old {
                match new.get(field) {
                    Some(v) if v == value => {}
                    other => changes.push(FieldChange {
                        field: field.clone(),
                        before: Some(value.clone()),
                        after: other.cloned(),
                    }),
                }
            }
            for (field, value) in new {
                if !old.contains_key(field) {
                    changes.push(FieldChange {
                        field: field.clone(),
                        before: None,
                        after: Some(value.clone()),
                    });
                }
            }
            changes
        }
        (old, new) if old == new => Vec::new(),
        (old, new) => vec![FieldChange {
            field: ".".into(),
            before: old.cloned(),
            after: new.cloned(),
        }],
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
