//! Captured clinical data records and their audit trail.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Completion status of a captured record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Draft,
    Complete,
}

/// A captured field value. Untagged on the wire: numbers, booleans, strings
/// and string lists deserialize directly from the stored JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Empty text and empty lists count as "no value entered".
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Flag(_) | FieldValue::Number(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Captured values, keyed by table name then field id.
pub type RecordData = BTreeMap<String, BTreeMap<String, FieldValue>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    StatusChanged,
    Deleted,
}

/// One append-only audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// RFC 3339 timestamp.
    pub timestamp: String,
    pub action: AuditAction,
    pub actor: String,
    /// Changed `table.field` paths, empty for created/deleted entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// One row of captured data for a subject at a visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalDataRecord {
    pub record_id: String,
    pub protocol_number: String,
    pub protocol_version: String,
    pub subject_id: String,
    /// None for single-timepoint (baseline-only) captures.
    #[serde(default)]
    pub visit_number: Option<String>,
    pub enrollment_date: String,
    pub collected_at: String,
    pub collected_by: String,
    pub status: RecordStatus,
    pub data: RecordData,
    pub last_modified: String,
    #[serde(default)]
    pub audit_trail: Vec<AuditEntry>,
}

impl ClinicalDataRecord {
    /// True when `other` describes the same logical row: same subject,
    /// visit, protocol and protocol version.
    pub fn same_identity(
        &self,
        subject_id: &str,
        visit_number: Option<&str>,
        protocol_number: &str,
        protocol_version: &str,
    ) -> bool {
        self.subject_id == subject_id
            && self.visit_number.as_deref() == visit_number
            && self.protocol_number == protocol_number
            && self.protocol_version == protocol_version
    }

    /// `table.field` paths present in `newer` whose values differ from (or
    /// are absent in) this record, plus paths removed by `newer`. Shallow
    /// comparison per field id.
    pub fn changed_paths(&self, newer: &RecordData) -> Vec<String> {
        let mut paths = Vec::new();
        for (table, fields) in newer {
            let old_fields = self.data.get(table);
            for (field_id, value) in fields {
                let unchanged = old_fields
                    .and_then(|f| f.get(field_id))
                    .is_some_and(|old| old == value);
                if !unchanged {
                    paths.push(format!("{table}.{field_id}"));
                }
            }
        }
        for (table, fields) in &self.data {
            for field_id in fields.keys() {
                let still_present = newer
                    .get(table)
                    .is_some_and(|f| f.contains_key(field_id));
                if !still_present {
                    paths.push(format!("{table}.{field_id}"));
                }
            }
        }
        paths.sort();
        paths.dedup();
        paths
    }
}
