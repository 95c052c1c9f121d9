//! Derived database fields and tables.
//!
//! These are projections of schema blocks, recomputed from a protocol
//! version and its diff baseline on every generation. They are never
//! persisted, so a change of baseline can never leave stale statuses
//! behind.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::{DataType, EndpointTier, VariableCategory};

/// What changed on a modified field, in reporting priority order:
/// a data-type change outranks a unit change outranks anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldChange {
    DataType { from: DataType, to: DataType },
    Unit { from: Option<String>, to: Option<String> },
    Configuration,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldChange::DataType { from, to } => {
                write!(f, "Data type changed from {from} to {to}")
            }
            FieldChange::Unit { from, to } => {
                let from = from.as_deref().unwrap_or("none");
                let to = to.as_deref().unwrap_or("none");
                write!(f, "Unit changed from {from} to {to}")
            }
            FieldChange::Configuration => write!(f, "Field configuration updated"),
        }
    }
}

/// Status of a field relative to the previous protocol version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FieldStatus {
    Normal,
    New { version: String },
    Modified { version: String, change: FieldChange },
    Deprecated { version: String },
}

impl FieldStatus {
    pub fn is_deprecated(&self) -> bool {
        matches!(self, FieldStatus::Deprecated { .. })
    }

    pub fn is_new(&self) -> bool {
        matches!(self, FieldStatus::New { .. })
    }

    pub fn is_modified(&self) -> bool {
        matches!(self, FieldStatus::Modified { .. })
    }

    /// Human-readable change description for modified fields.
    pub fn change_description(&self) -> Option<String> {
        match self {
            FieldStatus::Modified { change, .. } => Some(change.to_string()),
            _ => None,
        }
    }
}

/// Flattened, form-able projection of one schema block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseField {
    /// Field id used to key captured values; the source block's id, or a
    /// synthetic id for structural fields.
    pub id: String,
    /// Flattened column name, parent-prefixed and lowercased.
    pub field_name: String,
    pub display_name: String,
    pub data_type: DataType,
    pub sql_type: String,
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_tier: Option<EndpointTier>,
    pub category: VariableCategory,
    pub status: FieldStatus,
    /// Id of the schema block the field was derived from.
    pub block_id: String,
}

impl DatabaseField {
    /// True for the fixed identity fields injected into every table.
    pub fn is_structural(&self) -> bool {
        self.category == VariableCategory::Structural
    }
}

/// One generated output table: structural fields plus the schema fields a
/// table creator claimed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseTable {
    pub table_name: String,
    pub display_name: String,
    pub description: String,
    pub fields: Vec<DatabaseField>,
    pub protocol_number: String,
    pub protocol_version: String,
}

impl DatabaseTable {
    pub fn field(&self, field_id: &str) -> Option<&DatabaseField> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    pub fn active_fields(&self) -> impl Iterator<Item = &DatabaseField> {
        self.fields
            .iter()
            .filter(|f| !f.status.is_deprecated() && !f.is_structural())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_description_priority_messages() {
        let type_change = FieldChange::DataType {
            from: DataType::Continuous,
            to: DataType::Categorical,
        };
        assert_eq!(
            type_change.to_string(),
            "Data type changed from Continuous to Categorical"
        );

        let unit_change = FieldChange::Unit {
            from: None,
            to: Some("years".to_string()),
        };
        assert_eq!(unit_change.to_string(), "Unit changed from none to years");

        assert_eq!(
            FieldChange::Configuration.to_string(),
            "Field configuration updated"
        );
    }

    #[test]
    fn status_serializes_tagged() {
        let status = FieldStatus::Modified {
            version: "2.0".to_string(),
            change: FieldChange::Configuration,
        };
        let json = serde_json::to_value(&status).expect("serialize status");
        assert_eq!(json["status"], "modified");
        assert_eq!(json["version"], "2.0");
        let back: FieldStatus = serde_json::from_value(json).expect("deserialize status");
        assert_eq!(back, status);
    }
}
