//! Form completion metrics for progress tracking.

use serde::Serialize;
use std::collections::BTreeMap;

use edc_model::{DatabaseTable, FieldValue, RecordData};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FormCompletion {
    pub filled: usize,
    pub total: usize,
    pub percentage: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCompletion {
    pub filled: usize,
    pub total: usize,
    /// Complete when every required field is filled; for tables with no
    /// required fields, when every field is filled.
    pub is_complete: bool,
}

/// Overall completion across all non-structural, non-deprecated fields.
pub fn form_completion(data: &RecordData, tables: &[DatabaseTable]) -> FormCompletion {
    let mut filled = 0;
    let mut total = 0;
    for table in tables {
        let table_data = data.get(&table.table_name);
        for field in table.active_fields() {
            total += 1;
            if is_filled(table_data, &field.id) {
                filled += 1;
            }
        }
    }
    let percentage = if total > 0 {
        ((filled as f64 / total as f64) * 100.0).round() as u8
    } else {
        0
    };
    FormCompletion {
        filled,
        total,
        percentage,
    }
}

/// Per-table completion, keyed by table name.
pub fn table_completion(
    data: &RecordData,
    tables: &[DatabaseTable],
) -> BTreeMap<String, TableCompletion> {
    let mut result = BTreeMap::new();
    for table in tables {
        let table_data = data.get(&table.table_name);
        let mut filled = 0;
        let mut total = 0;
        let mut required_filled = 0;
        let mut required_total = 0;
        for field in table.active_fields() {
            total += 1;
            let field_filled = is_filled(table_data, &field.id);
            if field_filled {
                filled += 1;
            }
            if field.is_required {
                required_total += 1;
                if field_filled {
                    required_filled += 1;
                }
            }
        }
        let is_complete = if required_total > 0 {
            required_filled == required_total
        } else {
            filled == total
        };
        result.insert(
            table.table_name.clone(),
            TableCompletion {
                filled,
                total,
                is_complete,
            },
        );
    }
    result
}

fn is_filled(table_data: Option<&BTreeMap<String, FieldValue>>, field_id: &str) -> bool {
    table_data
        .and_then(|d| d.get(field_id))
        .is_some_and(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use edc_model::{DataType, DatabaseField, FieldStatus, VariableCategory};

    fn field(id: &str, required: bool) -> DatabaseField {
        DatabaseField {
            id: id.to_string(),
            field_name: id.to_string(),
            display_name: id.to_string(),
            data_type: DataType::Continuous,
            sql_type: "FLOAT".to_string(),
            is_required: required,
            unit: None,
            min_value: None,
            max_value: None,
            options: None,
            endpoint_tier: None,
            category: VariableCategory::Clinical,
            status: FieldStatus::Normal,
            block_id: format!("b-{id}"),
        }
    }

    fn sample_table() -> DatabaseTable {
        DatabaseTable {
            table_name: "clinical_data_p1".to_string(),
            display_name: "Clinical Data".to_string(),
            description: String::new(),
            fields: vec![field("a", true), field("b", false), field("c", false)],
            protocol_number: "P1".to_string(),
            protocol_version: "1.0".to_string(),
        }
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        let tables = vec![sample_table()];
        let mut data = RecordData::new();
        data.entry("clinical_data_p1".to_string())
            .or_default()
            .insert("a".to_string(), FieldValue::Number(1.0));
        let completion = form_completion(&data, &tables);
        assert_eq!(completion.filled, 1);
        assert_eq!(completion.total, 3);
        assert_eq!(completion.percentage, 33);
    }

    #[test]
    fn table_complete_when_required_fields_filled() {
        let tables = vec![sample_table()];
        let mut data = RecordData::new();
        data.entry("clinical_data_p1".to_string())
            .or_default()
            .insert("a".to_string(), FieldValue::Number(1.0));
        let status = table_completion(&data, &tables);
        let table = status.get("clinical_data_p1").expect("table status");
        assert!(table.is_complete);
        assert_eq!(table.filled, 1);
        assert_eq!(table.total, 3);
    }

    #[test]
    fn empty_form_is_zero_percent() {
        let completion = form_completion(&RecordData::new(), &[]);
        assert_eq!(completion.percentage, 0);
    }
}
