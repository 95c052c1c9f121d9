//! End-to-end: generate tables from a schema, then validate captured data
//! against them.

use edc_model::{
    DataType, EndpointTier, FieldValue, ProtocolMetadata, ProtocolVersion, RecordData,
    SchemaBlock, SchemaTree, Variable, VariableCategory, VersionStatus,
};
use edc_schema::generate_tables;
use edc_validate::{ValidationMode, Validator, form_completion};

fn study_version() -> ProtocolVersion {
    let mut tree = SchemaTree::new();
    let mut age = SchemaBlock::for_variable(
        "b-age",
        Variable {
            id: "age".to_string(),
            name: "Age".to_string(),
            category: VariableCategory::Demographics,
            default_type: DataType::Continuous,
            default_unit: Some("years".to_string()),
            is_custom: false,
        },
    );
    age.min_value = Some(18.0);
    age.max_value = Some(100.0);
    tree.add_root(age);

    let mut mortality = SchemaBlock::for_variable(
        "b-mortality",
        Variable {
            id: "mortality".to_string(),
            name: "30-day Mortality".to_string(),
            category: VariableCategory::Endpoints,
            default_type: DataType::Boolean,
            default_unit: None,
            is_custom: false,
        },
    );
    mortality.data_type = DataType::Boolean;
    mortality.endpoint_tier = Some(EndpointTier::Primary);
    tree.add_root(mortality);

    ProtocolVersion {
        version_number: "1.0".to_string(),
        status: VersionStatus::Published,
        metadata: ProtocolMetadata {
            protocol_number: "PROTO-001".to_string(),
            ..ProtocolMetadata::default()
        },
        schema: tree,
        change_log: None,
        created_at: String::new(),
        modified_at: String::new(),
    }
}

#[test]
fn complete_save_requires_the_primary_endpoint() {
    let tables = generate_tables(&study_version(), None);
    let data = RecordData::new();
    let report = Validator::new()
        .with_mode(ValidationMode::Complete)
        .validate("SUBJ-01", "2026-01-15", &data, &tables);
    // The primary endpoint is the only required schema field.
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.issues[0].field, "b-mortality");
}

#[test]
fn valid_complete_submission_passes_and_counts_completion() {
    let tables = generate_tables(&study_version(), None);
    let endpoints_table = tables
        .iter()
        .find(|t| t.display_name == "Study Endpoints")
        .expect("endpoints table");
    let demographics_table = tables
        .iter()
        .find(|t| t.display_name == "Demographics")
        .expect("demographics table");

    let mut data = RecordData::new();
    data.entry(endpoints_table.table_name.clone())
        .or_default()
        .insert("b-mortality".to_string(), FieldValue::Flag(false));
    data.entry(demographics_table.table_name.clone())
        .or_default()
        .insert("b-age".to_string(), FieldValue::Number(64.0));

    let report = Validator::new().validate("SUBJ-01", "2026-01-15", &data, &tables);
    assert!(report.is_valid(), "issues: {:?}", report.issues);

    let completion = form_completion(&data, &tables);
    assert_eq!(completion.filled, 2);
    assert_eq!(completion.total, 2);
    assert_eq!(completion.percentage, 100);
}

#[test]
fn out_of_range_age_is_rejected_even_in_draft() {
    let tables = generate_tables(&study_version(), None);
    let demographics_table = tables
        .iter()
        .find(|t| t.display_name == "Demographics")
        .expect("demographics table");

    let mut data = RecordData::new();
    data.entry(demographics_table.table_name.clone())
        .or_default()
        .insert("b-age".to_string(), FieldValue::Number(12.0));

    let report = Validator::new()
        .with_mode(ValidationMode::Draft)
        .validate("SUBJ-01", "2026-01-15", &data, &tables);
    assert!(report.has_errors());
}
