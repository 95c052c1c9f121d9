use edc_model::{
    DataType, EndpointTier, FieldChange, FieldStatus, ProtocolMetadata, ProtocolVersion, RoleTag,
    SchemaBlock, SchemaTree, Variable, VariableCategory, VersionStatus,
};
use edc_schema::{
    BlockSource, classify_block, deprecated_fields, generate_fields, generate_tables, normalize,
};

fn variable(id: &str, name: &str, category: VariableCategory, dt: DataType) -> Variable {
    Variable {
        id: id.to_string(),
        name: name.to_string(),
        category,
        default_type: dt,
        default_unit: None,
        is_custom: false,
    }
}

fn block(id: &str, name: &str, category: VariableCategory, dt: DataType) -> SchemaBlock {
    let mut b = SchemaBlock::for_variable(format!("b-{id}"), variable(id, name, category, dt));
    b.data_type = dt;
    b
}

fn version(number: &str, schema: SchemaTree) -> ProtocolVersion {
    ProtocolVersion {
        version_number: number.to_string(),
        status: VersionStatus::Published,
        metadata: ProtocolMetadata {
            protocol_number: "PROTO-001".to_string(),
            ..ProtocolMetadata::default()
        },
        schema,
        change_log: None,
        created_at: String::new(),
        modified_at: String::new(),
    }
}

fn v1_schema() -> SchemaTree {
    let mut tree = SchemaTree::new();
    tree.add_root(block("age", "Age", VariableCategory::Demographics, DataType::Continuous));
    tree.add_root(block("sex", "Sex", VariableCategory::Demographics, DataType::Categorical));
    tree.add_root(block(
        "hemoglobin",
        "Hemoglobin",
        VariableCategory::Laboratory,
        DataType::Continuous,
    ));
    tree.add_root(block(
        "mortality",
        "30-day Mortality",
        VariableCategory::Endpoints,
        DataType::Boolean,
    ));
    tree
}

#[test]
fn fields_absent_from_baseline_are_new() {
    let previous = v1_schema();
    let mut current = v1_schema();
    current.add_root(block(
        "egfr",
        "eGFR",
        VariableCategory::Laboratory,
        DataType::Continuous,
    ));

    let fields = generate_fields(&current, "2.0", Some(&previous));
    let egfr = fields.iter().find(|f| f.field_name == "egfr").expect("egfr");
    assert_eq!(
        egfr.status,
        FieldStatus::New {
            version: "2.0".to_string()
        }
    );
    // Everything carried over unchanged stays normal.
    assert!(
        fields
            .iter()
            .filter(|f| f.field_name != "egfr")
            .all(|f| f.status == FieldStatus::Normal)
    );
}

#[test]
fn all_fields_normal_without_a_baseline() {
    let fields = generate_fields(&v1_schema(), "1.0", None);
    assert_eq!(fields.len(), 4);
    assert!(fields.iter().all(|f| f.status == FieldStatus::Normal));
}

#[test]
fn data_type_change_outranks_unit_change() {
    let previous = v1_schema();
    let mut changed = block("sex", "Sex", VariableCategory::Demographics, DataType::Text);
    changed.unit = Some("n/a".to_string());
    // Same variable ids as v1, with a single changed block.
    let mut current = SchemaTree::new();
    current.add_root(block("age", "Age", VariableCategory::Demographics, DataType::Continuous));
    current.add_root(changed);
    current.add_root(block(
        "hemoglobin",
        "Hemoglobin",
        VariableCategory::Laboratory,
        DataType::Continuous,
    ));
    current.add_root(block(
        "mortality",
        "30-day Mortality",
        VariableCategory::Endpoints,
        DataType::Boolean,
    ));

    let fields = generate_fields(&current, "2.0", Some(&previous));
    let sex = fields.iter().find(|f| f.field_name == "sex").expect("sex");
    match &sex.status {
        FieldStatus::Modified { version, change } => {
            assert_eq!(version, "2.0");
            assert_eq!(
                change,
                &FieldChange::DataType {
                    from: DataType::Categorical,
                    to: DataType::Text,
                }
            );
            assert_eq!(
                change.to_string(),
                "Data type changed from Categorical to Text"
            );
        }
        other => panic!("expected modified status, got {other:?}"),
    }
}

#[test]
fn unit_change_reports_none_to_new_unit() {
    // Age gains the unit "years" between versions.
    let previous = v1_schema();
    let mut tree = SchemaTree::new();
    let mut age = block("age", "Age", VariableCategory::Demographics, DataType::Continuous);
    age.unit = Some("years".to_string());
    tree.add_root(age);

    let status = classify_block(tree.get(tree.roots()[0]), Some(&previous), "2.0");
    match status {
        FieldStatus::Modified { change, .. } => {
            assert_eq!(change.to_string(), "Unit changed from none to years");
        }
        other => panic!("expected modified, got {other:?}"),
    }
}

#[test]
fn options_change_is_generic_configuration_update() {
    let mut previous = SchemaTree::new();
    let mut old = block("sev", "Severity", VariableCategory::Clinical, DataType::Categorical);
    old.options = Some(vec!["Mild".to_string(), "Severe".to_string()]);
    previous.add_root(old);

    let mut current = SchemaTree::new();
    let mut new = block("sev", "Severity", VariableCategory::Clinical, DataType::Categorical);
    new.options = Some(vec![
        "Mild".to_string(),
        "Moderate".to_string(),
        "Severe".to_string(),
    ]);
    current.add_root(new);

    let status = classify_block(current.get(current.roots()[0]), Some(&previous), "1.1");
    assert_eq!(
        status.change_description().as_deref(),
        Some("Field configuration updated")
    );
}

#[test]
fn dropped_variables_yield_exactly_one_deprecated_field() {
    let previous = v1_schema();
    let mut current = SchemaTree::new();
    current.add_root(block("age", "Age", VariableCategory::Demographics, DataType::Continuous));

    let deprecated = deprecated_fields(&current, &previous, "2.0");
    let names: Vec<&str> = deprecated.iter().map(|f| f.field_name.as_str()).collect();
    assert_eq!(names, vec!["sex", "hemoglobin", "30-day_mortality"]);
    for field in &deprecated {
        assert_eq!(
            field.status,
            FieldStatus::Deprecated {
                version: "2.0".to_string()
            }
        );
        assert!(!field.is_required);
        assert_eq!(field.sql_type, "VARCHAR(255)");
    }
}

#[test]
fn section_children_get_prefixed_names_and_sections_emit_no_field() {
    let mut tree = SchemaTree::new();
    let section = tree.add_root(SchemaBlock {
        data_type: DataType::Section,
        role: RoleTag::Structure,
        ..block("vitals", "Vitals", VariableCategory::Structural, DataType::Section)
    });
    tree.add_child(
        section,
        block("heart_rate", "Heart Rate", VariableCategory::Vitals, DataType::Continuous),
    );

    let fields = generate_fields(&tree, "1.0", None);
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].field_name, "vitals_heart_rate");
}

#[test]
fn required_follows_endpoint_tier_and_role() {
    let mut tree = SchemaTree::new();
    let mut primary = block(
        "mortality",
        "Mortality",
        VariableCategory::Endpoints,
        DataType::Boolean,
    );
    primary.endpoint_tier = Some(EndpointTier::Primary);
    tree.add_root(primary);
    let mut outcome = block("qol", "QoL Score", VariableCategory::Endpoints, DataType::Continuous);
    outcome.role = RoleTag::Outcome;
    tree.add_root(outcome);
    tree.add_root(block("age", "Age", VariableCategory::Demographics, DataType::Continuous));

    let fields = generate_fields(&tree, "1.0", None);
    assert!(fields[0].is_required);
    assert!(fields[1].is_required);
    assert!(!fields[2].is_required);
}

#[test]
fn tables_follow_category_first_encounter_order() {
    // Laboratory appears before Demographics in the root list, so the
    // laboratory table must be emitted first.
    let mut tree = SchemaTree::new();
    tree.add_root(block(
        "hemoglobin",
        "Hemoglobin",
        VariableCategory::Laboratory,
        DataType::Continuous,
    ));
    tree.add_root(block("age", "Age", VariableCategory::Demographics, DataType::Continuous));
    tree.add_root(block(
        "mortality",
        "Mortality",
        VariableCategory::Endpoints,
        DataType::Boolean,
    ));
    let current = version("1.0", tree);

    let tables = generate_tables(&current, None);
    let names: Vec<&str> = tables.iter().map(|t| t.display_name.as_str()).collect();
    assert_eq!(names, vec!["Laboratory", "Demographics", "Study Endpoints"]);
}

#[test]
fn clinical_creator_claims_both_clinical_and_treatments_once() {
    let mut tree = SchemaTree::new();
    tree.add_root(block(
        "diagnosis",
        "Diagnosis",
        VariableCategory::Clinical,
        DataType::Text,
    ));
    tree.add_root(block(
        "dose",
        "Dose",
        VariableCategory::Treatments,
        DataType::Continuous,
    ));
    let current = version("1.0", tree);

    let tables = generate_tables(&current, None);
    assert_eq!(tables.len(), 1);
    let clinical = &tables[0];
    assert_eq!(clinical.display_name, "Clinical Data");
    let field_names: Vec<&str> = clinical
        .fields
        .iter()
        .map(|f| f.field_name.as_str())
        .collect();
    assert!(field_names.contains(&"diagnosis"));
    assert!(field_names.contains(&"dose"));
    // Structural identity plus a visit number for longitudinal tables.
    assert!(field_names.contains(&"subject_id"));
    assert!(field_names.contains(&"visit_number"));
}

#[test]
fn demographics_table_has_no_visit_number() {
    let mut tree = SchemaTree::new();
    tree.add_root(block("age", "Age", VariableCategory::Demographics, DataType::Continuous));
    let tables = generate_tables(&version("1.0", tree), None);
    assert_eq!(tables.len(), 1);
    assert!(tables[0].field("visit_number").is_none());
    assert!(tables[0].field("subject_id").is_some());
}

#[test]
fn unclaimed_categories_fall_through_to_study_data() {
    let mut tree = SchemaTree::new();
    tree.add_root(block(
        "mri_lesions",
        "MRI Lesion Count",
        VariableCategory::Imaging,
        DataType::Continuous,
    ));
    tree.add_root(block("age", "Age", VariableCategory::Demographics, DataType::Continuous));
    let tables = generate_tables(&version("1.0", tree), None);
    let names: Vec<&str> = tables.iter().map(|t| t.display_name.as_str()).collect();
    assert_eq!(names, vec!["Demographics", "Study Data"]);
    assert_eq!(tables[0].table_name, "demographics_proto_001");
    assert_eq!(tables[1].table_name, "study_data_proto_001");
}

#[test]
fn deprecated_fields_land_in_their_claiming_table() {
    let previous = v1_schema();
    let mut tree = SchemaTree::new();
    tree.add_root(block("age", "Age", VariableCategory::Demographics, DataType::Continuous));
    tree.add_root(block(
        "hemoglobin",
        "Hemoglobin",
        VariableCategory::Laboratory,
        DataType::Continuous,
    ));
    let current = version("2.0", tree);
    let prev_version = version("1.0", previous);

    let tables = generate_tables(&current, Some(&prev_version));
    let demo = tables
        .iter()
        .find(|t| t.display_name == "Demographics")
        .expect("demographics table");
    let sex = demo.field("b-sex").expect("deprecated sex field");
    assert!(sex.status.is_deprecated());
}

#[test]
fn simplified_blocks_normalize_without_error() {
    let payload = r#"[
        {
            "type": "section",
            "id": "s1",
            "title": "Laboratory Results",
            "children": [
                {
                    "type": "variable",
                    "id": "v1",
                    "title": "Serum creatinine",
                    "metadata": { "data_type": "continuous", "tags": [] }
                }
            ]
        },
        {
            "type": "endpoint",
            "id": "e1",
            "title": "30-day mortality",
            "metadata": { "tags": ["primary"] }
        },
        { "completely": "unrelated" }
    ]"#;
    let sources: Vec<BlockSource> = serde_json::from_str(payload).expect("parse payload");
    let tree = normalize(sources);

    // The unknown shape is dropped; both real blocks convert.
    assert_eq!(tree.roots().len(), 2);
    let (_, creatinine) = tree.find_by_variable("var-v1").expect("creatinine");
    assert_eq!(creatinine.data_type, DataType::Continuous);
    assert_eq!(creatinine.variable.category, VariableCategory::Laboratory);
    let (_, mortality) = tree.find_by_variable("var-e1").expect("mortality");
    assert_eq!(mortality.role, RoleTag::Outcome);
    assert_eq!(mortality.endpoint_tier, Some(EndpointTier::Primary));
    assert_eq!(mortality.variable.category, VariableCategory::Endpoints);
}

#[test]
fn converted_simplified_blocks_survive_the_differencer() {
    let payload = r#"[
        { "type": "variable", "id": "v1", "title": "Serum creatinine" }
    ]"#;
    let sources: Vec<BlockSource> = serde_json::from_str(payload).expect("parse payload");
    let tree = normalize(sources);

    // Round-trip through serde and diff against itself: no panic, all normal.
    let json = serde_json::to_string(&tree).expect("serialize tree");
    let back: edc_model::SchemaTree = serde_json::from_str(&json).expect("deserialize tree");
    let fields = generate_fields(&back, "1.1", Some(&tree));
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].status, FieldStatus::Normal);
}
