use edc_model::{
    DataType, Protocol, ProtocolMetadata, ProtocolVersion, RoleTag, SchemaBlock, SchemaTree,
    Variable, VariableCategory, VersionStatus,
};

fn continuous(id: &str, name: &str, category: VariableCategory, unit: Option<&str>) -> SchemaBlock {
    let mut block = SchemaBlock::for_variable(
        format!("b-{id}"),
        Variable {
            id: id.to_string(),
            name: name.to_string(),
            category,
            default_type: DataType::Continuous,
            default_unit: unit.map(str::to_string),
            is_custom: false,
        },
    );
    block.unit = unit.map(str::to_string);
    block
}

#[test]
fn protocol_round_trips_with_nested_schema() {
    let mut schema = SchemaTree::new();
    let section = schema.add_root(SchemaBlock {
        data_type: DataType::Section,
        role: RoleTag::Structure,
        ..SchemaBlock::for_variable(
            "b-labs",
            Variable {
                id: "labs".to_string(),
                name: "Laboratory Panel".to_string(),
                category: VariableCategory::Structural,
                default_type: DataType::Section,
                default_unit: None,
                is_custom: false,
            },
        )
    });
    schema.add_child(
        section,
        continuous("hemoglobin", "Hemoglobin", VariableCategory::Laboratory, Some("g/dL")),
    );
    schema.add_child(
        section,
        continuous("creatinine", "Creatinine", VariableCategory::Laboratory, Some("mg/dL")),
    );

    let protocol = Protocol {
        protocol_number: "PROTO-001".to_string(),
        protocol_title: "Example Study".to_string(),
        versions: vec![ProtocolVersion {
            version_number: "1.0".to_string(),
            status: VersionStatus::Published,
            metadata: ProtocolMetadata {
                protocol_number: "PROTO-001".to_string(),
                protocol_title: "Example Study".to_string(),
                ..ProtocolMetadata::default()
            },
            schema,
            change_log: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            modified_at: "2026-01-01T00:00:00Z".to_string(),
        }],
        current_version: "1.0".to_string(),
    };

    let json = serde_json::to_string_pretty(&protocol).expect("serialize protocol");
    let back: Protocol = serde_json::from_str(&json).expect("deserialize protocol");
    assert_eq!(back, protocol);

    let current = back.current().expect("current version");
    assert_eq!(current.schema.len(), 3);
    let (_, hgb) = current.schema.find_by_variable("hemoglobin").expect("hgb");
    assert_eq!(hgb.unit.as_deref(), Some("g/dL"));
}

#[test]
fn missing_optional_block_fields_deserialize_with_defaults() {
    let json = r#"[
        {
            "id": "b-age",
            "variable": {
                "id": "age",
                "name": "Age",
                "category": "Demographics",
                "default_type": "Continuous"
            },
            "data_type": "Continuous",
            "role": "Predictor"
        }
    ]"#;
    let tree: SchemaTree = serde_json::from_str(json).expect("deserialize sparse block");
    let (_, block) = tree.find_by_variable("age").expect("age block");
    assert!(block.unit.is_none());
    assert!(block.options.is_none());
    assert!(block.endpoint_tier.is_none());
    assert!(block.children.is_empty());
}
