//! Field differencer: classifies each block of a protocol version against
//! the previous version, and synthesizes deprecated fields for variables
//! the new version dropped.
//!
//! Comparison is keyed on the *variable id*, never the block id, so a block
//! that moves to another category still reads as the same field.

use std::collections::BTreeSet;

use edc_model::{
    BlockId, DatabaseField, EndpointTier, FieldChange, FieldStatus, RoleTag, SchemaBlock,
    SchemaTree,
};

/// Classify one block against the previous version's tree.
///
/// With no baseline every field is `Normal`: the first version of a
/// protocol has nothing to be new relative to.
pub fn classify_block(
    block: &SchemaBlock,
    previous: Option<&SchemaTree>,
    version: &str,
) -> FieldStatus {
    let Some(previous) = previous else {
        return FieldStatus::Normal;
    };
    let Some((_, baseline)) = previous.find_by_variable(&block.variable.id) else {
        return FieldStatus::New {
            version: version.to_string(),
        };
    };
    if baseline.data_type != block.data_type {
        return FieldStatus::Modified {
            version: version.to_string(),
            change: FieldChange::DataType {
                from: baseline.data_type,
                to: block.data_type,
            },
        };
    }
    if baseline.unit != block.unit {
        return FieldStatus::Modified {
            version: version.to_string(),
            change: FieldChange::Unit {
                from: baseline.unit.clone(),
                to: block.unit.clone(),
            },
        };
    }
    if baseline.options != block.options {
        return FieldStatus::Modified {
            version: version.to_string(),
            change: FieldChange::Configuration,
        };
    }
    FieldStatus::Normal
}

/// Flatten a schema tree into database fields in document order.
///
/// Section blocks contribute no field of their own; they prefix the
/// flattened names of everything beneath them.
pub fn generate_fields(
    tree: &SchemaTree,
    version: &str,
    previous: Option<&SchemaTree>,
) -> Vec<DatabaseField> {
    let mut fields = Vec::new();
    for &root in tree.roots() {
        flatten_block(tree, root, None, version, previous, &mut fields);
    }
    fields
}

fn flatten_block(
    tree: &SchemaTree,
    id: BlockId,
    prefix: Option<&str>,
    version: &str,
    previous: Option<&SchemaTree>,
    out: &mut Vec<DatabaseField>,
) {
    let block = tree.get(id);
    let name = flat_name(block.label(), prefix);
    if !block.is_section() {
        out.push(field_from_block(block, &name, version, previous));
    }
    for &child in &block.children {
        flatten_block(tree, child, Some(&name), version, previous, out);
    }
}

fn field_from_block(
    block: &SchemaBlock,
    field_name: &str,
    version: &str,
    previous: Option<&SchemaTree>,
) -> DatabaseField {
    DatabaseField {
        id: block.id.clone(),
        field_name: field_name.to_string(),
        display_name: block.label().to_string(),
        data_type: block.data_type,
        sql_type: block.data_type.sql_type().to_string(),
        is_required: block.endpoint_tier == Some(EndpointTier::Primary)
            || block.role == RoleTag::Outcome,
        unit: block.unit.clone(),
        min_value: block.min_value,
        max_value: block.max_value,
        options: block.options.clone(),
        endpoint_tier: block.endpoint_tier,
        category: block.variable.category,
        status: classify_block(block, previous, version),
        block_id: block.id.clone(),
    }
}

/// One synthetic deprecated field per variable id present in the previous
/// version but absent from the current one, in previous-tree document
/// order.
pub fn deprecated_fields(
    current: &SchemaTree,
    previous: &SchemaTree,
    current_version: &str,
) -> Vec<DatabaseField> {
    let current_ids = current.variable_ids();
    let mut seen = BTreeSet::new();
    let mut fields = Vec::new();
    for (_, block) in previous.iter_depth_first() {
        if current_ids.contains(&block.variable.id) || !seen.insert(block.variable.id.clone()) {
            continue;
        }
        fields.push(DatabaseField {
            id: block.id.clone(),
            field_name: flat_name(block.label(), None),
            display_name: block.label().to_string(),
            data_type: block.data_type,
            sql_type: "VARCHAR(255)".to_string(),
            is_required: false,
            unit: block.unit.clone(),
            min_value: None,
            max_value: None,
            options: block.options.clone(),
            endpoint_tier: block.endpoint_tier,
            category: block.variable.category,
            status: FieldStatus::Deprecated {
                version: current_version.to_string(),
            },
            block_id: block.id.clone(),
        });
    }
    fields
}

/// Flattened column name: lowercased, whitespace runs become `_`, parent
/// names prefixed with `_`.
pub(crate) fn flat_name(label: &str, prefix: Option<&str>) -> String {
    let mut name = String::new();
    if let Some(prefix) = prefix {
        name.push_str(prefix);
        name.push('_');
    }
    let mut in_space = false;
    for ch in label.chars() {
        if ch.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            name.extend(ch.to_lowercase());
            in_space = false;
        }
    }
    name
}
