//! Table grouper: buckets flattened fields into named output tables by
//! domain category.
//!
//! Emission order follows the category first-encounter order of the source
//! tree, and each predefined table creator emits at most one table even
//! when several of its categories appear.

use tracing::debug;

use edc_model::{
    DataType, DatabaseField, DatabaseTable, FieldStatus, ProtocolVersion, VariableCategory,
};

use crate::diff::{deprecated_fields, generate_fields};

/// Visit/timepoint choices offered on every longitudinal table.
pub const VISIT_OPTIONS: [&str; 11] = [
    "Screening",
    "Baseline",
    "Week 2",
    "Week 4",
    "Week 8",
    "Week 12",
    "Month 6",
    "Month 12",
    "Final Visit",
    "Early Termination",
    "Unscheduled",
];

/// A predefined output table and the categories it claims.
struct TableCreator {
    key: &'static str,
    display_name: &'static str,
    description: &'static str,
    categories: &'static [VariableCategory],
    /// Demographics is captured once per subject; every other table tracks
    /// repeated visits and so carries a visit-number column.
    include_visit_number: bool,
}

const CREATORS: [TableCreator; 4] = [
    TableCreator {
        key: "demographics",
        display_name: "Demographics",
        description: "Baseline subject characteristics captured at enrollment.",
        categories: &[VariableCategory::Demographics],
        include_visit_number: false,
    },
    TableCreator {
        key: "endpoints",
        display_name: "Study Endpoints",
        description: "Primary, secondary, and exploratory endpoint measurements.",
        categories: &[VariableCategory::Endpoints],
        include_visit_number: true,
    },
    TableCreator {
        key: "clinical_data",
        display_name: "Clinical Data",
        description: "Clinical observations and treatment administration.",
        categories: &[VariableCategory::Clinical, VariableCategory::Treatments],
        include_visit_number: true,
    },
    TableCreator {
        key: "laboratory",
        display_name: "Laboratory",
        description: "Laboratory panel results.",
        categories: &[VariableCategory::Laboratory],
        include_visit_number: true,
    },
];

/// Generate the output tables for a protocol version, diffed against the
/// version before it.
pub fn generate_tables(
    version: &ProtocolVersion,
    previous: Option<&ProtocolVersion>,
) -> Vec<DatabaseTable> {
    let previous_schema = previous.map(|p| &p.schema);
    let active = generate_fields(&version.schema, &version.version_number, previous_schema);
    let deprecated = previous_schema
        .map(|prev| deprecated_fields(&version.schema, prev, &version.version_number))
        .unwrap_or_default();

    let protocol_number = &version.metadata.protocol_number;
    let mut tables = Vec::new();
    let mut emitted = [false; CREATORS.len()];

    for category in category_order(version, &deprecated) {
        let Some(index) = CREATORS
            .iter()
            .position(|c| c.categories.contains(&category))
        else {
            continue;
        };
        if emitted[index] {
            continue;
        }
        let creator = &CREATORS[index];
        let matched: Vec<&DatabaseField> = active
            .iter()
            .chain(deprecated.iter())
            .filter(|f| creator.categories.contains(&f.category))
            .collect();
        if matched.is_empty() {
            continue;
        }
        emitted[index] = true;
        tables.push(build_table(creator, &matched, version, protocol_number));
    }

    // Fields in categories no creator claims still need a home.
    let leftover: Vec<&DatabaseField> = active
        .iter()
        .chain(deprecated.iter())
        .filter(|f| !CREATORS.iter().any(|c| c.categories.contains(&f.category)))
        .collect();
    if !leftover.is_empty() {
        tables.push(build_table(
            &TableCreator {
                key: "study_data",
                display_name: "Study Data",
                description: "Fields outside the predefined study domains.",
                categories: &[],
                include_visit_number: true,
            },
            &leftover,
            version,
            protocol_number,
        ));
    }

    debug!(
        protocol = %protocol_number,
        version = %version.version_number,
        tables = tables.len(),
        active_fields = active.len(),
        deprecated_fields = deprecated.len(),
        "generated database tables"
    );
    tables
}

fn build_table(
    creator: &TableCreator,
    matched: &[&DatabaseField],
    version: &ProtocolVersion,
    protocol_number: &str,
) -> DatabaseTable {
    let mut fields = base_fields();
    if creator.include_visit_number {
        fields.push(visit_number_field());
    }
    fields.extend(matched.iter().map(|&f| f.clone()));
    DatabaseTable {
        table_name: sanitize_table_name(&format!("{}_{}", creator.key, protocol_number)),
        display_name: creator.display_name.to_string(),
        description: creator.description.to_string(),
        fields,
        protocol_number: protocol_number.to_string(),
        protocol_version: version.version_number.clone(),
    }
}

/// De-duplicated category list in first-encounter document order.
/// Categories that survive only through deprecated fields come last, so a
/// domain emptied by the new version still gets its table.
fn category_order(
    version: &ProtocolVersion,
    deprecated: &[DatabaseField],
) -> Vec<VariableCategory> {
    let mut order = Vec::new();
    for (_, block) in version.schema.iter_depth_first() {
        let category = block.variable.category;
        if category != VariableCategory::Structural && !order.contains(&category) {
            order.push(category);
        }
    }
    for field in deprecated {
        if field.category != VariableCategory::Structural && !order.contains(&field.category) {
            order.push(field.category);
        }
    }
    order
}

/// Fixed identity fields injected into every table. The pair
/// (subject_id, visit_name) forms the composite key that lets one subject
/// carry records across timepoints.
fn base_fields() -> Vec<DatabaseField> {
    vec![
        structural_field(
            "subject_id",
            "Subject ID",
            DataType::Text,
            "VARCHAR(50)",
            None,
        ),
        structural_field(
            "visit_name",
            "Visit/Timepoint",
            DataType::Categorical,
            "VARCHAR(100)",
            Some(VISIT_OPTIONS.iter().map(|s| (*s).to_string()).collect()),
        ),
        structural_field("visit_date", "Visit Date", DataType::Date, "DATE", None),
        structural_field(
            "enrollment_date",
            "Enrollment Date",
            DataType::Date,
            "DATE",
            None,
        ),
    ]
}

fn visit_number_field() -> DatabaseField {
    structural_field(
        "visit_number",
        "Visit Number",
        DataType::Text,
        "VARCHAR(50)",
        None,
    )
}

fn structural_field(
    id: &str,
    display_name: &str,
    data_type: DataType,
    sql_type: &str,
    options: Option<Vec<String>>,
) -> DatabaseField {
    DatabaseField {
        id: id.to_string(),
        field_name: id.to_string(),
        display_name: display_name.to_string(),
        data_type,
        sql_type: sql_type.to_string(),
        is_required: true,
        unit: None,
        min_value: None,
        max_value: None,
        options,
        endpoint_tier: None,
        category: VariableCategory::Structural,
        status: FieldStatus::Normal,
        block_id: format!("base_{id}"),
    }
}

/// Lowercase, replace anything outside `[a-z0-9_]`, collapse `_` runs.
fn sanitize_table_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    let mut last_underscore = false;
    for ch in raw.chars().flat_map(char::to_lowercase) {
        let mapped = if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            ch
        } else {
            '_'
        };
        if mapped == '_' {
            if last_underscore {
                continue;
            }
            last_underscore = true;
        } else {
            last_underscore = false;
        }
        name.push(mapped);
    }
    name
}
