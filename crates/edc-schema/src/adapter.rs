//! Legacy "simplified" schema block conversion.
//!
//! Older exports describe blocks with only a kind, a title, and free-text
//! metadata; the generator needs the full variable/data-type/role shape.
//! Conversion is best effort: category, type, and role are inferred from
//! keyword matching over the block's text, unrecognized shapes are skipped
//! with a warning, and nothing here ever returns an error.

use serde::{Deserialize, Serialize};
use tracing::warn;

use edc_model::{
    BlockId, DataType, EndpointTier, NestedBlock, RoleTag, SchemaBlock, SchemaTree, Variable,
    VariableCategory,
};

/// A block as it appears in legacy exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<SimplifiedMetadata>,
    #[serde(default)]
    pub children: Vec<SimplifiedBlock>,
    #[serde(default)]
    pub rows: Option<Vec<String>>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimplifiedMetadata {
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub validation: Option<SimplifiedValidation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimplifiedValidation {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// Wire payload that may hold either block form. Untagged: full blocks
/// carry `variable`/`data_type`/`role`, simplified blocks carry
/// `type`/`title`; anything else lands in `Unknown` and is dropped during
/// normalization.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BlockSource {
    Full(NestedBlock),
    Simplified(SimplifiedBlock),
    Unknown(serde_json::Value),
}

/// Normalize a mixed payload into a schema tree.
pub fn normalize(sources: Vec<BlockSource>) -> SchemaTree {
    let mut tree = SchemaTree::new();
    for source in sources {
        match source {
            BlockSource::Full(nested) => {
                let root = tree.add_root(flat_from_nested(&nested));
                attach_nested_children(&mut tree, root, &nested.children);
            }
            BlockSource::Simplified(simplified) => {
                warn!(
                    block = %simplified.id,
                    title = %simplified.title,
                    "simplified schema block detected; converting to full format"
                );
                convert_into(&mut tree, None, &simplified);
            }
            BlockSource::Unknown(value) => {
                warn!(payload = %value, "unrecognized schema block shape, skipping");
            }
        }
    }
    tree
}

/// Convert one simplified block (and its subtree) into full form.
pub fn convert_simplified(tree: &mut SchemaTree, simplified: &SimplifiedBlock) -> BlockId {
    convert_into(tree, None, simplified)
}

fn convert_into(
    tree: &mut SchemaTree,
    parent: Option<BlockId>,
    simplified: &SimplifiedBlock,
) -> BlockId {
    let metadata = simplified.metadata.clone().unwrap_or_default();
    let category = infer_category(
        &simplified.title,
        simplified.description.as_deref(),
        &metadata.tags,
    );
    let data_type = map_data_type(&simplified.kind, metadata.data_type.as_deref());
    let role = map_role(&simplified.kind, &metadata.tags);

    let mut block = SchemaBlock::for_variable(
        simplified.id.clone(),
        Variable {
            id: format!("var-{}", simplified.id),
            name: simplified.title.clone(),
            category,
            default_type: data_type,
            default_unit: None,
            is_custom: false,
        },
    );
    block.data_type = data_type;
    block.role = role;
    block.custom_name = Some(simplified.title.clone());
    block.options = simplified.categories.clone();
    block.matrix_rows = simplified.rows.clone();
    if simplified.columns.is_some() && simplified.categories.is_some() {
        block.grid_items = simplified.columns.clone();
        block.grid_categories = simplified.categories.clone();
    }
    if let Some(validation) = &metadata.validation {
        block.min_value = validation.min;
        block.max_value = validation.max;
    }
    if simplified.kind == "endpoint" {
        block.endpoint_tier = endpoint_tier_from_tags(&metadata.tags);
    }

    let id = match parent {
        Some(parent) => tree.add_child(parent, block),
        None => tree.add_root(block),
    };
    for child in &simplified.children {
        convert_into(tree, Some(id), child);
    }
    id
}

fn endpoint_tier_from_tags(tags: &[String]) -> Option<EndpointTier> {
    if tags.iter().any(|t| t == "primary") {
        Some(EndpointTier::Primary)
    } else if tags.iter().any(|t| t == "secondary") {
        Some(EndpointTier::Secondary)
    } else if tags.iter().any(|t| t == "exploratory") {
        Some(EndpointTier::Exploratory)
    } else {
        None
    }
}

fn map_data_type(kind: &str, metadata_type: Option<&str>) -> DataType {
    if let Some(raw) = metadata_type {
        let normalized = raw.to_lowercase();
        if normalized.contains("continuous") || normalized.contains("numeric") {
            return DataType::Continuous;
        }
        if normalized.contains("categorical") || normalized.contains("category") {
            return DataType::Categorical;
        }
        if normalized.contains("boolean") || normalized.contains("yes/no") {
            return DataType::Boolean;
        }
        if normalized.contains("date") || normalized.contains("time") {
            return DataType::Date;
        }
        if normalized.contains("text") || normalized.contains("string") {
            return DataType::Text;
        }
        if normalized.contains("multi") {
            return DataType::MultiSelect;
        }
        if normalized.contains("matrix") {
            return DataType::RankedMatrix;
        }
        if normalized.contains("grid") {
            return DataType::CategoricalGrid;
        }
    }
    match kind {
        "section" => DataType::Section,
        // Most endpoints and bare variables are numeric measurements.
        "endpoint" | "variable" => DataType::Continuous,
        "text" => DataType::Text,
        "matrix" => DataType::RankedMatrix,
        "categorical" => DataType::Categorical,
        _ => DataType::Text,
    }
}

fn map_role(kind: &str, tags: &[String]) -> RoleTag {
    let has = |needle: &str| tags.iter().any(|t| t == needle);
    if has("primary") || has("outcome") {
        return RoleTag::Outcome;
    }
    if has("predictor") || has("treatment") {
        return RoleTag::Predictor;
    }
    if has("structural") || has("section") {
        return RoleTag::Structure;
    }
    match kind {
        "endpoint" => RoleTag::Outcome,
        "section" => RoleTag::Structure,
        _ => RoleTag::Predictor,
    }
}

/// Infer a category from the block's free text. Check order matters and is
/// part of the contract: "blood" lands in Laboratory before "blood
/// pressure" can land in Vitals. Unmatched text falls back to Other.
fn infer_category(title: &str, description: Option<&str>, tags: &[String]) -> VariableCategory {
    let text = format!(
        "{} {} {}",
        title,
        description.unwrap_or(""),
        tags.join(" ")
    )
    .to_lowercase();
    let has = |needle: &str| text.contains(needle);

    if has("demographic") || has("age") || has("sex") || has("gender") {
        VariableCategory::Demographics
    } else if has("treatment") || has("intervention") || has("therapy") {
        VariableCategory::Treatments
    } else if has("endpoint") || has("outcome") || has("efficacy") || has("mortality") {
        VariableCategory::Endpoints
    } else if has("clinical") || has("diagnosis") || has("disease") {
        VariableCategory::Clinical
    } else if has("laboratory") || has("lab") || has("blood") || has("serum") {
        VariableCategory::Laboratory
    } else if has("vital") || has("heart rate") || has("temperature") {
        VariableCategory::Vitals
    } else if has("safety") || has("adverse") || has("toxicity") {
        VariableCategory::Safety
    } else if has("quality of life") || has("qol") || has("questionnaire") {
        VariableCategory::QualityOfLife
    } else if has("history") || has("past") {
        VariableCategory::MedicalHistory
    } else if has("biomarker") || has("marker") {
        VariableCategory::Biomarkers
    } else if has("imaging") || has("scan") || has("mri") || has("ct") {
        VariableCategory::Imaging
    } else if has("medication") || has("drug") || has("concomitant") {
        VariableCategory::Medications
    } else if has("procedure") || has("surgery") || has("operation") {
        VariableCategory::Procedures
    } else if has("section") || has("header") {
        VariableCategory::Structural
    } else {
        VariableCategory::Other
    }
}

fn flat_from_nested(nested: &NestedBlock) -> SchemaBlock {
    SchemaBlock {
        id: nested.id.clone(),
        variable: nested.variable.clone(),
        data_type: nested.data_type,
        role: nested.role,
        endpoint_tier: nested.endpoint_tier,
        unit: nested.unit.clone(),
        min_value: nested.min_value,
        max_value: nested.max_value,
        options: nested.options.clone(),
        custom_name: nested.custom_name.clone(),
        matrix_rows: nested.matrix_rows.clone(),
        grid_items: nested.grid_items.clone(),
        grid_categories: nested.grid_categories.clone(),
        children: Vec::new(),
        parent: None,
    }
}

fn attach_nested_children(tree: &mut SchemaTree, parent: BlockId, children: &[NestedBlock]) {
    for nested in children {
        let id = tree.add_child(parent, flat_from_nested(nested));
        attach_nested_children(tree, id, &nested.children);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_inference_matches_keyword_lists() {
        assert_eq!(
            infer_category("30-day mortality", None, &[]),
            VariableCategory::Endpoints
        );
        assert_eq!(
            infer_category("Serum creatinine", None, &[]),
            VariableCategory::Laboratory
        );
        assert_eq!(
            infer_category("Patient age at enrollment", None, &[]),
            VariableCategory::Demographics
        );
        // "blood" wins before "blood pressure" is ever considered.
        assert_eq!(
            infer_category("Blood pressure", None, &[]),
            VariableCategory::Laboratory
        );
        assert_eq!(
            infer_category("Unnamed thing", None, &[]),
            VariableCategory::Other
        );
    }

    #[test]
    fn metadata_type_outranks_block_kind() {
        assert_eq!(map_data_type("variable", Some("Categorical scale")), DataType::Categorical);
        assert_eq!(map_data_type("variable", None), DataType::Continuous);
        assert_eq!(map_data_type("section", None), DataType::Section);
        assert_eq!(map_data_type("anything-else", None), DataType::Text);
    }

    #[test]
    fn endpoint_kind_maps_to_outcome_role() {
        assert_eq!(map_role("endpoint", &[]), RoleTag::Outcome);
        assert_eq!(
            map_role("variable", &["treatment".to_string()]),
            RoleTag::Predictor
        );
        assert_eq!(map_role("section", &[]), RoleTag::Structure);
    }
}
