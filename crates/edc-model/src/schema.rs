use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EdcError;

/// Data-capture type of a study variable.
///
/// The spellings used for serialization and display are the ones study teams
/// see in protocol documents ("Multi-Select", "Ranked-Matrix"), so parsed
/// protocol files round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Continuous,
    Categorical,
    Boolean,
    Date,
    Text,
    #[serde(rename = "Multi-Select")]
    MultiSelect,
    #[serde(rename = "Ranked-Matrix")]
    RankedMatrix,
    #[serde(rename = "Categorical-Grid")]
    CategoricalGrid,
    Section,
}

impl DataType {
    /// SQL column type for a generated database field.
    pub fn sql_type(&self) -> &'static str {
        match self {
            DataType::Continuous => "FLOAT",
            DataType::Categorical => "VARCHAR(255)",
            DataType::Boolean => "BOOLEAN",
            DataType::Date => "DATE",
            DataType::Text => "TEXT",
            DataType::MultiSelect | DataType::RankedMatrix | DataType::CategoricalGrid => "JSON",
            DataType::Section => "VARCHAR(255)",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Continuous => "Continuous",
            DataType::Categorical => "Categorical",
            DataType::Boolean => "Boolean",
            DataType::Date => "Date",
            DataType::Text => "Text",
            DataType::MultiSelect => "Multi-Select",
            DataType::RankedMatrix => "Ranked-Matrix",
            DataType::CategoricalGrid => "Categorical-Grid",
            DataType::Section => "Section",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataType {
    type Err = EdcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Continuous" => Ok(DataType::Continuous),
            "Categorical" => Ok(DataType::Categorical),
            "Boolean" => Ok(DataType::Boolean),
            "Date" => Ok(DataType::Date),
            "Text" => Ok(DataType::Text),
            "Multi-Select" => Ok(DataType::MultiSelect),
            "Ranked-Matrix" => Ok(DataType::RankedMatrix),
            "Categorical-Grid" => Ok(DataType::CategoricalGrid),
            "Section" => Ok(DataType::Section),
            other => Err(EdcError::Message(format!("unknown data type: {other}"))),
        }
    }
}

/// Analytical role of a study variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleTag {
    Predictor,
    Outcome,
    Structure,
}

impl RoleTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleTag::Predictor => "Predictor",
            RoleTag::Outcome => "Outcome",
            RoleTag::Structure => "Structure",
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain category of a study variable. Categories drive table grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariableCategory {
    Demographics,
    Treatments,
    Endpoints,
    Clinical,
    Laboratory,
    Vitals,
    Safety,
    #[serde(rename = "Quality of Life")]
    QualityOfLife,
    #[serde(rename = "Medical History")]
    MedicalHistory,
    Biomarkers,
    Imaging,
    Medications,
    Procedures,
    Questionnaires,
    Structural,
    Other,
}

impl VariableCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableCategory::Demographics => "Demographics",
            VariableCategory::Treatments => "Treatments",
            VariableCategory::Endpoints => "Endpoints",
            VariableCategory::Clinical => "Clinical",
            VariableCategory::Laboratory => "Laboratory",
            VariableCategory::Vitals => "Vitals",
            VariableCategory::Safety => "Safety",
            VariableCategory::QualityOfLife => "Quality of Life",
            VariableCategory::MedicalHistory => "Medical History",
            VariableCategory::Biomarkers => "Biomarkers",
            VariableCategory::Imaging => "Imaging",
            VariableCategory::Medications => "Medications",
            VariableCategory::Procedures => "Procedures",
            VariableCategory::Questionnaires => "Questionnaires",
            VariableCategory::Structural => "Structural",
            VariableCategory::Other => "Other",
        }
    }
}

impl fmt::Display for VariableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VariableCategory {
    type Err = EdcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Demographics" => Ok(VariableCategory::Demographics),
            "Treatments" => Ok(VariableCategory::Treatments),
            "Endpoints" => Ok(VariableCategory::Endpoints),
            "Clinical" => Ok(VariableCategory::Clinical),
            "Laboratory" => Ok(VariableCategory::Laboratory),
            "Vitals" => Ok(VariableCategory::Vitals),
            "Safety" => Ok(VariableCategory::Safety),
            "Quality of Life" => Ok(VariableCategory::QualityOfLife),
            "Medical History" => Ok(VariableCategory::MedicalHistory),
            "Biomarkers" => Ok(VariableCategory::Biomarkers),
            "Imaging" => Ok(VariableCategory::Imaging),
            "Medications" => Ok(VariableCategory::Medications),
            "Procedures" => Ok(VariableCategory::Procedures),
            "Questionnaires" => Ok(VariableCategory::Questionnaires),
            "Structural" => Ok(VariableCategory::Structural),
            "Other" => Ok(VariableCategory::Other),
            other => Err(EdcError::Message(format!("unknown variable category: {other}"))),
        }
    }
}

/// Endpoint tier for outcome variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointTier {
    Primary,
    Secondary,
    Exploratory,
}

impl EndpointTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointTier::Primary => "primary",
            EndpointTier::Secondary => "secondary",
            EndpointTier::Exploratory => "exploratory",
        }
    }
}

impl fmt::Display for EndpointTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Descriptor for one study variable as it appears in the variable library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Stable variable identifier. Field diffs between protocol versions
    /// are keyed on this id, never on the block id.
    pub id: String,
    pub name: String,
    pub category: VariableCategory,
    pub default_type: DataType,
    #[serde(default)]
    pub default_unit: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
}
