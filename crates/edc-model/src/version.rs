//! Protocol versions and their linear history.

use serde::{Deserialize, Serialize};

use crate::block::SchemaTree;

/// Lifecycle status of a protocol version. Published versions are immutable
/// by convention; nothing in the model enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMetadata {
    pub protocol_number: String,
    #[serde(default)]
    pub protocol_title: String,
    #[serde(default)]
    pub principal_investigator: String,
    #[serde(default)]
    pub sponsor: String,
    #[serde(default)]
    pub study_phase: String,
}

/// One snapshot of a study's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolVersion {
    /// Version label, e.g. "1.0", "1.1", "2.0".
    pub version_number: String,
    pub status: VersionStatus,
    pub metadata: ProtocolMetadata,
    pub schema: SchemaTree,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_log: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub modified_at: String,
}

/// A protocol with its linear version history, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    pub protocol_number: String,
    #[serde(default)]
    pub protocol_title: String,
    pub versions: Vec<ProtocolVersion>,
    /// Version number of the version data entry runs against.
    pub current_version: String,
}

impl Protocol {
    pub fn version(&self, version_number: &str) -> Option<&ProtocolVersion> {
        self.versions
            .iter()
            .find(|v| v.version_number == version_number)
    }

    /// The version immediately preceding the named one in the history,
    /// used as the diff baseline. None for the first version.
    pub fn previous_of(&self, version_number: &str) -> Option<&ProtocolVersion> {
        let index = self
            .versions
            .iter()
            .position(|v| v.version_number == version_number)?;
        index.checked_sub(1).map(|prev| &self.versions[prev])
    }

    pub fn current(&self) -> Option<&ProtocolVersion> {
        self.version(&self.current_version)
    }
}
