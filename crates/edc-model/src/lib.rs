//! Core data model for the EDC schema and capture toolkit.
//!
//! Protocol schemas are trees of blocks (one per study variable) held in an
//! arena; database fields and tables are derived projections of those
//! blocks; captured data lives in [`ClinicalDataRecord`]s with an
//! append-only audit trail.

pub mod block;
pub mod error;
pub mod field;
pub mod manifest;
pub mod record;
pub mod schema;
pub mod version;

pub use block::{BlockId, NestedBlock, SchemaBlock, SchemaTree};
pub use error::{EdcError, Result};
pub use field::{DatabaseField, DatabaseTable, FieldChange, FieldStatus};
pub use manifest::{
    ComparativeResult, CorrelationMethod, CorrelationResult, DescriptiveResult,
    DescriptiveSummary, ManifestLock, ManifestMetadata, StatisticalManifest,
};
pub use record::{
    AuditAction, AuditEntry, ClinicalDataRecord, FieldValue, RecordData, RecordStatus,
};
pub use schema::{DataType, EndpointTier, RoleTag, Variable, VariableCategory};
pub use version::{Protocol, ProtocolMetadata, ProtocolVersion, VersionStatus};
