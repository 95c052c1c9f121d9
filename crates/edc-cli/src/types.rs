use std::path::PathBuf;

use edc_model::{ClinicalDataRecord, DatabaseTable};
use edc_store::{SaveOutcome, StorageStats};
use edc_validate::ValidationReport;

/// Outcome of table generation for one protocol version.
pub struct TablesResult {
    pub protocol_number: String,
    pub version_number: String,
    /// Version the field statuses were diffed against, if any.
    pub baseline_version: Option<String>,
    pub tables: Vec<DatabaseTable>,
    pub output: Option<PathBuf>,
}

pub struct ValidateResult {
    pub subject_id: String,
    pub report: ValidationReport,
}

pub struct SaveResult {
    pub subject_id: String,
    pub report: ValidationReport,
    /// None when validation errors blocked the save.
    pub outcome: Option<SaveOutcome>,
}

pub struct RecordsListResult {
    pub records: Vec<ClinicalDataRecord>,
    pub stats: StorageStats,
}
