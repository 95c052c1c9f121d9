//! Clinical record repository: upsert-by-identity with an append-only
//! audit trail.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use edc_model::{
    AuditAction, AuditEntry, ClinicalDataRecord, RecordData, RecordStatus,
};

use crate::error::{Result, StoreError};
use crate::kv::{KeyValueStore, load_collection, save_collection};

pub const RECORDS_KEY: &str = "clinical-records";

/// Input for a save: a record without identity bookkeeping. The store
/// assigns record id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordInput {
    pub protocol_number: String,
    pub protocol_version: String,
    pub subject_id: String,
    #[serde(default)]
    pub visit_number: Option<String>,
    pub enrollment_date: String,
    pub status: RecordStatus,
    pub data: RecordData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub record_id: String,
    /// False when an existing record with the same identity was updated.
    pub created: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    pub total_records: usize,
    pub draft_records: usize,
    pub complete_records: usize,
    pub unique_subjects: usize,
}

/// Repository over the single whole-collection records key.
#[derive(Debug)]
pub struct RecordStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> RecordStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Upsert a record on its identity key (subject, visit, protocol,
    /// protocol version).
    ///
    /// A matching record is updated in place: the record id and original
    /// collection timestamp survive, changed `table.field` paths are
    /// computed by shallow comparison, and one audit entry is appended:
    /// `StatusChanged` when the status moved, otherwise `Updated`. Without
    /// a match a new record is created with a single `Created` entry.
    pub fn save(&mut self, input: RecordInput, actor: &str) -> Result<SaveOutcome> {
        let mut records: Vec<ClinicalDataRecord> = self.load()?;
        let now = Utc::now().to_rfc3339();

        let existing = records.iter_mut().find(|r| {
            r.same_identity(
                &input.subject_id,
                input.visit_number.as_deref(),
                &input.protocol_number,
                &input.protocol_version,
            )
        });

        let outcome = match existing {
            Some(record) => {
                let changed_fields = record.changed_paths(&input.data);
                let entry = if record.status != input.status {
                    AuditEntry {
                        timestamp: now.clone(),
                        action: AuditAction::StatusChanged,
                        actor: actor.to_string(),
                        changed_fields,
                        detail: Some(format!(
                            "Status changed from {} to {}",
                            status_name(record.status),
                            status_name(input.status)
                        )),
                    }
                } else {
                    AuditEntry {
                        timestamp: now.clone(),
                        action: AuditAction::Updated,
                        actor: actor.to_string(),
                        changed_fields,
                        detail: None,
                    }
                };
                record.enrollment_date = input.enrollment_date;
                record.status = input.status;
                record.data = input.data;
                record.last_modified = now;
                record.audit_trail.push(entry);
                info!(record_id = %record.record_id, "updated clinical record");
                SaveOutcome {
                    record_id: record.record_id.clone(),
                    created: false,
                }
            }
            None => {
                let record_id = format!(
                    "{}_{}_{}",
                    input.subject_id,
                    input.visit_number.as_deref().unwrap_or("baseline"),
                    Utc::now().timestamp_millis()
                );
                let record = ClinicalDataRecord {
                    record_id: record_id.clone(),
                    protocol_number: input.protocol_number,
                    protocol_version: input.protocol_version,
                    subject_id: input.subject_id,
                    visit_number: input.visit_number,
                    enrollment_date: input.enrollment_date,
                    collected_at: now.clone(),
                    collected_by: actor.to_string(),
                    status: input.status,
                    data: input.data,
                    last_modified: now.clone(),
                    audit_trail: vec![AuditEntry {
                        timestamp: now,
                        action: AuditAction::Created,
                        actor: actor.to_string(),
                        changed_fields: Vec::new(),
                        detail: None,
                    }],
                };
                info!(record_id = %record.record_id, "created clinical record");
                records.push(record);
                SaveOutcome {
                    record_id,
                    created: true,
                }
            }
        };

        self.persist(&records)?;
        Ok(outcome)
    }

    pub fn all(&self) -> Result<Vec<ClinicalDataRecord>> {
        self.load()
    }

    pub fn by_protocol(
        &self,
        protocol_number: &str,
        protocol_version: Option<&str>,
    ) -> Result<Vec<ClinicalDataRecord>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| {
                r.protocol_number == protocol_number
                    && protocol_version.is_none_or(|v| r.protocol_version == v)
            })
            .collect())
    }

    pub fn by_subject(&self, subject_id: &str) -> Result<Vec<ClinicalDataRecord>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| r.subject_id == subject_id)
            .collect())
    }

    /// Remove a record, returning it with a final `Deleted` audit entry
    /// appended so callers can archive the audited carcass.
    pub fn delete(&mut self, record_id: &str, actor: &str) -> Result<ClinicalDataRecord> {
        let mut records = self.load()?;
        let index = records
            .iter()
            .position(|r| r.record_id == record_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "record",
                key: record_id.to_string(),
            })?;
        let mut record = records.remove(index);
        record.audit_trail.push(AuditEntry {
            timestamp: Utc::now().to_rfc3339(),
            action: AuditAction::Deleted,
            actor: actor.to_string(),
            changed_fields: Vec::new(),
            detail: None,
        });
        self.persist(&records)?;
        info!(record_id = %record.record_id, "deleted clinical record");
        Ok(record)
    }

    pub fn stats(&self) -> Result<StorageStats> {
        let records = self.load()?;
        let unique_subjects = records
            .iter()
            .map(|r| r.subject_id.as_str())
            .collect::<std::collections::BTreeSet<_>>()
            .len();
        Ok(StorageStats {
            total_records: records.len(),
            draft_records: records
                .iter()
                .filter(|r| r.status == RecordStatus::Draft)
                .count(),
            complete_records: records
                .iter()
                .filter(|r| r.status == RecordStatus::Complete)
                .count(),
            unique_subjects,
        })
    }

    fn load(&self) -> Result<Vec<ClinicalDataRecord>> {
        load_collection(&self.store, RECORDS_KEY)
    }

    fn persist(&mut self, records: &[ClinicalDataRecord]) -> Result<()> {
        save_collection(&mut self.store, RECORDS_KEY, records)
    }
}

fn status_name(status: RecordStatus) -> &'static str {
    match status {
        RecordStatus::Draft => "draft",
        RecordStatus::Complete => "complete",
    }
}
