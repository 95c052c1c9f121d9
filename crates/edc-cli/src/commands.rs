use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use edc_cli::logging::redact_value;
use edc_export::RecordCsvExporter;
use edc_model::{ClinicalDataRecord, Protocol, ProtocolVersion};
use edc_schema::generate_tables;
use edc_store::{DirStore, ManifestStore, RecordInput, RecordStore};
use edc_validate::{ValidationMode, ValidationReport, Validator};

use crate::cli::{
    LockManifestArgs, RecordsDeleteArgs, RecordsExportArgs, RecordsListArgs, SaveArgs, TablesArgs,
    ValidateArgs,
};
use crate::types::{RecordsListResult, SaveResult, TablesResult, ValidateResult};

pub fn run_tables(args: &TablesArgs) -> Result<TablesResult> {
    let protocol = load_protocol(&args.protocol)?;
    let (version, previous) = select_version(&protocol, args.protocol_version.as_deref())?;
    debug!(
        protocol = %protocol.protocol_number,
        version = %version.version_number,
        "generating tables"
    );

    let tables = generate_tables(version, previous);
    if let Some(path) = &args.output {
        let file =
            File::create(path).with_context(|| format!("create {}", path.display()))?;
        serde_json::to_writer_pretty(file, &tables)
            .with_context(|| format!("write tables to {}", path.display()))?;
        info!(path = %path.display(), "wrote generated tables");
    }

    Ok(TablesResult {
        protocol_number: protocol.protocol_number.clone(),
        version_number: version.version_number.clone(),
        baseline_version: previous.map(|p| p.version_number.clone()),
        tables,
        output: args.output.clone(),
    })
}

pub fn run_validate(args: &ValidateArgs) -> Result<ValidateResult> {
    let protocol = load_protocol(&args.protocol)?;
    let input = load_record(&args.record)?;
    let report = validate_input(&protocol, &input, args)?;
    Ok(ValidateResult {
        subject_id: input.subject_id,
        report,
    })
}

pub fn run_save(args: &SaveArgs) -> Result<SaveResult> {
    let protocol = load_protocol(&args.validate.protocol)?;
    let input = load_record(&args.validate.record)?;
    let report = validate_input(&protocol, &input, &args.validate)?;
    let subject_id = input.subject_id.clone();
    if report.has_errors() {
        return Ok(SaveResult {
            subject_id,
            report,
            outcome: None,
        });
    }

    let store = DirStore::open(&args.store_dir)?;
    let mut records = RecordStore::new(store);
    let outcome = records.save(input, &args.actor)?;
    Ok(SaveResult {
        subject_id,
        report,
        outcome: Some(outcome),
    })
}

pub fn run_records_list(args: &RecordsListArgs) -> Result<RecordsListResult> {
    let store = DirStore::open(&args.store_dir)?;
    let records = RecordStore::new(store);
    let listed = match &args.protocol {
        Some(number) => records.by_protocol(number, None)?,
        None => records.all()?,
    };
    let stats = records.stats()?;
    Ok(RecordsListResult {
        records: listed,
        stats,
    })
}

pub fn run_records_export(args: &RecordsExportArgs) -> Result<(std::path::PathBuf, usize)> {
    let protocol = load_protocol(&args.protocol_file)?;
    let (version, previous) = select_version(&protocol, None)?;
    let tables = generate_tables(version, previous);

    let store = DirStore::open(&args.store_dir)?;
    let records = RecordStore::new(store);
    let matching = records.by_protocol(&protocol.protocol_number, None)?;
    if matching.is_empty() {
        return Err(anyhow!(
            "no stored records for protocol {}",
            protocol.protocol_number
        ));
    }

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| std::path::PathBuf::from("."));
    let exporter = RecordCsvExporter::new(&tables);
    let path = exporter.write_to_dir(&output_dir, &protocol.protocol_number, &matching)?;
    Ok((path, matching.len()))
}

pub fn run_records_delete(args: &RecordsDeleteArgs) -> Result<ClinicalDataRecord> {
    let store = DirStore::open(&args.store_dir)?;
    let mut records = RecordStore::new(store);
    let removed = records.delete(&args.record_id, &args.actor)?;
    Ok(removed)
}

pub fn run_lock_manifest(args: &LockManifestArgs) -> Result<()> {
    let store = DirStore::open(&args.store_dir)?;
    let mut manifests = ManifestStore::new(store);
    manifests.lock(&args.protocol, &args.version, &args.by, args.reason.clone())?;
    Ok(())
}

fn validate_input(
    protocol: &Protocol,
    input: &RecordInput,
    args: &ValidateArgs,
) -> Result<ValidationReport> {
    if input.protocol_number != protocol.protocol_number {
        return Err(anyhow!(
            "record targets protocol {}, file holds {}",
            input.protocol_number,
            protocol.protocol_number
        ));
    }
    let version = protocol
        .version(&input.protocol_version)
        .ok_or_else(|| {
            anyhow!(
                "protocol {} has no version {}",
                protocol.protocol_number,
                input.protocol_version
            )
        })?;
    let previous = protocol.previous_of(&version.version_number);
    let tables = generate_tables(version, previous);

    let mode = if args.draft {
        ValidationMode::Draft
    } else {
        ValidationMode::Complete
    };
    info!(
        subject = redact_value(&input.subject_id),
        version = %version.version_number,
        "validating record"
    );
    let validator = Validator::new()
        .with_mode(mode)
        .with_testing_mode(args.testing_mode);
    Ok(validator.validate(
        &input.subject_id,
        &input.enrollment_date,
        &input.data,
        &tables,
    ))
}

fn load_protocol(path: &Path) -> Result<Protocol> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("parse protocol {}", path.display()))
}

fn load_record(path: &Path) -> Result<RecordInput> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("parse record {}", path.display()))
}

/// Resolve the version to generate for and the version to diff against.
fn select_version<'a>(
    protocol: &'a Protocol,
    requested: Option<&str>,
) -> Result<(&'a ProtocolVersion, Option<&'a ProtocolVersion>)> {
    let version = match requested {
        Some(number) => protocol.version(number).ok_or_else(|| {
            anyhow!(
                "protocol {} has no version {number}",
                protocol.protocol_number
            )
        })?,
        None => protocol.current().ok_or_else(|| {
            anyhow!("protocol {} has no versions", protocol.protocol_number)
        })?,
    };
    Ok((version, protocol.previous_of(&version.version_number)))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn temp_json(name: &str, contents: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock after epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("edc-cli-{stamp}-{name}"));
        fs::write(&path, contents).expect("write fixture");
        path
    }

    #[test]
    fn validate_reports_the_record_subject() {
        let protocol = temp_json(
            "protocol.json",
            r#"{
                "protocol_number": "P-100",
                "protocol_title": "Demo Study",
                "versions": [{
                    "version_number": "1.0",
                    "status": "published",
                    "metadata": { "protocol_number": "P-100" },
                    "schema": []
                }],
                "current_version": "1.0"
            }"#,
        );
        let record = temp_json(
            "record.json",
            r#"{
                "protocol_number": "P-100",
                "protocol_version": "1.0",
                "subject_id": "SUBJ-042",
                "enrollment_date": "2026-02-01",
                "status": "complete",
                "data": {}
            }"#,
        );

        let args = ValidateArgs {
            protocol: protocol.clone(),
            record: record.clone(),
            draft: false,
            testing_mode: false,
        };
        let result = run_validate(&args).expect("validate");
        assert_eq!(result.subject_id, "SUBJ-042");
        assert!(result.report.is_valid());

        let _ = fs::remove_file(protocol);
        let _ = fs::remove_file(record);
    }
}
