//! CSV export of clinical records against a set of generated tables.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use tracing::info;

use edc_model::{ClinicalDataRecord, DatabaseTable, FieldValue};

/// Fixed identity columns written before any table field.
const IDENTITY_HEADERS: [&str; 6] = [
    "subject_id",
    "visit",
    "enrollment_date",
    "status",
    "collected_at",
    "collected_by",
];

/// One data column: a `table.field` header plus the keys needed to look
/// the value up in a record's data map.
#[derive(Debug, Clone)]
struct Column {
    header: String,
    table_name: String,
    field_id: String,
}

/// Writes records as CSV with one column per non-structural field of the
/// supplied tables. Column order follows table order, then field order
/// within each table.
#[derive(Debug)]
pub struct RecordCsvExporter {
    columns: Vec<Column>,
}

impl RecordCsvExporter {
    pub fn new(tables: &[DatabaseTable]) -> Self {
        let mut columns = Vec::new();
        for table in tables {
            for field in &table.fields {
                // Structural fields duplicate the identity columns.
                if field.is_structural() {
                    continue;
                }
                columns.push(Column {
                    header: format!("{}.{}", table.table_name, field.field_name),
                    table_name: table.table_name.clone(),
                    field_id: field.id.clone(),
                });
            }
        }
        Self { columns }
    }

    /// Write a header row and one row per record.
    pub fn write_records<W: Write>(
        &self,
        writer: W,
        records: &[ClinicalDataRecord],
    ) -> Result<()> {
        let mut csv = WriterBuilder::new().has_headers(false).from_writer(writer);

        let header: Vec<&str> = IDENTITY_HEADERS
            .iter()
            .copied()
            .chain(self.columns.iter().map(|c| c.header.as_str()))
            .collect();
        csv.write_record(&header).context("write csv header")?;

        for record in records {
            let mut row = vec![
                record.subject_id.clone(),
                record
                    .visit_number
                    .clone()
                    .unwrap_or_else(|| "Baseline".to_string()),
                record.enrollment_date.clone(),
                status_label(record).to_string(),
                record.collected_at.clone(),
                record.collected_by.clone(),
            ];
            for column in &self.columns {
                let value = record
                    .data
                    .get(&column.table_name)
                    .and_then(|fields| fields.get(&column.field_id));
                row.push(value.map(render_value).unwrap_or_default());
            }
            csv.write_record(&row)
                .with_context(|| format!("write csv row for {}", record.record_id))?;
        }

        csv.flush().context("flush csv output")?;
        Ok(())
    }

    /// Write to `<dir>/clinical-data-<protocol>-<date>.csv`, creating the
    /// directory if needed. Returns the written path.
    pub fn write_to_dir(
        &self,
        dir: &Path,
        protocol_number: &str,
        records: &[ClinicalDataRecord],
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        let date = chrono_date();
        let filename = format!("clinical-data-{protocol_number}-{date}.csv");
        let path = dir.join(filename);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("create {}", path.display()))?;
        self.write_records(file, records)?;
        info!(path = %path.display(), records = records.len(), "wrote csv export");
        Ok(path)
    }
}

fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Flag(flag) => flag.to_string(),
        FieldValue::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        FieldValue::Text(s) => s.clone(),
        FieldValue::List(items) => items.join(";"),
    }
}

fn status_label(record: &ClinicalDataRecord) -> &'static str {
    match record.status {
        edc_model::RecordStatus::Draft => "draft",
        edc_model::RecordStatus::Complete => "complete",
    }
}

fn chrono_date() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}
