use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use edc_model::{ClinicalDataRecord, RecordStatus};
use edc_validate::{Severity, ValidationReport};

use crate::types::{RecordsListResult, TablesResult};

pub fn print_tables_summary(result: &TablesResult) {
    println!("Protocol: {}", result.protocol_number);
    match &result.baseline_version {
        Some(baseline) => println!(
            "Version: {} (diffed against {baseline})",
            result.version_number
        ),
        None => println!("Version: {} (no baseline)", result.version_number),
    }
    if let Some(path) = &result.output {
        println!("Output: {}", path.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Display name"),
        header_cell("Fields"),
        header_cell("New"),
        header_cell("Modified"),
        header_cell("Deprecated"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut total_fields = 0usize;
    let mut total_new = 0usize;
    let mut total_modified = 0usize;
    let mut total_deprecated = 0usize;
    for generated in &result.tables {
        let new = generated
            .fields
            .iter()
            .filter(|f| f.status.is_new())
            .count();
        let modified = generated
            .fields
            .iter()
            .filter(|f| f.status.is_modified())
            .count();
        let deprecated = generated
            .fields
            .iter()
            .filter(|f| f.status.is_deprecated())
            .count();
        total_fields += generated.fields.len();
        total_new += new;
        total_modified += modified;
        total_deprecated += deprecated;
        table.add_row(vec![
            Cell::new(&generated.table_name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&generated.display_name),
            Cell::new(generated.fields.len()),
            count_cell(new, Color::Green),
            count_cell(modified, Color::Yellow),
            count_cell(deprecated, Color::Red),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new("All tables")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_fields).add_attribute(Attribute::Bold),
        count_cell(total_new, Color::Green).add_attribute(Attribute::Bold),
        count_cell(total_modified, Color::Yellow).add_attribute(Attribute::Bold),
        count_cell(total_deprecated, Color::Red).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

pub fn print_validation_report(subject_id: &str, report: &ValidationReport) {
    if report.issues.is_empty() {
        println!("Validation passed for {subject_id} with no findings.");
        return;
    }
    println!("Validation findings for {subject_id}:");
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Table"),
        header_cell("Field"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    for issue in &report.issues {
        table.add_row(vec![
            severity_cell(issue.severity),
            Cell::new(&issue.table),
            Cell::new(&issue.field),
            Cell::new(&issue.message),
        ]);
    }
    println!("{table}");
    println!(
        "{} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
}

pub fn print_records(result: &RecordsListResult) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Record"),
        header_cell("Subject"),
        header_cell("Visit"),
        header_cell("Protocol"),
        header_cell("Status"),
        header_cell("Last modified"),
    ]);
    apply_table_style(&mut table);
    for record in &result.records {
        table.add_row(vec![
            Cell::new(&record.record_id),
            Cell::new(&record.subject_id),
            Cell::new(record.visit_number.as_deref().unwrap_or("Baseline")),
            Cell::new(format!(
                "{} v{}",
                record.protocol_number, record.protocol_version
            )),
            status_cell(record),
            Cell::new(&record.last_modified),
        ]);
    }
    println!("{table}");
    println!(
        "{} record(s): {} draft, {} complete, {} subject(s)",
        result.stats.total_records,
        result.stats.draft_records,
        result.stats.complete_records,
        result.stats.unique_subjects
    );
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn status_cell(record: &ClinicalDataRecord) -> Cell {
    match record.status {
        RecordStatus::Complete => Cell::new("complete").fg(Color::Green),
        RecordStatus::Draft => Cell::new("draft").fg(Color::Yellow),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
