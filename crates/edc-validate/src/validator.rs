//! Form validation over generated database tables.
//!
//! Two modes share one rule set. **Draft** saves only hard-require the base
//! identity fields; every other required-but-empty field becomes a
//! non-blocking warning. **Complete** saves require every required field to
//! be filled. `testing_mode` bypasses required-field enforcement entirely;
//! it is an explicit escape hatch for exercising forms, not a rule.

use serde::Serialize;

use edc_model::{DataType, DatabaseField, DatabaseTable, FieldValue, RecordData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    Draft,
    #[default]
    Complete,
}

/// A single validation finding, addressed by table and field.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub table: String,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    fn push(&mut self, severity: Severity, table: &str, field: &str, message: String) {
        self.issues.push(Issue {
            severity,
            table: table.to_string(),
            field: field.to_string(),
            message,
        });
    }
}

/// Validator for one save attempt.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    mode: ValidationMode,
    testing_mode: bool,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Skip required-field enforcement entirely. Per-value checks (range,
    /// set membership) still run.
    pub fn with_testing_mode(mut self, testing_mode: bool) -> Self {
        self.testing_mode = testing_mode;
        self
    }

    /// Validate a form submission against its generated tables.
    pub fn validate(
        &self,
        subject_id: &str,
        enrollment_date: &str,
        data: &RecordData,
        tables: &[DatabaseTable],
    ) -> ValidationReport {
        let mut report = ValidationReport::default();
        self.check_base_fields(subject_id, enrollment_date, &mut report);

        for table in tables {
            let table_data = data.get(&table.table_name);
            for field in &table.fields {
                // Deprecated fields take no new data; structural identity is
                // covered by the base checks above.
                if field.status.is_deprecated() || field.is_structural() {
                    continue;
                }
                let value = table_data.and_then(|d| d.get(&field.id));
                self.check_field(table, field, value, &mut report);
            }
        }
        report
    }

    /// Subject id and enrollment date are hard requirements in both modes.
    fn check_base_fields(
        &self,
        subject_id: &str,
        enrollment_date: &str,
        report: &mut ValidationReport,
    ) {
        if subject_id.trim().is_empty() {
            report.push(
                Severity::Error,
                "base",
                "subject_id",
                "Subject ID is required".to_string(),
            );
        }
        if enrollment_date.trim().is_empty() {
            report.push(
                Severity::Error,
                "base",
                "enrollment_date",
                "Enrollment date is required".to_string(),
            );
        }
    }

    fn check_field(
        &self,
        table: &DatabaseTable,
        field: &DatabaseField,
        value: Option<&FieldValue>,
        report: &mut ValidationReport,
    ) {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            if field.is_required && !self.testing_mode {
                match self.mode {
                    ValidationMode::Complete => report.push(
                        Severity::Error,
                        &table.table_name,
                        &field.id,
                        format!("{} is required", field.display_name),
                    ),
                    ValidationMode::Draft => report.push(
                        Severity::Warning,
                        &table.table_name,
                        &field.id,
                        format!("{} is recommended", field.display_name),
                    ),
                }
            }
            return;
        };

        match field.data_type {
            DataType::Continuous => self.check_continuous(table, field, value, report),
            DataType::Categorical => self.check_categorical(table, field, value, report),
            DataType::MultiSelect => self.check_multi_select(table, field, value, report),
            _ => {}
        }
    }

    fn check_continuous(
        &self,
        table: &DatabaseTable,
        field: &DatabaseField,
        value: &FieldValue,
        report: &mut ValidationReport,
    ) {
        let Some(number) = value.as_number() else {
            report.push(
                Severity::Error,
                &table.table_name,
                &field.id,
                format!("{} must be a number", field.display_name),
            );
            return;
        };
        if let Some(min) = field.min_value
            && number < min
        {
            report.push(
                Severity::Error,
                &table.table_name,
                &field.id,
                format!("{} must be at least {min}", field.display_name),
            );
        }
        if let Some(max) = field.max_value
            && number > max
        {
            report.push(
                Severity::Error,
                &table.table_name,
                &field.id,
                format!("{} must be at most {max}", field.display_name),
            );
        }
    }

    fn check_categorical(
        &self,
        table: &DatabaseTable,
        field: &DatabaseField,
        value: &FieldValue,
        report: &mut ValidationReport,
    ) {
        let Some(options) = &field.options else {
            return;
        };
        let Some(text) = value.as_text() else {
            report.push(
                Severity::Error,
                &table.table_name,
                &field.id,
                format!("Invalid option selected for {}", field.display_name),
            );
            return;
        };
        if !options.iter().any(|o| o == text) {
            report.push(
                Severity::Error,
                &table.table_name,
                &field.id,
                format!("Invalid option selected for {}", field.display_name),
            );
        }
    }

    fn check_multi_select(
        &self,
        table: &DatabaseTable,
        field: &DatabaseField,
        value: &FieldValue,
        report: &mut ValidationReport,
    ) {
        let Some(options) = &field.options else {
            return;
        };
        let FieldValue::List(selected) = value else {
            report.push(
                Severity::Error,
                &table.table_name,
                &field.id,
                format!("{} expects a list of selections", field.display_name),
            );
            return;
        };
        for item in selected {
            if !options.iter().any(|o| o == item) {
                report.push(
                    Severity::Error,
                    &table.table_name,
                    &field.id,
                    format!("Invalid option selected for {}", field.display_name),
                );
            }
        }
    }
}
