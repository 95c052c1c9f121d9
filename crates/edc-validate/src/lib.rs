//! Validation of captured form data against generated database tables.

pub mod completion;
pub mod validator;

pub use completion::{FormCompletion, TableCompletion, form_completion, table_completion};
pub use validator::{Issue, Severity, ValidationMode, ValidationReport, Validator};
