//! CSV export for captured clinical data.

mod writer;

pub use writer::RecordCsvExporter;
