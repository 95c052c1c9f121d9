//! CLI argument definitions for the EDC toolchain.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "edc",
    version,
    about = "Electronic data capture for versioned study protocols",
    long_about = "Generate database tables from versioned protocol schemas,\n\
                  validate captured form data against them, and manage the\n\
                  clinical record store."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow subject ids and captured values in log output.
    ///
    /// Off by default: field-level values are replaced with a redaction
    /// token so logs stay free of PHI.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate database tables for a protocol's current version.
    Tables(TablesArgs),

    /// Validate a captured record against its protocol's tables.
    Validate(ValidateArgs),

    /// Validate and save a captured record into a store.
    Save(SaveArgs),

    /// Inspect, export, or delete stored clinical records.
    #[command(subcommand)]
    Records(RecordsCommand),

    /// Lock a statistical manifest against further edits.
    LockManifest(LockManifestArgs),
}

#[derive(Args)]
pub struct TablesArgs {
    /// Path to a protocol JSON file.
    #[arg(value_name = "PROTOCOL_JSON")]
    pub protocol: PathBuf,

    /// Generate tables for this version instead of the current one.
    #[arg(long = "protocol-version", value_name = "VERSION")]
    pub protocol_version: Option<String>,

    /// Write the generated tables as JSON to this path.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to a protocol JSON file.
    #[arg(value_name = "PROTOCOL_JSON")]
    pub protocol: PathBuf,

    /// Path to a captured record JSON file.
    #[arg(value_name = "RECORD_JSON")]
    pub record: PathBuf,

    /// Validate as a draft save: missing required fields warn instead of
    /// blocking.
    #[arg(long = "draft")]
    pub draft: bool,

    /// Skip required-field enforcement entirely.
    ///
    /// Range and option-membership checks still run. Intended for
    /// exercising forms with partial data, never for production captures.
    #[arg(long = "testing-mode")]
    pub testing_mode: bool,
}

#[derive(Args)]
pub struct SaveArgs {
    #[command(flatten)]
    pub validate: ValidateArgs,

    /// Directory backing the record store.
    #[arg(long = "store-dir", value_name = "DIR")]
    pub store_dir: PathBuf,

    /// Name recorded in the audit trail.
    #[arg(long = "actor", value_name = "NAME")]
    pub actor: String,
}

#[derive(Subcommand)]
pub enum RecordsCommand {
    /// List stored records.
    List(RecordsListArgs),

    /// Export stored records as CSV.
    Export(RecordsExportArgs),

    /// Delete a stored record.
    Delete(RecordsDeleteArgs),
}

#[derive(Args)]
pub struct RecordsListArgs {
    /// Directory backing the record store.
    #[arg(long = "store-dir", value_name = "DIR")]
    pub store_dir: PathBuf,

    /// Only list records for this protocol number.
    #[arg(long = "protocol", value_name = "NUMBER")]
    pub protocol: Option<String>,
}

#[derive(Args)]
pub struct RecordsExportArgs {
    /// Directory backing the record store.
    #[arg(long = "store-dir", value_name = "DIR")]
    pub store_dir: PathBuf,

    /// Path to the protocol JSON file whose tables shape the columns.
    #[arg(long = "protocol-file", value_name = "PROTOCOL_JSON")]
    pub protocol_file: PathBuf,

    /// Directory to write the CSV file into (default: current directory).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct RecordsDeleteArgs {
    /// Directory backing the record store.
    #[arg(long = "store-dir", value_name = "DIR")]
    pub store_dir: PathBuf,

    /// Id of the record to delete.
    #[arg(long = "record-id", value_name = "ID")]
    pub record_id: String,

    /// Name recorded in the audit trail.
    #[arg(long = "actor", value_name = "NAME")]
    pub actor: String,
}

#[derive(Args)]
pub struct LockManifestArgs {
    /// Directory backing the manifest store.
    #[arg(long = "store-dir", value_name = "DIR")]
    pub store_dir: PathBuf,

    /// Protocol number of the manifest.
    #[arg(long = "protocol", value_name = "NUMBER")]
    pub protocol: String,

    /// Protocol version of the manifest.
    #[arg(long = "version", value_name = "VERSION")]
    pub version: String,

    /// Name recorded as the locking party.
    #[arg(long = "by", value_name = "NAME")]
    pub by: String,

    /// Optional reason recorded with the lock.
    #[arg(long = "reason", value_name = "TEXT")]
    pub reason: Option<String>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
