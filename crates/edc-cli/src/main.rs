//! EDC command line entry point.

use clap::{ColorChoice, Parser};
use edc_cli::logging::{LogConfig, LogFormat, init_logging};
use std::io::{self, IsTerminal};
use tracing::Level;

mod cli;
mod commands;
mod summary;
mod types;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg, RecordsCommand};
use crate::commands::{
    run_lock_manifest, run_records_delete, run_records_export, run_records_list, run_save,
    run_tables, run_validate,
};
use crate::summary::{print_records, print_tables_summary, print_validation_report};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match cli.command {
        Command::Tables(args) => match run_tables(&args) {
            Ok(result) => {
                print_tables_summary(&result);
                0
            }
            Err(error) => fail(&error),
        },
        Command::Validate(args) => match run_validate(&args) {
            Ok(result) => {
                print_validation_report(&result.subject_id, &result.report);
                if result.report.has_errors() { 1 } else { 0 }
            }
            Err(error) => fail(&error),
        },
        Command::Save(args) => match run_save(&args) {
            Ok(result) => {
                print_validation_report(&result.subject_id, &result.report);
                match result.outcome {
                    Some(outcome) if outcome.created => {
                        println!("Created record {}", outcome.record_id);
                        0
                    }
                    Some(outcome) => {
                        println!("Updated record {}", outcome.record_id);
                        0
                    }
                    None => {
                        eprintln!("error: validation errors blocked the save");
                        1
                    }
                }
            }
            Err(error) => fail(&error),
        },
        Command::Records(RecordsCommand::List(args)) => match run_records_list(&args) {
            Ok(result) => {
                print_records(&result);
                0
            }
            Err(error) => fail(&error),
        },
        Command::Records(RecordsCommand::Export(args)) => match run_records_export(&args) {
            Ok((path, count)) => {
                println!("Exported {count} record(s) to {}", path.display());
                0
            }
            Err(error) => fail(&error),
        },
        Command::Records(RecordsCommand::Delete(args)) => match run_records_delete(&args) {
            Ok(removed) => {
                println!("Deleted record {}", removed.record_id);
                0
            }
            Err(error) => fail(&error),
        },
        Command::LockManifest(args) => match run_lock_manifest(&args) {
            Ok(()) => {
                println!("Locked manifest for {} v{}", args.protocol, args.version);
                0
            }
            Err(error) => fail(&error),
        },
    };
    std::process::exit(exit_code);
}

fn fail(error: &anyhow::Error) -> i32 {
    eprintln!("error: {error:#}");
    1
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig::default();
    if let Some(level) = cli.verbosity.tracing_level_filter().into_level() {
        config.level = level;
    }
    if let Some(level) = cli.log_level {
        config.level = match level {
            LogLevelArg::Error => Level::ERROR,
            LogLevelArg::Warn => Level::WARN,
            LogLevelArg::Info => Level::INFO,
            LogLevelArg::Debug => Level::DEBUG,
            LogLevelArg::Trace => Level::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
