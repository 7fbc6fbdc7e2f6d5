//! CLI commands for data export
//!
//! Provides commands for exporting audit records in various formats.

use clap::{Subcommand, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{AuditError, AuditResult};
use crate::export::{csv, json, yaml};
use crate::storage::AuditStore;

/// Export format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// CSV format (changes only)
    Csv,
    /// JSON format (changes and requests)
    Json,
    /// YAML format (changes and requests, human-readable)
    Yaml,
}

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export all records to a file
    All {
        /// Output file path
        output: PathBuf,

        /// Export format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Export change records to CSV
    Changes {
        /// Output file path
        output: PathBuf,
    },

    /// Export request records to CSV
    Requests {
        /// Output file path
        output: PathBuf,
    },
}

/// Handle export commands
pub fn handle_export_command(store: &dyn AuditStore, cmd: ExportCommands) -> AuditResult<()> {
    match cmd {
        ExportCommands::All {
            output,
            format,
            pretty,
        } => handle_export_all(store, &output, format, pretty),
        ExportCommands::Changes { output } => {
            let mut writer = create_output(&output)?;
            csv::export_changes_csv(store, &mut writer)?;
            writer.flush()?;
            println!(
                "Exported {} changes to: {}",
                store.changes()?.len(),
                output.display()
            );
            Ok(())
        }
        ExportCommands::Requests { output } => {
            let mut writer = create_output(&output)?;
            csv::export_requests_csv(store, &mut writer)?;
            writer.flush()?;
            println!(
                "Exported {} requests to: {}",
                store.requests()?.len(),
                output.display()
            );
            Ok(())
        }
    }
}

fn create_output(output: &Path) -> AuditResult<BufWriter<File>> {
    let file = File::create(output).map_err(|e| {
        AuditError::Export(format!(
            "Failed to create file {}: {}",
            output.display(),
            e
        ))
    })?;
    Ok(BufWriter::new(file))
}

/// Handle full export
fn handle_export_all(
    store: &dyn AuditStore,
    output: &Path,
    format: ExportFormat,
    pretty: bool,
) -> AuditResult<()> {
    let mut writer = create_output(output)?;

    match format {
        ExportFormat::Csv => {
            csv::export_changes_csv(store, &mut writer)?;
            println!("Changes exported to: {}", output.display());
            println!("Note: CSV format exports changes only. Use JSON or YAML for a full export.");
        }
        ExportFormat::Json => {
            json::export_full_json(store, &mut writer, pretty)?;
            println!("Audit log exported to: {}", output.display());
        }
        ExportFormat::Yaml => {
            yaml::export_full_yaml(store, &mut writer)?;
            println!("Audit log exported to: {}", output.display());
        }
    }

    writer.flush()?;
    Ok(())
}
