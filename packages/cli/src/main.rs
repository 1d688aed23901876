#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for `pdf_fields`.
//!
//! Imports PDF (or plain text) documents, extracts named fields from their
//! text with the configured regular expressions, and stores both in
//! `DuckDB`. Run without a subcommand for an interactive menu.
//!
//! Uses `indicatif-log-bridge` (via [`pdf_fields_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;
mod interactive;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pdf_fields_database::paths;

use crate::commands::Context;

#[derive(Parser)]
#[command(
    name = "pdf_fields",
    about = "Extract named fields from PDF documents with regular expressions"
)]
struct Cli {
    /// `DuckDB` database file (default: `$PDF_FIELDS_DB` or `data/extracted_data.duckdb`)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Pattern file, `.json` or `.toml` (default: `$PDF_FIELDS_PATTERNS` or `data/patterns.json`)
    #[arg(long = "patterns", global = true)]
    patterns_file: Option<PathBuf>,
    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import PDF or text files; directories import the files they contain
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show the extracted data of every document as a table
    View,
    /// Export the extracted data as CSV
    Export {
        /// Output file, or `-` for stdout
        #[arg(long, short, default_value = "extracted_data.csv")]
        output: String,
    },
    /// List imported documents
    Documents,
    /// Preview what the current patterns extract from a stored document
    Reevaluate {
        /// Document identifier (file name without extension)
        id: String,
        /// Also print the stored raw text
        #[arg(long)]
        show_text: bool,
    },
    /// Recompute and store the fields of every document with the current patterns
    Refresh,
    /// Manage field patterns
    Patterns {
        #[command(subcommand)]
        command: PatternCommands,
    },
    /// Delete a document's text and extracted fields
    Delete {
        /// Document identifier
        id: String,
    },
}

#[derive(Subcommand)]
enum PatternCommands {
    /// List fields and their patterns
    List,
    /// Add a field or replace its pattern
    Set { field: String, regex: String },
    /// Remove a field
    Remove { field: String },
    /// Rename a field, keeping its pattern
    Rename { from: String, to: String },
    /// Report patterns that are not valid regular expressions
    Check,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = pdf_fields_cli_utils::init_logger();
    let cli = Cli::parse();

    let ctx = Context {
        db_path: cli.db.unwrap_or_else(paths::db_path),
        patterns_path: cli.patterns_file.unwrap_or_else(paths::patterns_path),
        json: cli.json,
        multi,
    };

    let Some(command) = cli.command else {
        return interactive::run(&ctx);
    };

    match command {
        Commands::Import { files } => {
            commands::import(&ctx, &files)?;
        }
        Commands::View => commands::view(&ctx)?,
        Commands::Export { output } => commands::export(&ctx, &output)?,
        Commands::Documents => commands::list_documents(&ctx)?,
        Commands::Reevaluate { id, show_text } => {
            commands::reevaluate_document(&ctx, &id, show_text)?;
        }
        Commands::Refresh => commands::refresh(&ctx)?,
        Commands::Patterns { command } => match command {
            PatternCommands::List => commands::list_patterns(&ctx)?,
            PatternCommands::Set { field, regex } => commands::set_pattern(&ctx, &field, &regex)?,
            PatternCommands::Remove { field } => commands::remove_pattern(&ctx, &field)?,
            PatternCommands::Rename { from, to } => commands::rename_pattern(&ctx, &from, &to)?,
            PatternCommands::Check => commands::check_patterns(&ctx)?,
        },
        Commands::Delete { id } => commands::delete(&ctx, &id)?,
    }

    Ok(())
}
