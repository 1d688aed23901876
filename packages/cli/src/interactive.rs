//! Menu-driven interface using `dialoguer`, for running the tool without
//! memorizing subcommands.

use std::error::Error;
use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};

use crate::commands::{self, Context};

/// Top-level actions available in the interactive menu.
enum Action {
    ImportFiles,
    ViewData,
    Reevaluate,
    EditPatterns,
    ExportCsv,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::ImportFiles,
        Self::ViewData,
        Self::Reevaluate,
        Self::EditPatterns,
        Self::ExportCsv,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::ImportFiles => "Import files",
            Self::ViewData => "View extracted data",
            Self::Reevaluate => "Reevaluate patterns",
            Self::EditPatterns => "Edit patterns",
            Self::ExportCsv => "Export CSV",
            Self::Quit => "Quit",
        }
    }
}

/// Pattern editing actions.
enum PatternAction {
    Edit,
    Add,
    Rename,
    Remove,
    Check,
    Done,
}

impl PatternAction {
    const ALL: &[Self] = &[
        Self::Edit,
        Self::Add,
        Self::Rename,
        Self::Remove,
        Self::Check,
        Self::Done,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Edit => "Edit a pattern",
            Self::Add => "Add a field",
            Self::Rename => "Rename a field",
            Self::Remove => "Remove a field",
            Self::Check => "Check all patterns",
            Self::Done => "Done",
        }
    }
}

/// Runs the interactive menu until the user quits.
///
/// Failures of a single action are logged and the menu is shown again.
///
/// # Errors
///
/// Returns an error if the terminal prompts fail.
pub fn run(ctx: &Context) -> Result<(), Box<dyn Error>> {
    println!("PDF Information Extractor");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        let result = match Action::ALL[idx] {
            Action::ImportFiles => import_files(ctx),
            Action::ViewData => view_data(ctx),
            Action::Reevaluate => reevaluate(ctx),
            Action::EditPatterns => edit_patterns(ctx),
            Action::ExportCsv => export_csv(ctx),
            Action::Quit => return Ok(()),
        };

        if let Err(e) = result {
            log::error!("{e}");
        }
        println!();
    }
}

fn import_files(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let input: String = Input::new()
        .with_prompt("Files or directories to import (space-separated)")
        .interact_text()?;

    let paths: Vec<PathBuf> = input.split_whitespace().map(PathBuf::from).collect();
    commands::import(ctx, &paths)?;

    Ok(())
}

fn view_data(ctx: &Context) -> Result<(), Box<dyn Error>> {
    commands::view(ctx)?;

    if !ctx.document_ids()?.is_empty()
        && Confirm::new()
            .with_prompt("Export this data as CSV?")
            .default(false)
            .interact()?
    {
        export_csv(ctx)?;
    }

    Ok(())
}

fn export_csv(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let output: String = Input::new()
        .with_prompt("Output file")
        .default("extracted_data.csv".to_string())
        .interact_text()?;

    commands::export(ctx, &output)
}

fn reevaluate(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let ids = ctx.document_ids()?;
    if ids.is_empty() {
        println!("No documents imported yet.");
        return Ok(());
    }

    let idx = Select::new()
        .with_prompt("Select a file to reevaluate")
        .items(&ids)
        .default(0)
        .max_length(20)
        .interact()?;

    let show_text = Confirm::new()
        .with_prompt("Show the raw text?")
        .default(false)
        .interact()?;

    commands::reevaluate_document(ctx, &ids[idx], show_text)?;

    if Confirm::new()
        .with_prompt("Refresh the stored fields of every document with these patterns?")
        .default(false)
        .interact()?
    {
        commands::refresh(ctx)?;
    }

    Ok(())
}

/// Prompts for one of the configured fields. Returns `None` when there are
/// none.
fn select_field(ctx: &Context, prompt: &str) -> Result<Option<String>, Box<dyn Error>> {
    let patterns = ctx.load_patterns()?;
    let fields: Vec<&str> = patterns.field_names().collect();
    if fields.is_empty() {
        println!("No patterns configured.");
        return Ok(None);
    }

    let idx = Select::new()
        .with_prompt(prompt)
        .items(&fields)
        .default(0)
        .max_length(20)
        .interact()?;

    Ok(Some(fields[idx].to_owned()))
}

fn edit_patterns(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let labels: Vec<&str> = PatternAction::ALL.iter().map(PatternAction::label).collect();

    loop {
        commands::list_patterns(ctx)?;
        println!();

        let idx = Select::new()
            .with_prompt("Edit patterns")
            .items(&labels)
            .default(0)
            .interact()?;

        let result = match PatternAction::ALL[idx] {
            PatternAction::Edit => edit_pattern(ctx),
            PatternAction::Add => add_pattern(ctx),
            PatternAction::Rename => rename_field(ctx),
            PatternAction::Remove => remove_field(ctx),
            PatternAction::Check => commands::check_patterns(ctx),
            PatternAction::Done => return Ok(()),
        };

        if let Err(e) = result {
            log::error!("{e}");
        }
        println!();
    }
}

fn edit_pattern(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let Some(field) = select_field(ctx, "Field to edit")? else {
        return Ok(());
    };
    let current = ctx.load_patterns()?.get(&field).unwrap_or_default().to_owned();

    let regex: String = Input::new()
        .with_prompt(format!("Pattern for {field}"))
        .with_initial_text(current)
        .interact_text()?;

    commands::set_pattern(ctx, &field, &regex)
}

fn add_pattern(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let field: String = Input::new().with_prompt("Field name").interact_text()?;
    let regex: String = Input::new()
        .with_prompt(format!("Pattern for {field}"))
        .interact_text()?;

    commands::set_pattern(ctx, field.trim(), &regex)
}

fn rename_field(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let Some(from) = select_field(ctx, "Field to rename")? else {
        return Ok(());
    };
    let to: String = Input::new().with_prompt("New name").interact_text()?;

    commands::rename_pattern(ctx, &from, to.trim())
}

fn remove_field(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let Some(field) = select_field(ctx, "Field to remove")? else {
        return Ok(());
    };

    if Confirm::new()
        .with_prompt(format!("Remove the pattern for '{field}'?"))
        .default(false)
        .interact()?
    {
        commands::remove_pattern(ctx, &field)?;
    }

    Ok(())
}
