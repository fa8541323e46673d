//! Symbols command implementation
//!
//! Runs the extractor on one file without contacting any service.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::App;
use crate::error::TestGenieError;
use crate::models::language::Language;
use crate::models::symbol::{Symbol, SymbolKind};
use crate::services::context::capture_editor_context;
use crate::services::extractor::{QueryCapture, SymbolExtractor};

#[derive(Args, Debug)]
pub struct SymbolsArgs {
    /// Source file to analyze
    pub file: PathBuf,

    /// Editor language id (default: from the file extension)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Run the language's symbol query instead of the tree walk
    #[arg(long)]
    pub query: bool,
}

#[derive(Serialize)]
struct SymbolsResponse {
    file: String,
    language: String,
    test_framework: &'static str,
    partial: bool,
    functions: usize,
    classes: usize,
    symbols: Vec<Symbol>,
}

#[derive(Serialize)]
struct QueryResponse {
    file: String,
    language: String,
    count: usize,
    captures: Vec<QueryCapture>,
}

pub async fn execute(args: SymbolsArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let editor = capture_editor_context(&args.file, None, args.language.as_deref())?;
    let file = ctx.relative_path(&editor.file_path);

    if args.query {
        let language = editor
            .language_id
            .parse::<Language>()
            .map_err(|_| TestGenieError::unsupported_language(&editor.language_id))?;
        let captures = app.extractor.query(language, &editor.file_content)?;
        ctx.print_success_flat(QueryResponse {
            file,
            language: editor.language_id,
            count: captures.len(),
            captures,
        });
        return Ok(());
    }

    let extraction = app
        .extractor
        .extract(&editor.language_id, &editor.file_content)?;
    ctx.print_success_flat(SymbolsResponse {
        file,
        language: editor.language_id,
        test_framework: extraction.config.test_framework,
        partial: extraction.partial,
        functions: Symbol::count_kind(&extraction.symbols, SymbolKind::Function),
        classes: Symbol::count_kind(&extraction.symbols, SymbolKind::Class),
        symbols: extraction.symbols,
    });
    Ok(())
}
