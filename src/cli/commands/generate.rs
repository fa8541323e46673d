//! Generate command implementation
//!
//! Source flow: tests for one saved source file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::cli::prompt::TerminalInteraction;
use crate::services::orchestrator::RunTarget;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Source file to generate tests for
    pub file: PathBuf,

    /// Editor language id (python, javascript, javascriptreact, typescript, typescriptreact, java)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Overwrite an existing test file without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Workspace root (default: nearest .git ancestor of the file)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

pub async fn execute(args: GenerateArgs, app: &App, verbose: bool) -> Result<()> {
    let interaction = Arc::new(TerminalInteraction::stdio(args.yes, verbose));
    let orchestrator = app.orchestrator(interaction)?;

    let outcome = orchestrator
        .run(RunTarget::Source {
            file: args.file,
            root: args.root,
            language: args.language,
        })
        .await?;

    app.output.print_success_flat(outcome);
    Ok(())
}
