//! Story command implementation
//!
//! Tests and production code for an issue-tracker story, optionally
//! continuing an earlier story's files.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::cli::prompt::TerminalInteraction;
use crate::models::story::StoryId;
use crate::services::orchestrator::{ContinuationMode, RunTarget};

#[derive(Args, Debug)]
pub struct StoryArgs {
    /// Story ID such as PROJ-123 (prompted for when omitted)
    pub id: Option<StoryId>,

    /// Editor language id; detected from the project when omitted
    #[arg(short, long)]
    pub language: Option<String>,

    /// Continue the files generated for an earlier story
    #[arg(long, value_name = "ID", conflicts_with = "new")]
    pub continues: Option<StoryId>,

    /// Start fresh without continuation context
    #[arg(long)]
    pub new: bool,

    /// Replace existing story files without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Workspace root (default: nearest .git ancestor of the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

impl StoryArgs {
    fn continuation(&self) -> ContinuationMode {
        match (&self.continues, self.new) {
            (Some(previous), _) => ContinuationMode::Continues(previous.clone()),
            (None, true) => ContinuationMode::New,
            (None, false) => ContinuationMode::Ask,
        }
    }
}

pub async fn execute(args: StoryArgs, app: &App, verbose: bool) -> Result<()> {
    let interaction = Arc::new(TerminalInteraction::stdio(args.yes, verbose));
    let orchestrator = app.orchestrator(interaction)?;
    let continuation = args.continuation();

    let outcome = orchestrator
        .run(RunTarget::Story {
            id: args.id,
            root: args.root,
            language: args.language,
            continuation,
        })
        .await?;

    app.output.print_success_flat(outcome);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: StoryArgs,
    }

    #[test]
    fn test_continuation_flags() {
        let h = Harness::try_parse_from(["t", "PROJ-2", "--continues", "PROJ-1"]).unwrap();
        assert_eq!(
            h.args.continuation(),
            ContinuationMode::Continues("PROJ-1".parse().unwrap())
        );

        let h = Harness::try_parse_from(["t", "PROJ-2", "--new"]).unwrap();
        assert_eq!(h.args.continuation(), ContinuationMode::New);

        let h = Harness::try_parse_from(["t"]).unwrap();
        assert!(h.args.id.is_none());
        assert_eq!(h.args.continuation(), ContinuationMode::Ask);
    }

    #[test]
    fn test_rejects_invalid_ids_and_conflicting_flags() {
        assert!(Harness::try_parse_from(["t", "proj-2"]).is_err());
        assert!(Harness::try_parse_from(["t", "PROJ-2", "--new", "--continues", "PROJ-1"]).is_err());
    }
}
