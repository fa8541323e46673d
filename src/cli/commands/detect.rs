//! Detect command implementation

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::App;
use crate::services::context::resolve_workspace_root;
use crate::services::framework::{TestFramework, resolve_framework};

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Project directory (default: current workspace root)
    pub path: Option<PathBuf>,
}

#[derive(Serialize)]
struct DetectResponse {
    path: String,
    /// `null` means a run would ask for the language
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    framework: Option<TestFramework>,
}

pub async fn execute(args: DetectArgs, app: &App) -> Result<()> {
    let root = resolve_workspace_root(args.path.as_deref())?;
    let language = app.detector.detect_project_language(&root);
    let framework = language.map(|l| resolve_framework(&root, l.config()));

    app.output.print_success_flat(DetectResponse {
        path: root.display().to_string(),
        language: language.map(|l| l.id().to_string()),
        label: language.map(|l| l.label()),
        framework,
    });
    Ok(())
}
