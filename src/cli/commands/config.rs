//! Config command implementation
//!
//! `init`, `show`, `path` and `edit` for the global or project file.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::App;
use crate::models::config::TestGenieConfig;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Initialize configuration file
    Init {
        /// Initialize global config (~/.config/testgenie)
        #[arg(long)]
        global: bool,

        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    Show {
        /// Show global config only
        #[arg(long)]
        global: bool,
    },

    /// Show config file path
    Path {
        /// Show global config path
        #[arg(long)]
        global: bool,
    },

    /// Edit configuration with default editor
    Edit {
        /// Edit global config
        #[arg(long)]
        global: bool,
    },
}

#[derive(Serialize)]
struct ConfigInitResponse {
    status: String,
    path: String,
    level: &'static str,
}

#[derive(Serialize)]
struct ConfigShowResponse {
    level: &'static str,
    config: serde_json::Value,
}

#[derive(Serialize)]
struct ConfigPathResponse {
    level: &'static str,
    path: String,
    exists: bool,
}

#[derive(Serialize)]
struct ConfigEditResponse {
    status: String,
    path: String,
}

/// Secrets are reported as set or unset, never echoed
fn config_to_json(config: &TestGenieConfig) -> serde_json::Value {
    let secret = |v: &Option<String>| v.as_deref().map(|_| "********");
    serde_json::json!({
        "generation": {
            "backend_url": config.generation.backend_url,
            "timeout_secs": config.generation.timeout_secs,
            "api_key": secret(&config.generation.api_key),
        },
        "tracker": {
            "url": config.tracker.url,
            "email": config.tracker.email,
            "token": secret(&config.tracker.token),
        },
        "output": {
            "format": config.output.format,
        },
    })
}

fn level(global: bool) -> &'static str {
    if global { "global" } else { "project" }
}

pub async fn execute(args: ConfigArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let shown = |path: &Path, global: bool| {
        if global {
            path.display().to_string()
        } else {
            ctx.relative_path(path)
        }
    };

    match args.command {
        ConfigCommand::Init { global, force } => {
            let path = app.config_service.init(global, force).await?;
            ctx.print_success_flat(ConfigInitResponse {
                status: "created".to_string(),
                path: shown(&path, global),
                level: level(global),
            });
        }

        ConfigCommand::Show { global } => {
            let config = app.config_service.load(global).await?;
            ctx.print_success_flat(ConfigShowResponse {
                level: if global { "global" } else { "merged" },
                config: config_to_json(&config),
            });
        }

        ConfigCommand::Path { global } => {
            let path = app.config_service.config_path(global);
            ctx.print_success_flat(ConfigPathResponse {
                level: level(global),
                path: shown(&path, global),
                exists: path.exists(),
            });
        }

        ConfigCommand::Edit { global } => {
            let path = app.config_service.edit(global).await?;
            ctx.print_success_flat(ConfigEditResponse {
                status: "opened".to_string(),
                path: shown(&path, global),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_masks_secrets() {
        let mut config = TestGenieConfig::default();
        config.generation.api_key = Some("sk-secret".to_string());
        config.tracker.email = Some("dev@acme.io".to_string());

        let value = config_to_json(&config);
        assert_eq!(value["generation"]["api_key"], "********");
        assert_eq!(value["tracker"]["email"], "dev@acme.io");
        assert!(value["tracker"]["token"].is_null());
        assert!(!value.to_string().contains("sk-secret"));
    }
}
