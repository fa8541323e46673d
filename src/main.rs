//! testgenie - unit test generation CLI

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use testgenie::app::App;
use testgenie::cli::output::{failure_envelope, print_json};
use testgenie::cli::{Cli, Commands};

fn main() {
    // Quiet by default; RUST_LOG=testgenie=debug for verbose output.
    // stdout carries only the JSON result.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "testgenie=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            print_json(&failure_envelope(&anyhow::anyhow!(
                "Failed to create runtime: {}",
                e
            )));
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(async_main()) {
        print_json(&failure_envelope(&e));
        std::process::exit(2);
    }
}

async fn async_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Config commands must work even when the config file is broken
    let strict = !matches!(cli.command, Commands::Config(_));
    let app = App::load(strict).await?;

    execute_command(cli.command, &app, cli.verbose).await
}

async fn execute_command(command: Commands, app: &App, verbose: bool) -> anyhow::Result<()> {
    use testgenie::cli::commands;

    match command {
        // Generation
        Commands::Generate(args) => commands::generate::execute(args, app, verbose).await,
        Commands::Story(args) => commands::story::execute(args, app, verbose).await,

        // Inspection
        Commands::Symbols(args) => commands::symbols::execute(args, app).await,
        Commands::Detect(args) => commands::detect::execute(args, app).await,
        Commands::Languages => commands::languages::execute(app),

        Commands::Config(args) => commands::config::execute(args, app).await,
    }
}
