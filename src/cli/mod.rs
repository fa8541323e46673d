//! CLI module for testgenie
//!
//! Provides command-line interface using clap derive macros.

pub mod commands;
pub mod output;
pub mod prompt;

pub use output::OutputContext;
pub use prompt::TerminalInteraction;

use clap::{Parser, Subcommand};

use commands::{
    config::ConfigArgs, detect::DetectArgs, generate::GenerateArgs, story::StoryArgs,
    symbols::SymbolsArgs,
};

const LONG_ABOUT: &str = r#"
testgenie - Generate unit tests from source files or issue-tracker stories

Symbols are extracted locally with tree-sitter; test code is produced by the
configured generation service and written next to the source (or in the
project root for stories). Existing files are never replaced without asking.

QUICK START:
  1. Create a config:         testgenie config init --global
  2. Set the API key:         export OPENAI_API_KEY=...
  3. Generate tests:          testgenie generate src/utils.py

STORY EXAMPLES:
  testgenie story PROJ-123                       # Detect language, ask about continuation
  testgenie story PROJ-124 --continues PROJ-123  # Build on earlier story files
  testgenie story PROJ-125 --new -l java --yes

INSPECTION:
  testgenie symbols src/Calc.java
  testgenie detect
  testgenie languages
"#;

/// testgenie - unit test generation for Python, JavaScript, TypeScript and Java
#[derive(Parser, Debug)]
#[command(name = "testgenie")]
#[command(author, version, about, long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
#[command(after_help = "Use 'testgenie <COMMAND> --help' for more information about a command.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show stage progress on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate tests for a source file
    Generate(GenerateArgs),

    /// Generate tests and production code for a story
    Story(StoryArgs),

    /// List functions and classes found in a file
    Symbols(SymbolsArgs),

    /// Detect the project language and test framework
    Detect(DetectArgs),

    /// List supported languages
    Languages,

    /// Configuration management
    Config(ConfigArgs),
}
