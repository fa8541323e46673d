//! Languages command implementation

use anyhow::Result;
use serde::Serialize;

use crate::app::App;
use crate::models::language::Language;

#[derive(Serialize)]
struct LanguageEntry {
    id: &'static str,
    label: &'static str,
    grammar: &'static str,
    test_framework: &'static str,
    test_file_pattern: String,
}

#[derive(Serialize)]
struct LanguagesResponse {
    count: usize,
    languages: Vec<LanguageEntry>,
}

pub fn execute(app: &App) -> Result<()> {
    let languages: Vec<LanguageEntry> = Language::ALL
        .iter()
        .map(|lang| {
            let config = lang.config();
            LanguageEntry {
                id: lang.id(),
                label: lang.label(),
                grammar: config.grammar.resource_name(),
                test_framework: config.test_framework,
                test_file_pattern: format!(
                    "<name>{}{}",
                    config.test_file_suffix, config.test_file_extension
                ),
            }
        })
        .collect();

    app.output.print_success_flat(LanguagesResponse {
        count: languages.len(),
        languages,
    });
    Ok(())
}
