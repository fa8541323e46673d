//! Issue-tracker work items

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::language::Language;

static STORY_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]+-\d+$").expect("static story id pattern"));

/// Minimum length for a line to count as a requirement
const MIN_REQUIREMENT_LEN: usize = 10;

/// Validated story identifier, e.g. `PROJ-123`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoryId(String);

impl StoryId {
    /// Validate raw input, returning the message shown inline on rejection
    pub fn validate(input: &str) -> Result<(), String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err("Story ID cannot be empty".to_string());
        }
        if !STORY_ID_PATTERN.is_match(trimmed) {
            return Err("Format must be like PROJ-123".to_string());
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `PROJ-12` -> `proj_12`
    pub fn slug(&self) -> String {
        self.0.to_lowercase().replace('-', "_")
    }

    /// Output file names for this story: `(test, production)`
    pub fn file_names(&self, language: Language) -> (String, String) {
        let slug = self.slug();
        let config = language.config();
        let test = format!(
            "{}{}{}",
            slug, config.test_file_suffix, config.test_file_extension
        );
        let production = format!("{}{}", slug, config.production_extension);
        (test, production)
    }
}

impl FromStr for StoryId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)?;
        Ok(Self(s.trim().to_string()))
    }
}

impl TryFrom<String> for StoryId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StoryId> for String {
    fn from(id: StoryId) -> Self {
        id.0
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A story fetched from the issue tracker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub description: String,
    pub acceptance_criteria: String,
    pub status: String,
    pub issue_type: String,
}

impl Story {
    /// Testable requirements: the title, then acceptance criteria lines,
    /// falling back to description lines when the criteria yield nothing.
    pub fn requirements(&self) -> Vec<String> {
        let mut requirements = Vec::new();

        if !self.title.is_empty() {
            requirements.push(self.title.clone());
        }

        requirements.extend(requirement_lines(&self.acceptance_criteria));

        if requirements.len() <= 1 {
            requirements.extend(requirement_lines(&self.description));
        }

        requirements
    }
}

fn requirement_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '•', '*'])
                .trim()
                .to_string()
        })
        .filter(|line| line.chars().count() > MIN_REQUIREMENT_LEN)
}

/// Numbered requirement list for the generation request
pub fn format_requirements(requirements: &[String]) -> String {
    if requirements.is_empty() {
        return "No requirements found.".to_string();
    }

    let mut lines = vec!["## Requirements from Jira Story\n".to_string()];
    for (i, req) in requirements.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, req));
    }
    lines.join("\n")
}

/// Pull the lines following an "acceptance criteria" heading, up to the
/// first blank line after at least one criterion.
pub fn acceptance_criteria_section(description: &str) -> String {
    let mut capturing = false;
    let mut criteria: Vec<&str> = Vec::new();

    for line in description.lines() {
        let lower = line.to_lowercase();
        if lower.contains("acceptance criteria") || lower.contains("acceptance criterion") {
            capturing = true;
            continue;
        }
        if capturing {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                if !criteria.is_empty() {
                    break;
                }
                continue;
            }
            criteria.push(trimmed);
        }
    }

    criteria.join("\n")
}
