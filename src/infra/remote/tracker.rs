//! Jira issue tracker client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;

use super::{IssueTracker, map_send_error};
use crate::error::RemoteError;
use crate::models::config::TrackerCredentials;
use crate::models::story::{Story, StoryId, acceptance_criteria_section};

const ACCEPTANCE_CRITERIA_FIELD: &str = "customfield_10016";

/// ADF node types that end a line of text
const BLOCK_NODES: &[&str] = &[
    "paragraph",
    "heading",
    "listItem",
    "codeBlock",
    "blockquote",
    "tableRow",
    "rule",
];

pub struct JiraClient {
    client: reqwest::Client,
    credentials: TrackerCredentials,
    timeout_secs: u64,
}

impl JiraClient {
    pub fn new(credentials: TrackerCredentials, timeout_secs: u64) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            credentials,
            timeout_secs,
        })
    }

    fn issue_url(&self, id: &StoryId) -> String {
        format!(
            "{}/rest/api/3/issue/{}",
            self.credentials.url.trim_end_matches('/'),
            id
        )
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn fetch_story(&self, id: &StoryId) -> Result<Story, RemoteError> {
        let url = self.issue_url(id);
        tracing::info!("Fetching story {} from {}", id, url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.credentials.email, Some(&self.credentials.token))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        match status {
            StatusCode::NOT_FOUND => {
                return Err(RemoteError::Tracker(format!(
                    "Story '{}' not found in Jira.",
                    id
                )));
            }
            StatusCode::UNAUTHORIZED => {
                return Err(RemoteError::Tracker(
                    "Invalid Jira credentials. Check your email and API token.".to_string(),
                ));
            }
            s if !s.is_success() => {
                return Err(RemoteError::Tracker(format!(
                    "Jira API error: {} {}",
                    s.as_u16(),
                    body
                )));
            }
            _ => {}
        }

        let data: Value = serde_json::from_str(&body).map_err(|e| RemoteError::InvalidResponse {
            service: "Jira",
            message: e.to_string(),
        })?;

        Ok(parse_issue(&data, id))
    }
}

fn parse_issue(data: &Value, requested: &StoryId) -> Story {
    let fields = data.get("fields").cloned().unwrap_or(Value::Null);
    let field_str = |path: &[&str]| -> String {
        path.iter()
            .try_fold(&fields, |v, key| v.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let description = fields
        .get("description")
        .map(adf_to_text)
        .unwrap_or_default();

    let mut acceptance_criteria = fields
        .get(ACCEPTANCE_CRITERIA_FIELD)
        .map(adf_to_text)
        .unwrap_or_default();
    if acceptance_criteria.is_empty() {
        acceptance_criteria = acceptance_criteria_section(&description);
    }

    Story {
        id: data
            .get("key")
            .and_then(Value::as_str)
            .unwrap_or(requested.as_str())
            .to_string(),
        title: field_str(&["summary"]),
        description,
        acceptance_criteria,
        status: field_str(&["status", "name"]),
        issue_type: field_str(&["issuetype", "name"]),
    }
}

/// Flatten Atlassian Document Format into plain text, one line per block
pub fn adf_to_text(node: &Value) -> String {
    let mut out = String::new();
    walk_adf(node, &mut out);

    out.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn walk_adf(node: &Value, out: &mut String) {
    match node {
        Value::Object(map) => {
            let node_type = map.get("type").and_then(Value::as_str).unwrap_or_default();
            match node_type {
                "text" => {
                    if let Some(text) = map.get("text").and_then(Value::as_str) {
                        out.push_str(text);
                    }
                }
                "hardBreak" => out.push('\n'),
                _ => {}
            }

            if let Some(children) = map.get("content") {
                walk_adf(children, out);
            }

            if BLOCK_NODES.contains(&node_type) && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_adf(item, out);
            }
        }
        // v2 API returns plain strings
        Value::String(text) => out.push_str(text),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn credentials(url: &str) -> TrackerCredentials {
        TrackerCredentials {
            url: url.to_string(),
            email: "dev@example.com".to_string(),
            token: "secret".to_string(),
        }
    }

    fn paragraph(text: &str) -> Value {
        json!({"type": "paragraph", "content": [{"type": "text", "text": text}]})
    }

    fn story_id(id: &str) -> StoryId {
        id.parse().unwrap()
    }

    #[test]
    fn test_adf_to_text() {
        let doc = json!({
            "type": "doc",
            "version": 1,
            "content": [
                paragraph("Users can log in."),
                {
                    "type": "bulletList",
                    "content": [
                        {"type": "listItem", "content": [paragraph("Valid password is accepted")]},
                        {"type": "listItem", "content": [paragraph("Wrong password is rejected")]},
                    ]
                }
            ]
        });

        assert_eq!(
            adf_to_text(&doc),
            "Users can log in.\nValid password is accepted\nWrong password is rejected"
        );
        assert_eq!(adf_to_text(&Value::Null), "");
        assert_eq!(adf_to_text(&json!(5)), "");
    }

    #[test]
    fn test_parse_issue_falls_back_to_description_criteria() {
        let data = json!({
            "key": "PROJ-9",
            "fields": {
                "summary": "Password reset",
                "status": {"name": "To Do"},
                "issuetype": {"name": "Story"},
                "description": {
                    "type": "doc",
                    "content": [
                        paragraph("Context line"),
                        {"type": "heading", "content": [{"type": "text", "text": "Acceptance Criteria"}]},
                        paragraph("- Reset email is sent within a minute"),
                    ]
                },
                "customfield_10016": null
            }
        });

        let story = parse_issue(&data, &story_id("PROJ-9"));
        assert_eq!(story.id, "PROJ-9");
        assert_eq!(story.title, "Password reset");
        assert_eq!(story.status, "To Do");
        assert_eq!(story.issue_type, "Story");
        assert_eq!(story.acceptance_criteria, "- Reset email is sent within a minute");
        assert_eq!(
            story.requirements(),
            vec![
                "Password reset".to_string(),
                "Reset email is sent within a minute".to_string()
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_story() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/3/issue/PROJ-1")
            .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
            .with_status(200)
            .with_body(
                json!({
                    "key": "PROJ-1",
                    "fields": {
                        "summary": "Add two numbers",
                        "description": {"type": "doc", "content": [paragraph("Sum integers")]},
                        "customfield_10016": {"type": "doc", "content": [paragraph("* add(1, 2) returns 3")]}
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = JiraClient::new(credentials(&server.url()), 5).unwrap();
        let story = client.fetch_story(&story_id("PROJ-1")).await.unwrap();

        assert_eq!(story.title, "Add two numbers");
        assert_eq!(story.description, "Sum integers");
        assert_eq!(story.acceptance_criteria, "* add(1, 2) returns 3");
        mock.assert_async().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_story_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/api/3/issue/PROJ-404")
            .with_status(404)
            .create_async()
            .await;

        let client = JiraClient::new(credentials(&server.url()), 5).unwrap();
        let err = client.fetch_story(&story_id("PROJ-404")).await.unwrap_err();
        assert_eq!(err.to_string(), "Story 'PROJ-404' not found in Jira.");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_story_bad_credentials() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/api/3/issue/PROJ-2")
            .with_status(401)
            .create_async()
            .await;

        let client = JiraClient::new(credentials(&server.url()), 5).unwrap();
        let err = client.fetch_story(&story_id("PROJ-2")).await.unwrap_err();
        assert!(err.to_string().starts_with("Invalid Jira credentials"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_story_other_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/api/3/issue/PROJ-3")
            .with_status(500)
            .with_body("maintenance")
            .create_async()
            .await;

        let client = JiraClient::new(credentials(&server.url()), 5).unwrap();
        let err = client.fetch_story(&story_id("PROJ-3")).await.unwrap_err();
        assert_eq!(err.to_string(), "Jira API error: 500 maintenance");
    }
}
