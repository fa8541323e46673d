//! HTTP client for the generation backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};

use super::{GenerationService, map_send_error};
use crate::error::RemoteError;
use crate::models::config::GenerationConfig;
use crate::models::generation::{ErrorBody, GenerationRequest, GenerationResponse};

const SOURCE_ENDPOINT: &str = "/generate/ai/full";
const STORY_ENDPOINT: &str = "/generate/story";
const SERVICE_NAME: &str = "generation service";

pub struct HttpGenerationClient {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
    api_key: Option<String>,
}

impl HttpGenerationClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
            api_key: config.require_api_key().map(str::to_string),
        })
    }

    fn endpoint(&self, request: &GenerationRequest) -> String {
        let path = if request.story.is_some() {
            STORY_ENDPOINT
        } else {
            SOURCE_ENDPOINT
        };
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl GenerationService for HttpGenerationClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, RemoteError> {
        let url = self.endpoint(request);
        tracing::info!("Requesting {} generation from {}", request.language, url);

        let response = self
            .client
            .post(&url)
            .json(&request.to_body(self.api_key.as_deref()))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail)
                .unwrap_or_else(|| format!("Backend error: {}", status.as_u16()));
            tracing::debug!("Generation failed with {}: {}", status, detail);
            return Err(RemoteError::Service {
                status: status.as_u16(),
                detail,
            });
        }

        let mut parsed: GenerationResponse =
            serde_json::from_str(&body).map_err(|e| RemoteError::InvalidResponse {
                service: SERVICE_NAME,
                message: e.to_string(),
            })?;

        parsed.test_code = strip_code_fences(&parsed.test_code);
        parsed.production_code = parsed
            .production_code
            .as_deref()
            .map(strip_code_fences)
            .filter(|code| !code.trim().is_empty());

        if parsed.test_code.trim().is_empty() {
            return Err(RemoteError::InvalidResponse {
                service: SERVICE_NAME,
                message: "response contained no test code".to_string(),
            });
        }

        Ok(parsed)
    }
}

/// Remove a surrounding markdown code fence, if any
pub fn strip_code_fences(code: &str) -> String {
    let trimmed = code.trim();
    if !trimmed.starts_with("```") {
        return code.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().skip(1).collect();
    if lines.last().is_some_and(|l| l.trim() == "```") {
        lines.pop();
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::language::Language;
    use crate::models::generation::StoryRef;
    use mockito::Server;
    use serde_json::json;

    fn config(url: &str) -> GenerationConfig {
        GenerationConfig {
            backend_url: format!("{}/", url),
            timeout_secs: 5,
            api_key: Some("sk-test".to_string()),
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("def add(a, b):\n    return a + b\n", Language::Python.config(), "/proj")
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_successful_generation() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/generate/ai/full")
            .match_body(mockito::Matcher::PartialJson(json!({
                "language": "python",
                "test_framework": "pytest",
                "api_key": "sk-test",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "content": "```python\ndef test_add():\n    assert add(1, 2) == 3\n```",
                    "filename": "utils_test.py",
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = HttpGenerationClient::new(&config(&server.url())).unwrap();
        let response = client.generate(&request()).await.unwrap();

        assert_eq!(
            response.test_code,
            "def test_add():\n    assert add(1, 2) == 3\n"
        );
        assert_eq!(response.production_code, None);
        mock.assert_async().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_story_request_uses_story_endpoint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/generate/story")
            .match_body(mockito::Matcher::PartialJson(json!({
                "story_id": "PROJ-7",
                "story_title": "Login",
            })))
            .with_status(200)
            .with_body(
                json!({
                    "test_code": "test('x', () => {});",
                    "production_code": "export const x = 1;",
                    "requirement_count": 3,
                })
                .to_string(),
            )
            .create_async()
            .await;

        let request = GenerationRequest::new("1. Login works", Language::JavaScript.config(), "/proj")
            .unwrap()
            .with_story(StoryRef {
                id: "PROJ-7".parse().unwrap(),
                title: "Login".to_string(),
                requirement_count: 1,
            });

        let client = HttpGenerationClient::new(&config(&server.url())).unwrap();
        let response = client.generate(&request).await.unwrap();

        assert_eq!(response.production_code.as_deref(), Some("export const x = 1;"));
        assert_eq!(response.requirement_count, Some(3));
        mock.assert_async().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_error_detail_is_verbatim() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/generate/ai/full")
            .with_status(429)
            .with_body(json!({"detail": "rate limited"}).to_string())
            .expect(1)
            .create_async()
            .await;

        let client = HttpGenerationClient::new(&config(&server.url())).unwrap();
        let err = client.generate(&request()).await.unwrap_err();

        assert_eq!(err.to_string(), "rate limited");
        assert_eq!(err.status(), Some(429));
        mock.assert_async().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_error_without_detail() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/generate/ai/full")
            .with_status(502)
            .with_body("<html>bad gateway</html>")
            .create_async()
            .await;

        let client = HttpGenerationClient::new(&config(&server.url())).unwrap();
        let err = client.generate(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "Backend error: 502");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_malformed_success_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/generate/ai/full")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = HttpGenerationClient::new(&config(&server.url())).unwrap();
        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, RemoteError::InvalidResponse { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unreachable_backend() {
        let client = HttpGenerationClient::new(&GenerationConfig {
            backend_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            api_key: None,
        })
        .unwrap();
        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            RemoteError::Network(_) | RemoteError::Timeout(_)
        ));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("x = 1\n"), "x = 1\n");
        assert_eq!(strip_code_fences("```\nx = 1\n```"), "x = 1\n");
        assert_eq!(strip_code_fences("```js\nconst a = 1;\n```\n"), "const a = 1;\n");
        assert_eq!(strip_code_fences("```java\nclass A {}"), "class A {}\n");
    }
}
