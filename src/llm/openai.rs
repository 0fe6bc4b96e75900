use super::CompletionProvider;
use crate::config::LlmConfig;
use crate::weather::transport::truncate_body;
use crate::{BriefError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Client for the OpenAI text completions endpoint. Single attempt, no retry.
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BriefError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<Vec<String>> {
        let start_time = Instant::now();
        let request = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            n: 1,
        };

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BriefError::network(format!("Completion request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BriefError::network(format!("Failed to read completion response: {e}")))?;

        debug!(
            "Completion response {} in {:.3}s",
            status,
            start_time.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            BriefError::provider(format!("Failed to parse completion response: {e}"))
        })?;

        Ok(parsed.choices.into_iter().map(|choice| choice.text).collect())
    }
}

fn classify_failure(status: StatusCode, body: &str) -> BriefError {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .map(|err| err.error.message)
        .unwrap_or_else(|_| truncate_body(body));
    warn!("Completion request failed with {}: {}", status, detail);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BriefError::authentication(detail),
        StatusCode::TOO_MANY_REQUESTS => BriefError::rate_limit(detail),
        _ => BriefError::provider(format!("Completion request failed with {status}: {detail}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenAiClient {
        let config = LlmConfig {
            base_url: format!("{}/v1/", server.uri()),
            ..LlmConfig::default()
        };
        OpenAiClient::new(&config, "sk-test").unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_choice_texts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo-instruct",
                "prompt": "Summarize today",
                "n": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cmpl-1",
                "object": "text_completion",
                "choices": [{"text": "\nSunny all day.", "index": 0, "finish_reason": "stop"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let texts = client(&server).generate("Summarize today").await.unwrap();
        assert_eq!(texts, vec!["\nSunny all day.".to_string()]);
    }

    #[tokio::test]
    async fn test_unauthorized_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).generate("p").await.unwrap_err();
        assert!(matches!(err, BriefError::Authentication { .. }));
        assert!(err.to_string().contains("Incorrect API key"));
    }

    #[tokio::test]
    async fn test_throttling_is_rate_limit_error_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).generate("p").await.unwrap_err();
        assert!(matches!(err, BriefError::RateLimit { .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).generate("p").await.unwrap_err();
        assert!(matches!(err, BriefError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server).generate("p").await.unwrap_err();
        assert!(matches!(err, BriefError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_missing_choices_yield_no_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "cmpl-2"})))
            .mount(&server)
            .await;

        let texts = client(&server).generate("p").await.unwrap();
        assert!(texts.is_empty());
    }
}
