//! Gemini `generateContent` client.

use std::time::Duration;

use lessonforge_shared::{AppConfig, LessonForgeError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::{GenerationRequest, GenerationResponse, TextGenerator};

/// Default timeout in seconds for a single generation call.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Longest slice of an error body carried into a log line.
const MAX_LOGGED_BODY: usize = 200;

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("LessonForge/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Connection settings, passed explicitly at construction time.
#[derive(Clone)]
pub struct GeminiOptions {
    /// API base, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub endpoint: Url,
    pub model: String,
    pub api_key: String,
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl GeminiOptions {
    /// Build options from the app config and an already-resolved API key.
    pub fn from_config(config: &AppConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            endpoint: config.provider.endpoint_url()?,
            model: config.provider.model.clone(),
            api_key: api_key.into(),
            timeout_secs: config.provider.timeout_secs,
        })
    }
}

impl std::fmt::Debug for GeminiOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiOptions")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: WireGenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Live client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    url: Url,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Build a client. No network traffic happens here.
    pub fn new(opts: GeminiOptions) -> Result<Self> {
        let url = generate_url(&opts.endpoint, &opts.model)?;
        let timeout = Duration::from_secs(if opts.timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            opts.timeout_secs
        });
        let client = build_client(timeout)?;

        Ok(Self {
            client,
            url,
            model: opts.model,
            api_key: opts.api_key,
            timeout,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> LessonForgeError {
        if e.is_timeout() {
            return LessonForgeError::Timeout(self.timeout);
        }
        LessonForgeError::transport(format!("request to {} failed: {e}", self.url))
    }
}

impl TextGenerator for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model, prompt_len = request.prompt.len()))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let body = GeminiRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: WireGenerationConfig {
                temperature: request.params.temperature,
                top_p: request.params.top_p,
                top_k: request.params.top_k,
                max_output_tokens: request.params.max_output_tokens,
            },
        };

        info!(url = %self.url, "calling generative service");

        let response = self
            .client
            .post(self.url.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            let msg = serde_json::from_str::<GeminiError>(&response_text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| truncate(&response_text, MAX_LOGGED_BODY).to_string());
            warn!(status = status.as_u16(), error = %msg, "generative service returned an error");
            return Err(LessonForgeError::Transport {
                message: format!("generative service error ({}): {msg}", status.as_u16()),
                body: Some(response_text),
            });
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text).map_err(|e| {
            LessonForgeError::Transport {
                message: format!("unreadable generative service response: {e}"),
                body: Some(response_text.clone()),
            }
        })?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            return Err(LessonForgeError::Transport {
                message: "generative service returned no candidates".into(),
                body: Some(response_text),
            });
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let (tokens_in, tokens_out) = parsed
            .usage_metadata
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        debug!(
            text_len = text.len(),
            tokens_in,
            tokens_out,
            finish_reason = candidate.finish_reason.as_deref().unwrap_or("unknown"),
            "generation complete"
        );

        Ok(GenerationResponse {
            text,
            model: parsed.model_version.unwrap_or_else(|| self.model.clone()),
            tokens_in,
            tokens_out,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `{endpoint}/models/{model}:generateContent`
fn generate_url(endpoint: &Url, model: &str) -> Result<Url> {
    let base = endpoint.as_str().trim_end_matches('/');
    let raw = format!("{base}/models/{model}:generateContent");
    Url::parse(&raw)
        .map_err(|e| LessonForgeError::config(format!("invalid generation URL '{raw}': {e}")))
}

/// Build a reqwest client with appropriate settings.
fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(timeout)
        .build()
        .map_err(|e| LessonForgeError::transport(format!("failed to build HTTP client: {e}")))
}

/// Cut a string to at most `max` bytes on a char boundary.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GenerationParams;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-2.0-flash";

    fn client_for(server: &MockServer, timeout_secs: u64) -> GeminiClient {
        GeminiClient::new(GeminiOptions {
            endpoint: Url::parse(&server.uri()).unwrap(),
            model: MODEL.into(),
            api_key: "test-key".into(),
            timeout_secs,
        })
        .unwrap()
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "Create an assignment about stacks".into(),
            params: GenerationParams::default(),
        }
    }

    fn generate_path() -> String {
        format!("/models/{MODEL}:generateContent")
    }

    #[test]
    fn generate_url_appends_model_path() {
        let base = Url::parse("https://generativelanguage.googleapis.com/v1beta").unwrap();
        let url = generate_url(&base, MODEL).unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn generate_url_tolerates_trailing_slash() {
        let base = Url::parse("http://localhost:8080/").unwrap();
        let url = generate_url(&base, MODEL).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn options_debug_redacts_key() {
        let opts = GeminiOptions {
            endpoint: Url::parse("http://localhost").unwrap(),
            model: MODEL.into(),
            api_key: "super-secret".into(),
            timeout_secs: 5,
        };
        let rendered = format!("{opts:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn options_from_default_config() {
        let opts = GeminiOptions::from_config(&AppConfig::default(), "k").unwrap();
        assert_eq!(opts.model, MODEL);
        assert_eq!(opts.timeout_secs, 60);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("short", 100), "short");
    }

    #[tokio::test]
    async fn test_generate_with_mock_server() {
        let server = MockServer::start().await;

        let body = std::fs::read_to_string("../../../fixtures/responses/gemini-success.json")
            .expect("read gemini fixture");

        Mock::given(method("POST"))
            .and(path(generate_path()))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{ "role": "user" }],
                "generationConfig": { "topK": 40, "maxOutputTokens": 8192 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 5);
        let response = client.generate(&request()).await.unwrap();

        assert!(response.text.contains("\"assignment\""));
        assert!(response.text.starts_with("Here is your assignment"));
        assert_eq!(response.tokens_in, 412);
        assert_eq!(response.tokens_out, 987);
        assert_eq!(response.model, "gemini-2.0-flash-001");
    }

    #[tokio::test]
    async fn test_generate_concatenates_parts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(generate_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] },
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let response = client_for(&server, 5).generate(&request()).await.unwrap();
        assert_eq!(response.text, "{\"a\":1}");
        assert_eq!(response.model, MODEL);
        assert_eq!(response.tokens_in, 0);
    }

    #[tokio::test]
    async fn test_generate_http_error_is_transport_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(generate_path()))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, 5)
            .generate(&request())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(lessonforge_shared::PipelineStage::Transport));
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Resource has been exhausted"));
        assert!(err.raw_response().unwrap().contains("RESOURCE_EXHAUSTED"));
    }

    #[tokio::test]
    async fn test_generate_without_candidates_fails() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(generate_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, 5)
            .generate(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, LessonForgeError::Transport { .. }));
        assert!(err.to_string().contains("no candidates"));
    }

    #[tokio::test]
    async fn test_generate_slow_server_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(generate_path()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{}")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = client_for(&server, 1)
            .generate(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, LessonForgeError::Timeout(d) if d == Duration::from_secs(1)));
        assert_eq!(err.stage(), Some(lessonforge_shared::PipelineStage::Transport));
    }
}
