use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MODEL: &str = "deepseek-chat";
const DEFAULT_API_ENDPOINT: &str = "https://api.deepseek.com/v1";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Local truncation ceilings applied before dispatch.
pub const SYSTEM_PROMPT_MAX_CHARS: usize = 5_000;
pub const USER_MESSAGE_MAX_CHARS: usize = 1_000;

/// Output budget for conversational partner replies. Tutor calls are
/// uncapped because the feedback object does not have a predictable size.
const PARTNER_MAX_TOKENS: u32 = 50;

/// Which half of the pipeline a completion call serves. Only the
/// output-length ceiling differs between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    Tutor,
    Partner,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("could not reach completion provider: {0}")]
    Connection(String),
    #[error("completion request timed out")]
    Timeout,
    #[error("completion provider rate limited the request")]
    RateLimit,
    #[error("completion provider error: {0}")]
    Provider(String),
}

/// Boundary to the external text-generation API. The orchestrator only
/// sees this trait, so tests can substitute a scripted fake.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        temperature: f32,
        role: TurnRole,
    ) -> Result<String, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_endpoint: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let api_key = env_string("LLM_API_KEY");
        let model = env_string("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_endpoint = normalize_endpoint(
            env_string("LLM_API_ENDPOINT")
                .or_else(|| env_string("LLM_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
        );
        let timeout = Duration::from_millis(env_u64("LLM_TIMEOUT").unwrap_or(DEFAULT_TIMEOUT_MS));

        Self {
            api_key,
            model,
            api_endpoint,
            timeout,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// reqwest-backed gateway. One attempt per call; retry policy, if any,
/// belongs to the caller.
#[derive(Clone)]
pub struct LlmGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl LlmGateway {
    pub fn new(config: GatewayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, client }
    }

    pub fn from_env() -> Self {
        Self::new(GatewayConfig::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }
}

#[async_trait]
impl CompletionGateway for LlmGateway {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        temperature: f32,
        role: TurnRole,
    ) -> Result<String, GatewayError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| GatewayError::Provider("LLM_API_KEY not configured".to_string()))?;

        let system_prompt = truncate_chars(system_prompt, SYSTEM_PROMPT_MAX_CHARS);
        let user_message = truncate_chars(user_message, USER_MESSAGE_MAX_CHARS);

        let url = format!(
            "{}/chat/completions",
            self.config.api_endpoint.trim_end_matches('/')
        );
        let messages = [
            ChatMessage {
                role: "system".into(),
                content: system_prompt.into_owned(),
            },
            ChatMessage {
                role: "user".into(),
                content: user_message.into_owned(),
            },
        ];
        let mut payload = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": temperature,
            "stream": false
        });
        if role == TurnRole::Partner {
            payload["max_tokens"] = serde_json::json!(PARTNER_MAX_TOKENS);
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GatewayError::RateLimit);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Provider(format!("HTTP {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Provider(format!("undecodable response body: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::Provider("response contained no choices".to_string()))
    }
}

fn classify_request_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Connection(err.to_string())
    }
}

/// Cuts `text` to at most `max_chars` characters without splitting a
/// multi-byte character.
fn truncate_chars(text: &str, max_chars: usize) -> std::borrow::Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => std::borrow::Cow::Borrowed(&text[..byte_idx]),
        None => std::borrow::Cow::Borrowed(text),
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}

fn normalize_endpoint(endpoint: String) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.ends_with("/v1") || trimmed.contains("/v1/") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}
