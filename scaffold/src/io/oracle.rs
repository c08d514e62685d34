//! Client for the external generation service (OpenAI-compatible chat
//! completions API).
//!
//! One synchronous request per run. The credential is looked up before the
//! client is built, so a missing key fails without any network traffic.

use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::error::ScaffoldError;
use crate::io::config::GenerationConfig;

/// Fixed role description sent as the system message.
pub const SYSTEM_PROMPT: &str = "You generate WebdriverIO + Appium TypeScript test artifacts \
(a mocha spec, a page object and a JSON locator file) for a mobile app. You follow the \
instructions exactly and reply with a single JSON object, never prose.";

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system: String,
    pub instruction: String,
    pub temperature: f32,
}

/// Something that turns an instruction into raw response text.
pub trait GenerationService {
    fn complete(&self, request: &GenerationRequest) -> Result<String>;
}

pub struct OpenAiService {
    client: Client,
    url: String,
    api_key: String,
}

impl OpenAiService {
    /// Build a client from config, reading the key through `lookup`
    /// (usually `std::env::var`).
    pub fn from_config<F>(config: &GenerationConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(&config.api_key_env)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ScaffoldError::MissingCredential {
                var: config.api_key_env.clone(),
            })?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("build generation http client")?;
        Ok(Self {
            client,
            url: chat_completions_url(&config.endpoint),
            api_key,
        })
    }
}

fn chat_completions_url(endpoint: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else {
        format!("{base}/chat/completions")
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

impl GenerationService for OpenAiService {
    #[instrument(skip_all, fields(model = %request.model, url = %self.url))]
    fn complete(&self, request: &GenerationRequest) -> Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .context("api key is not a valid header value")?,
        );

        let body = ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.instruction,
                },
            ],
            temperature: request.temperature,
            response_format: json!({ "type": "json_object" }),
        };

        debug!(instruction_bytes = request.instruction.len(), "sending generation request");
        let response = self
            .client
            .post(&self.url)
            .headers(headers)
            .json(&body)
            .send()
            .context("send generation request")?;

        let status = response.status();
        let text = response.text().context("read generation response")?;
        if !status.is_success() {
            bail!("generation service returned HTTP {status}: {}", text.trim());
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).context("decode generation response envelope")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("generation response has no message content"))?;
        info!(response_bytes = content.len(), "generation response received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_fails_before_network() {
        let config = GenerationConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            ..GenerationConfig::default()
        };
        let err = OpenAiService::from_config(&config, |_| None)
            .err()
            .expect("missing key");
        assert!(matches!(
            err.downcast_ref::<ScaffoldError>(),
            Some(ScaffoldError::MissingCredential { var }) if var == "OPENAI_API_KEY"
        ));
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let config = GenerationConfig::default();
        assert!(OpenAiService::from_config(&config, |_| Some("  ".to_string())).is_err());
    }

    #[test]
    fn completions_url_is_normalized() {
        assert_eq!(
            chat_completions_url("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            chat_completions_url("http://localhost:8080/v1/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn request_body_has_system_and_user_messages() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "do it",
                },
            ],
            temperature: 0.2,
            response_format: json!({ "type": "json_object" }),
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["response_format"]["type"], "json_object");
    }
}
