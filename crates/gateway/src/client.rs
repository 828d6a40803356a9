use crate::config::GatewayConfig;
use crate::error::GatewayError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ERROR_BODY_PREVIEW_CHARS: usize = 500;

/// One request/response exchange with a chat-completion model.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, GatewayError>;
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
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible `POST <base>/chat/completions` client.
///
/// No request timeout is configured; a hung endpoint holds the submission.
pub struct ChatCompletionsClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(config: &GatewayConfig, api_key: String) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .build()
            .map_err(|err| GatewayError::Client(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.endpoint(),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionsClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        log::debug!("POST {} (model {})", self.endpoint, self.model);
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| GatewayError::Remote {
                status: None,
                message: redact(&err.to_string(), &self.api_key),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| GatewayError::Remote {
            status: Some(status.as_u16()),
            message: redact(&format!("failed to read body: {err}"), &self.api_key),
        })?;

        if !status.is_success() {
            log::warn!("Remote endpoint returned {status}");
            return Err(GatewayError::Remote {
                status: Some(status.as_u16()),
                message: redact(
                    &format!("HTTP {}: {}", status.as_u16(), preview(&body)),
                    &self.api_key,
                ),
            });
        }

        extract_answer(&body)
    }
}

/// Pull `choices[0].message.content` out of a chat-completion body.
pub fn extract_answer(body: &str) -> Result<String, GatewayError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|err| GatewayError::MalformedResponse(format!("invalid JSON: {err}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| {
            GatewayError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}

fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

fn redact(message: &str, secret: &str) -> String {
    if secret.is_empty() {
        return message.to_string();
    }
    message.replace(secret, "<redacted>")
}
