//! Groq (OpenAI-compatible) chat completions over blocking HTTP.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{CompletionRequest, LlmClient, LlmError, DEFAULT_GROQ_MODELS};
use crate::utils::truncate;

pub const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Longest provider error body kept in messages.
const MAX_ERROR_LEN: usize = 200;

pub struct GroqClient {
    http: reqwest::blocking::Client,
    api_key: String,
    url: String,
}

impl GroqClient {
    pub fn new(api_key: String, url: String, timeout: Duration) -> Result<Self, LlmError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::ClientError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, api_key, url })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient for GroqClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        let model = request.model.unwrap_or(DEFAULT_GROQ_MODELS[0]);
        let body = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!("POST {} (model {})", self.url, model);
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(e.to_string())
                } else {
                    LlmError::ClientError(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| LlmError::ClientError(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &text));
        }

        parse_chat_response(&text)
    }
}

fn classify_failure(status: u16, body: &str) -> LlmError {
    let message = truncate(body.trim(), MAX_ERROR_LEN);
    if status == 429 || body.contains("rate_limit") {
        LlmError::RateLimited(message)
    } else {
        LlmError::Http { status, message }
    }
}

/// Extract the first choice's message content.
pub fn parse_chat_response(body: &str) -> Result<String, LlmError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("{}: {}", e, truncate(body, MAX_ERROR_LEN))))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| LlmError::InvalidResponse("response has no message content".to_string()))
}
