//! Generic LLM client infrastructure.
//!
//! This module provides the completion trait and the concrete providers.
//! Prompting and fallback policy live in [`crate::generation`].
//!
//! # Configuration
//!
//! LLM settings can be configured via:
//! - CLI arguments: `--llm-provider`, `--llm-model`
//! - Environment variables: `PYREFINE_LLM_PROVIDER`, `PYREFINE_LLM_MODEL`,
//!   `GROQ_API_KEY`, `PYREFINE_GROQ_URL`
//!
//! CLI arguments take precedence over environment variables. Without a
//! provider the tool still evaluates code; generation falls back to a local
//! template and refinement is skipped.

mod claude;
mod groq;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use log::debug;

pub use claude::ClaudeCliClient;
pub use groq::{parse_chat_response, GroqClient, GROQ_CHAT_URL};

/// Default per-request timeout for providers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Hosted models tried in order when no model is configured.
pub const DEFAULT_GROQ_MODELS: &[&str] = &["llama-3.3-70b-versatile", "llama3-8b-8192"];

/// Available LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Groq chat completions API
    Groq,
    /// Claude CLI
    Claude,
    /// No provider; generation uses the local fallback
    #[default]
    None,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Groq => write!(f, "groq"),
            Self::Claude => write!(f, "claude"),
            Self::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "claude" => Ok(Self::Claude),
            "none" | "off" => Ok(Self::None),
            _ => Err(format!(
                "Unknown LLM provider: '{}'. Valid options: groq, claude, none",
                s
            )),
        }
    }
}

/// One completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    /// Model to use; `None` means the provider's default.
    pub model: Option<&'a str>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Trait for LLM completion clients.
pub trait LlmClient: Send + Sync {
    /// Send a request to the LLM and return the raw completion text.
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError>;
}

/// Configuration for LLM clients.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Optional model override. When set, no fallback chain is used.
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: None,
            api_key: None,
            base_url: GROQ_CHAT_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LlmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables.
    ///
    /// Reads:
    /// - `PYREFINE_LLM_PROVIDER` - provider name (groq, claude, none)
    /// - `PYREFINE_LLM_MODEL` - model name
    /// - `GROQ_API_KEY` - API key; selects groq when no provider is named
    /// - `PYREFINE_GROQ_URL` - chat completions endpoint override
    pub fn from_env() -> Self {
        let api_key = env::var("GROQ_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let provider = env::var("PYREFINE_LLM_PROVIDER")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(if api_key.is_some() {
                LlmProvider::Groq
            } else {
                LlmProvider::None
            });

        Self {
            provider,
            model: env::var("PYREFINE_LLM_MODEL").ok(),
            api_key,
            base_url: env::var("PYREFINE_GROQ_URL").unwrap_or_else(|_| GROQ_CHAT_URL.to_string()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Merge with CLI overrides. CLI values take precedence.
    pub fn with_overrides(mut self, provider: Option<LlmProvider>, model: Option<String>) -> Self {
        if let Some(p) = provider {
            self.provider = p;
        }
        if let Some(m) = model {
            self.model = Some(m);
        }
        self
    }

    /// Models to try, in order. Empty means "provider default, once".
    pub fn models(&self) -> Vec<String> {
        if let Some(model) = &self.model {
            return vec![model.clone()];
        }
        match self.provider {
            LlmProvider::Groq => DEFAULT_GROQ_MODELS.iter().map(|m| m.to_string()).collect(),
            LlmProvider::Claude | LlmProvider::None => Vec::new(),
        }
    }

    /// Create an LLM client from this configuration, `None` for no provider.
    pub fn create_client(&self) -> Result<Option<Arc<dyn LlmClient>>, LlmError> {
        debug!("Creating LLM client for provider {}", self.provider);
        match self.provider {
            LlmProvider::None => Ok(None),
            LlmProvider::Claude => Ok(Some(Arc::new(ClaudeCliClient::new(self.timeout)))),
            LlmProvider::Groq => {
                let key = self.api_key.clone().ok_or_else(|| {
                    LlmError::MissingCredential("GROQ_API_KEY is not set".to_string())
                })?;
                let client = GroqClient::new(key, self.base_url.clone(), self.timeout)?;
                Ok(Some(Arc::new(client)))
            }
        }
    }
}

/// Errors from LLM operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM client error: {0}")]
    ClientError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("LLM request timed out: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("API error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LlmError {
    /// Quota/rate errors are worth retrying on another model.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}
