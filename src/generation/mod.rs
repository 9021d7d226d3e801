//! Code generation through an LLM provider with model fallback.
//!
//! Rate-limit failures move on to the next model in the chain. Any other
//! failure ends the attempt: initial generation then falls back to a small
//! local program, improvement requests report the error to the caller.

pub mod prompt;

use std::sync::Arc;

use log::{debug, info, warn};

use crate::llm::{CompletionRequest, LlmClient, LlmConfig, LlmError};
use crate::utils::extract_code_block;
pub use prompt::{build_improvement_prompt, GENERATION_SYSTEM_PROMPT, IMPROVEMENT_SYSTEM_PROMPT};

pub const GENERATION_TEMPERATURE: f32 = 0.7;
pub const IMPROVEMENT_TEMPERATURE: f32 = 0.5;
pub const MAX_OUTPUT_TOKENS: u32 = 4096;

/// Returned when no provider is configured or generation fails.
pub const FALLBACK_CODE: &str = r#"def hello_world():
    """Print a greeting."""
    print('Hello, World!')


if __name__ == '__main__':
    hello_world()
"#;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("no LLM provider configured")]
    Unavailable,

    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error("provider returned no code")]
    EmptyResponse,
}

/// Provider front end shared by generation and refinement.
pub struct CodeGenerator {
    client: Option<Arc<dyn LlmClient>>,
    models: Vec<String>,
}

impl CodeGenerator {
    /// `models` is the fallback chain; empty means the provider default.
    pub fn new(client: Arc<dyn LlmClient>, models: Vec<String>) -> Self {
        Self {
            client: Some(client),
            models,
        }
    }

    /// Generator with no provider.
    pub fn offline() -> Self {
        Self {
            client: None,
            models: Vec::new(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: config.create_client()?,
            models: config.models(),
        })
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// Generate code for `task`. Never fails; see [`FALLBACK_CODE`].
    pub fn generate(&self, task: &str) -> String {
        if !self.is_available() {
            info!("No LLM provider configured, using fallback code");
            return FALLBACK_CODE.to_string();
        }

        match self.complete_with_fallback(GENERATION_SYSTEM_PROMPT, task, GENERATION_TEMPERATURE) {
            Ok(code) => code,
            Err(e) => {
                warn!("Using fallback code because generation failed: {}", e);
                FALLBACK_CODE.to_string()
            }
        }
    }

    /// Ask for an improved version of some code; `prompt` comes from
    /// [`build_improvement_prompt`].
    pub fn improve(&self, prompt: &str) -> Result<String, GenerationError> {
        self.complete_with_fallback(IMPROVEMENT_SYSTEM_PROMPT, prompt, IMPROVEMENT_TEMPERATURE)
    }

    fn complete_with_fallback(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let client = self.client.as_ref().ok_or(GenerationError::Unavailable)?;

        let chain: Vec<Option<&str>> = if self.models.is_empty() {
            vec![None]
        } else {
            self.models.iter().map(|m| Some(m.as_str())).collect()
        };

        let mut last_error = None;
        for (i, model) in chain.iter().enumerate() {
            let request = CompletionRequest {
                system,
                user,
                model: *model,
                temperature,
                max_tokens: MAX_OUTPUT_TOKENS,
            };

            match client.complete(&request) {
                Ok(response) => {
                    debug!("Completion from {} ({} bytes)", model.unwrap_or("default model"), response.len());
                    return extract_code_block(&response)
                        .map(str::to_string)
                        .ok_or(GenerationError::EmptyResponse);
                }
                Err(e) if e.is_rate_limit() && i + 1 < chain.len() => {
                    warn!(
                        "Rate limit hit on {}, trying next model: {}",
                        model.unwrap_or("default model"),
                        e
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error.map_or(GenerationError::Unavailable, GenerationError::from))
    }
}
