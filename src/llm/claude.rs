use std::process::Command;
use std::time::Duration;

use log::debug;

use super::{CompletionRequest, LlmClient, LlmError};
use crate::process;

/// Claude CLI client implementation.
///
/// Sampling parameters are not exposed by the CLI, so only the model is passed
/// through; the system and user prompts travel together on stdin.
pub struct ClaudeCliClient {
    pub timeout: Duration,
}

impl ClaudeCliClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl LlmClient for ClaudeCliClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        // Use stdin for the prompt to avoid command line length limits
        let mut command = Command::new("claude");
        command.arg("--print");
        if let Some(model) = request.model {
            command.args(["--model", model]);
        }

        let prompt = format!("{}\n\n{}", request.system, request.user);
        let output = process::run_with_timeout(&mut command, Some(&prompt), self.timeout)
            .map_err(|e| LlmError::ClientError(format!("Failed to run claude CLI: {}", e)))?;

        if output.timed_out {
            return Err(LlmError::Timeout(format!(
                "claude CLI did not finish within {:?}",
                self.timeout
            )));
        }

        if !output.success() {
            return Err(LlmError::ClientError(format!(
                "claude CLI failed: \n\nstderr: {}\n\n stdout: {}",
                output.stderr, output.stdout
            )));
        }

        if !output.stderr.trim().is_empty() {
            debug!("Claude CLI stderr: {}", output.stderr.trim());
        }

        Ok(output.stdout)
    }
}
