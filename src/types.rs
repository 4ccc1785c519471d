//! Core types shared across the crate.
//!
//! - [`AgentConfig`]: Limits and prompt for the conversation loop
//! - [`TokenUsage`]: Running token totals for a session
//! - [`ToolResult`]: What a function call hands back to the model
//! - [`AgentError`]: Failure of a single conversation turn

use crate::llm::Usage;
use std::ops::AddAssign;
use thiserror::Error;

/// Configuration for the conversation loop
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Provider round-trips allowed while resolving one user message
    pub max_turns: usize,
    /// Maximum tokens per response
    pub max_tokens: u32,
    /// Sent ahead of the transcript on every request
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: 10,
            max_tokens: 4096,
            system_prompt: String::new(),
        }
    }
}

impl AgentConfig {
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl From<Usage> for TokenUsage {
    fn from(usage: Usage) -> Self {
        Self {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

/// Outcome of one function call, sent back to the model as text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolResult {
    /// `false` marks the tool message as an error for the model
    pub success: bool,
    pub output: String,
    pub duration_ms: Option<u64>,
}

impl ToolResult {
    #[must_use]
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            duration_ms: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
            duration_ms: None,
        }
    }

    #[must_use]
    pub const fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// A user turn that could not be resolved. The session itself survives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AgentError {
    pub message: String,
    /// Retrying the same input may succeed (rate limits, transient failures)
    pub recoverable: bool,
}

impl AgentError {
    #[must_use]
    pub fn new(message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            message: message.into(),
            recoverable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_accumulates() {
        let mut total = TokenUsage::default();
        total += TokenUsage::from(Usage {
            input_tokens: 150,
            output_tokens: 30,
        });
        total += TokenUsage {
            input_tokens: 10,
            output_tokens: u32::MAX,
        };

        assert_eq!(total.input_tokens, 160);
        assert_eq!(total.output_tokens, u32::MAX);
    }

    #[test]
    fn test_tool_result_constructors() {
        let ok = ToolResult::success("Name: Trinitatis").with_duration(12);
        assert!(ok.success);
        assert_eq!(ok.duration_ms, Some(12));

        let failed = ToolResult::error("Unknown tool: x");
        assert!(!failed.success);
        assert_eq!(failed.duration_ms, None);
    }

    #[test]
    fn test_agent_error_displays_message() {
        let err = AgentError::new("Maximum turns (10) reached", false);
        assert_eq!(err.to_string(), "Maximum turns (10) reached");
    }

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default().with_system_prompt("Hej");
        assert_eq!(config.max_turns, 10);
        assert_eq!(config.system_prompt, "Hej");
    }
}
