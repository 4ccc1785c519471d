//! Tool lifecycle hooks.
//!
//! - [`AgentHooks::pre_tool_use`] - Allow or block a function call
//! - [`AgentHooks::post_tool_use`] - React to tool completion
//!
//! [`DefaultHooks`] allows every call silently; [`LoggingHooks`] allows every
//! call and logs it.

use crate::types::ToolResult;
use async_trait::async_trait;
use log::info;
use serde_json::Value;

/// Decision returned by pre-tool hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolDecision {
    /// Allow the tool to execute
    Allow,
    /// Block the tool execution; the message is returned to the model
    Block(String),
}

/// Lifecycle hooks for the conversation loop.
#[async_trait]
pub trait AgentHooks: Send + Sync {
    /// Called before a tool is executed.
    async fn pre_tool_use(&self, _tool_name: &str, _input: &Value) -> ToolDecision {
        ToolDecision::Allow
    }

    /// Called after a tool completes execution.
    async fn post_tool_use(&self, _tool_name: &str, _result: &ToolResult) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultHooks;

#[async_trait]
impl AgentHooks for DefaultHooks {}

/// Hooks that log every function call at `info` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingHooks;

#[async_trait]
impl AgentHooks for LoggingHooks {
    async fn pre_tool_use(&self, tool_name: &str, input: &Value) -> ToolDecision {
        info!("Calling {tool_name} with {input}");
        ToolDecision::Allow
    }

    async fn post_tool_use(&self, tool_name: &str, result: &ToolResult) {
        info!(
            "{tool_name} finished (success={}, duration_ms={:?}, output_len={})",
            result.success,
            result.duration_ms,
            result.output.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct BlockDetails;

    #[async_trait]
    impl AgentHooks for BlockDetails {
        async fn pre_tool_use(&self, tool_name: &str, _input: &Value) -> ToolDecision {
            if tool_name == "get_parish_details" {
                ToolDecision::Block("Details are disabled".to_string())
            } else {
                ToolDecision::Allow
            }
        }
    }

    #[tokio::test]
    async fn test_default_hooks_allow() {
        let decision = DefaultHooks
            .pre_tool_use("get_parish_details", &json!({"code": "7003"}))
            .await;
        assert_eq!(decision, ToolDecision::Allow);

        DefaultHooks
            .post_tool_use("get_parish_details", &ToolResult::error("Tool error: boom"))
            .await;
    }

    #[tokio::test]
    async fn test_logging_hooks_allow() {
        let decision = LoggingHooks
            .pre_tool_use("search_parishes_by_name", &json!({"query": "Roskilde"}))
            .await;
        assert_eq!(decision, ToolDecision::Allow);

        LoggingHooks
            .post_tool_use(
                "search_parishes_by_name",
                &ToolResult::success("No parishes found").with_duration(3),
            )
            .await;
        LoggingHooks
            .post_tool_use("list_parishes", &ToolResult::error("Unknown tool: x"))
            .await;
    }

    #[tokio::test]
    async fn test_custom_hook_blocks_by_name() {
        let hooks: &dyn AgentHooks = &BlockDetails;

        assert_eq!(
            hooks.pre_tool_use("get_parish_details", &json!({})).await,
            ToolDecision::Block("Details are disabled".to_string())
        );
        assert_eq!(
            hooks.pre_tool_use("list_parishes", &json!({})).await,
            ToolDecision::Allow
        );
        hooks
            .post_tool_use("list_parishes", &ToolResult::success(""))
            .await;
    }
}
