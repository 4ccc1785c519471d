//! Sogn Agent - a conversational assistant for the Danish parish registry.
//!
//! The crate provides:
//! - A client for the public parish (sogn) registry with text rendering
//! - The registry lookups as LLM-callable functions
//! - A provider-agnostic LLM interface with an `OpenAI` implementation
//! - A conversation loop that resolves function calls before replying
//!
//! # Example
//!
//! ```ignore
//! use sogn_agent::{
//!     AgentConfig, Conversation, LoggingHooks, RegistryClient, ToolContext,
//!     catalog::parish_catalog, providers::OpenAIProvider,
//! };
//!
//! let registry = RegistryClient::new(reqwest::Client::new());
//! let mut conversation = Conversation::builder()
//!     .provider(OpenAIProvider::gpt4o_mini(api_key))
//!     .tools(parish_catalog())
//!     .context(ToolContext::new(registry))
//!     .hooks(LoggingHooks)
//!     .config(AgentConfig::default().with_system_prompt(sogn_agent::console::SYSTEM_PROMPT))
//!     .build()?;
//!
//! let reply = conversation.send("Tell me about Trinitatis parish").await?;
//! println!("{reply}");
//! ```

#![forbid(unsafe_code)]

mod agent_loop;
pub mod catalog;
pub mod config;
pub mod console;
mod hooks;
pub mod llm;
pub mod parish;
pub mod providers;
pub mod registry;
mod tools;
mod types;

#[cfg(test)]
mod test_utils;

pub use agent_loop::{Conversation, ConversationBuilder};
pub use hooks::{AgentHooks, DefaultHooks, LoggingHooks, ToolDecision};
pub use llm::LlmProvider;
pub use parish::ParishRecord;
pub use registry::{HttpTransport, RegistryClient, RegistryError, RegistryTransport};
pub use tools::{
    ErasedTool, ParamKind, ParamSpec, Tool, ToolContext, ToolRegistry, params_schema,
};
pub use types::{AgentConfig, AgentError, TokenUsage, ToolResult};
