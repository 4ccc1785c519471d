//! Provider-neutral chat interface.
//!
//! The conversation loop only speaks [`ChatRequest`] and [`ChatOutcome`];
//! each backend in [`crate::providers`] translates to its own wire format.

pub mod types;

pub use types::*;

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one request. `Err` means the call never produced an HTTP answer;
    /// a rejection by the provider is reported through [`ChatOutcome`].
    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome>;
    fn model(&self) -> &str;
    fn provider(&self) -> &'static str;
}
