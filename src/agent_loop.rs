//! The conversation loop.
//!
//! A [`Conversation`] owns the transcript of one chat session. Each call to
//! [`Conversation::send`] resolves a full user turn: the transcript and the
//! tool declarations go to the provider, any function calls the model asks
//! for are executed and answered, and this repeats until the model replies
//! with plain text.

use crate::hooks::{AgentHooks, DefaultHooks, ToolDecision};
use crate::llm::{ChatOutcome, ChatRequest, ChatResponse, ContentBlock, LlmProvider, Message};
use crate::tools::{ToolContext, ToolRegistry};
use crate::types::{AgentConfig, AgentError, TokenUsage, ToolResult};
use log::{debug, info, warn};
use serde_json::Value;
use std::time::Instant;

/// Builder for constructing a [`Conversation`].
///
/// # Example
///
/// ```ignore
/// let conversation = Conversation::builder()
///     .provider(OpenAIProvider::gpt4o_mini(api_key))
///     .tools(parish_catalog())
///     .context(ToolContext::new(registry))
///     .config(AgentConfig::default().with_system_prompt(SYSTEM_PROMPT))
///     .build()?;
/// ```
pub struct ConversationBuilder<Ctx, P, H> {
    provider: Option<P>,
    tools: Option<ToolRegistry<Ctx>>,
    context: Option<ToolContext<Ctx>>,
    hooks: H,
    config: AgentConfig,
}

impl<Ctx, P> ConversationBuilder<Ctx, P, DefaultHooks> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: None,
            context: None,
            hooks: DefaultHooks,
            config: AgentConfig::default(),
        }
    }
}

impl<Ctx, P> Default for ConversationBuilder<Ctx, P, DefaultHooks> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx, P, H> ConversationBuilder<Ctx, P, H> {
    /// Set the LLM provider.
    #[must_use]
    pub fn provider(mut self, provider: P) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry.
    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry<Ctx>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set the context handed to every tool execution.
    #[must_use]
    pub fn context(mut self, context: ToolContext<Ctx>) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the lifecycle hooks.
    #[must_use]
    pub fn hooks<H2: AgentHooks>(self, hooks: H2) -> ConversationBuilder<Ctx, P, H2> {
        ConversationBuilder {
            provider: self.provider,
            tools: self.tools,
            context: self.context,
            hooks,
            config: self.config,
        }
    }

    /// Set the agent configuration.
    #[must_use]
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }
}

impl<Ctx, P, H> ConversationBuilder<Ctx, P, H>
where
    Ctx: Send + Sync + 'static,
    P: LlmProvider,
    H: AgentHooks,
{
    /// Build the conversation.
    ///
    /// # Errors
    /// Returns an error if the provider or the tool context has not been set.
    pub fn build(self) -> anyhow::Result<Conversation<Ctx, P, H>> {
        let provider = self
            .provider
            .ok_or_else(|| anyhow::anyhow!("provider is required"))?;
        let context = self
            .context
            .ok_or_else(|| anyhow::anyhow!("tool context is required"))?;

        Ok(Conversation {
            provider,
            tools: self.tools.unwrap_or_default(),
            context,
            hooks: self.hooks,
            config: self.config,
            transcript: Vec::new(),
            total_usage: TokenUsage::default(),
        })
    }
}

/// One chat session: provider, function table and the growing transcript.
pub struct Conversation<Ctx, P, H = DefaultHooks> {
    provider: P,
    tools: ToolRegistry<Ctx>,
    context: ToolContext<Ctx>,
    hooks: H,
    config: AgentConfig,
    transcript: Vec<Message>,
    total_usage: TokenUsage,
}

impl<Ctx, P> Conversation<Ctx, P, DefaultHooks> {
    #[must_use]
    pub fn builder() -> ConversationBuilder<Ctx, P, DefaultHooks> {
        ConversationBuilder::new()
    }
}

impl<Ctx, P, H> Conversation<Ctx, P, H>
where
    Ctx: Send + Sync + 'static,
    P: LlmProvider,
    H: AgentHooks,
{
    /// Messages exchanged so far. The system prompt is kept in the config.
    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Tokens consumed across all turns.
    #[must_use]
    pub const fn total_usage(&self) -> TokenUsage {
        self.total_usage
    }

    /// Resolve one user turn and return the assistant's reply.
    ///
    /// On failure the transcript keeps the user message but nothing that was
    /// exchanged while resolving it.
    ///
    /// # Errors
    /// Returns an [`AgentError`] when the provider call fails, the provider
    /// rejects the request, or the turn exceeds `max_turns` round-trips.
    pub async fn send(&mut self, input: &str) -> Result<String, AgentError> {
        self.transcript.push(Message::user(input));
        let checkpoint = self.transcript.len();

        match self.resolve_turn().await {
            Ok(reply) => {
                self.transcript.push(Message::assistant(reply.clone()));
                Ok(reply)
            }
            Err(error) => {
                warn!("Turn failed, discarding partial exchange: {error}");
                self.transcript.truncate(checkpoint);
                Err(error)
            }
        }
    }

    async fn resolve_turn(&mut self) -> Result<String, AgentError> {
        for round in 1..=self.config.max_turns {
            let request = self.build_request();
            debug!(
                "ChatRequest built: provider={} model={} round={round} messages={} tools={}",
                self.provider.provider(),
                self.provider.model(),
                request.messages.len(),
                request.tools.as_ref().map_or(0, Vec::len)
            );

            let response = self.call_provider(request).await?;

            if !response.has_tool_use() {
                return Ok(response.first_text().unwrap_or_default().to_owned());
            }

            let mut results = Vec::new();
            for (id, name, input) in response.tool_uses() {
                let result = self.execute_tool(name, input.clone()).await;
                results.push(ContentBlock::tool_result(
                    id,
                    result.output,
                    !result.success,
                ));
            }

            self.transcript
                .push(Message::assistant_blocks(response.content));
            self.transcript.push(Message::tool_results(results));
        }

        let max_turns = self.config.max_turns;
        warn!("Max turns reached (max={max_turns})");
        Err(AgentError::new(
            format!("Maximum turns ({max_turns}) reached"),
            false,
        ))
    }

    fn build_request(&self) -> ChatRequest {
        let tools = if self.tools.is_empty() {
            None
        } else {
            Some(self.tools.to_llm_tools())
        };

        ChatRequest {
            system: self.config.system_prompt.clone(),
            messages: self.transcript.clone(),
            tools,
            max_tokens: self.config.max_tokens,
        }
    }

    async fn call_provider(&mut self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        match self.provider.chat(request).await {
            Ok(ChatOutcome::Success(response)) => {
                debug!(
                    "ChatResponse received: id={} model={} stop_reason={:?}",
                    response.id, response.model, response.stop_reason
                );
                self.total_usage += TokenUsage::from(response.usage);
                Ok(response)
            }
            Ok(ChatOutcome::RateLimited) => Err(AgentError::new(
                "Rate limited by the LLM provider, please try again shortly",
                true,
            )),
            Ok(ChatOutcome::InvalidRequest(body)) => Err(AgentError::new(
                format!("LLM provider rejected the request: {body}"),
                false,
            )),
            Ok(ChatOutcome::ServerError(body)) => Err(AgentError::new(
                format!("LLM provider server error: {body}"),
                true,
            )),
            Err(error) => Err(AgentError::new(
                format!("LLM request failed: {error}"),
                true,
            )),
        }
    }

    async fn execute_tool(&self, name: &str, input: Value) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            warn!("Model requested unknown tool {name}");
            return ToolResult::error(format!("Unknown tool: {name}"));
        };

        if let ToolDecision::Block(reason) = self.hooks.pre_tool_use(name, &input).await {
            info!("Tool {name} blocked: {reason}");
            return ToolResult::error(reason);
        }

        let started = Instant::now();
        let result = match tool.execute(&self.context, input).await {
            Ok(result) => result,
            Err(error) => ToolResult::error(format!("Tool error: {error}")),
        };
        let result = result.with_duration(millis_to_u64(started.elapsed().as_millis()));

        self.hooks.post_tool_use(name, &result).await;
        result
    }
}

fn millis_to_u64(millis: u128) -> u64 {
    u64::try_from(millis).unwrap_or(u64::MAX)
}
