//! `OpenAI` Chat Completions provider.
//!
//! The parish functions are declared as `function` tools; results go back as
//! `role: tool` messages keyed by the call id. Any server speaking the same
//! protocol (Ollama, vLLM, Azure `OpenAI`) works through
//! [`OpenAIProvider::with_base_url`].

use crate::llm::{
    ChatOutcome, ChatRequest, ChatResponse, Content, ContentBlock, LlmProvider, Message, Role,
    StopReason, Tool, Usage,
};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub const MODEL_GPT4O_MINI: &str = "gpt-4o-mini";

const FUNCTION: &str = "function";

/// Chat Completions client bound to one model.
#[derive(Clone)]
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIProvider {
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL.to_owned())
    }

    /// Point the provider at another OpenAI-compatible endpoint.
    #[must_use]
    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
        let base_url = base_url.trim_end_matches('/').to_owned();
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    /// Share a connection pool with the rest of the application.
    #[must_use]
    pub fn with_client(self, client: reqwest::Client) -> Self {
        Self { client, ..self }
    }

    /// The default model for the parish assistant.
    #[must_use]
    pub fn gpt4o_mini(api_key: String) -> Self {
        Self::new(api_key, MODEL_GPT4O_MINI.to_owned())
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome> {
        let messages = to_api_messages(&request.system, &request.messages);
        let tools: Vec<ApiTool> = request
            .tools
            .unwrap_or_default()
            .into_iter()
            .map(ApiTool::from)
            .collect();

        let body = ApiChatRequest {
            model: &self.model,
            messages: &messages,
            max_completion_tokens: request.max_tokens,
            tools: (!tools.is_empty()).then_some(tools.as_slice()),
        };

        debug!(
            "POST {} model={} messages={} tools={}",
            self.completions_url(),
            self.model,
            messages.len(),
            tools.len()
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("request to OpenAI failed")?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .context("failed to read OpenAI response body")?;
        debug!("OpenAI responded status={status} body_len={}", bytes.len());

        if let Some(outcome) = classify_failure(status, &bytes) {
            return Ok(outcome);
        }

        let parsed: ApiChatResponse =
            serde_json::from_slice(&bytes).context("failed to parse OpenAI response")?;
        into_chat_response(parsed).map(ChatOutcome::Success)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn provider(&self) -> &'static str {
        "openai"
    }
}

/// Map non-success statuses onto the provider-neutral outcomes.
fn classify_failure(status: StatusCode, body: &[u8]) -> Option<ChatOutcome> {
    if status.is_success() {
        return None;
    }

    let body = String::from_utf8_lossy(body).into_owned();
    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!("OpenAI rate limit hit");
        Some(ChatOutcome::RateLimited)
    } else if status.is_server_error() {
        error!("OpenAI server error status={status} body={body}");
        Some(ChatOutcome::ServerError(body))
    } else {
        warn!("OpenAI rejected request status={status} body={body}");
        Some(ChatOutcome::InvalidRequest(body))
    }
}

fn into_chat_response(response: ApiChatResponse) -> Result<ChatResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("OpenAI response contained no choices"))?;

    Ok(ChatResponse {
        id: response.id,
        content: response_blocks(choice.message),
        model: response.model,
        stop_reason: choice.finish_reason.and_then(ApiFinishReason::stop_reason),
        usage: Usage {
            input_tokens: response.usage.prompt_tokens,
            output_tokens: response.usage.completion_tokens,
        },
    })
}

/// Flatten the transcript into Chat Completions messages.
///
/// The system prompt leads. Tool results become one `tool` message each;
/// text and function calls in the same turn share one message.
fn to_api_messages(system: &str, transcript: &[Message]) -> Vec<ApiMessage> {
    let mut out = Vec::with_capacity(transcript.len() + 1);
    if !system.is_empty() {
        out.push(ApiMessage::text(ApiRole::System, system));
    }

    for message in transcript {
        let role = ApiRole::from(message.role);
        let blocks = match &message.content {
            Content::Text(text) => {
                out.push(ApiMessage::text(role, text));
                continue;
            }
            Content::Blocks(blocks) => blocks,
        };

        let mut text = Vec::new();
        let mut calls = Vec::new();
        for block in blocks {
            match block {
                ContentBlock::Text { text: part } => text.push(part.as_str()),
                ContentBlock::ToolUse { id, name, input } => calls.push(ApiToolCall {
                    id: id.clone(),
                    kind: FUNCTION.to_owned(),
                    function: ApiFunctionCall {
                        name: name.clone(),
                        arguments: input.to_string(),
                    },
                }),
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } => out.push(ApiMessage::tool_output(tool_use_id, content)),
            }
        }

        if !text.is_empty() || (role == ApiRole::Assistant && !calls.is_empty()) {
            out.push(ApiMessage {
                role,
                content: (!text.is_empty()).then(|| text.join("\n")),
                tool_calls: (!calls.is_empty()).then_some(calls),
                tool_call_id: None,
            });
        }
    }

    out
}

fn response_blocks(message: ApiResponseMessage) -> Vec<ContentBlock> {
    let text = message
        .content
        .filter(|text| !text.is_empty())
        .map(|text| ContentBlock::Text { text });

    // Unparseable arguments become `{}` so the tool reports the missing parameter.
    let calls = message.tool_calls.into_iter().flatten().map(|call| {
        let input = serde_json::from_str::<Value>(&call.function.arguments)
            .ok()
            .filter(Value::is_object)
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        }
    });

    text.into_iter().chain(calls).collect()
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct ApiChatRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage],
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ApiTool]>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: ApiRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ApiMessage {
    fn text(role: ApiRole, text: &str) -> Self {
        Self {
            role,
            content: Some(text.to_owned()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn tool_output(call_id: &str, output: &str) -> Self {
        Self {
            role: ApiRole::Tool,
            content: Some(output.to_owned()),
            tool_calls: None,
            tool_call_id: Some(call_id.to_owned()),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum ApiRole {
    System,
    User,
    Assistant,
    Tool,
}

impl From<Role> for ApiRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::Assistant => Self::Assistant,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    function: ApiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    /// JSON-encoded argument object.
    arguments: String,
}

#[derive(Serialize)]
struct ApiTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ApiFunction,
}

#[derive(Serialize)]
struct ApiFunction {
    name: String,
    description: String,
    parameters: Value,
}

impl From<Tool> for ApiTool {
    fn from(tool: Tool) -> Self {
        Self {
            kind: FUNCTION,
            function: ApiFunction {
                name: tool.name,
                description: tool.description,
                parameters: tool.input_schema,
            },
        }
    }
}

#[derive(Deserialize)]
struct ApiChatResponse {
    #[serde(default)]
    id: String,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: ApiUsage,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
    finish_reason: Option<ApiFinishReason>,
}

#[derive(Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum ApiFinishReason {
    Stop,
    ToolCalls,
    Length,
    ContentFilter,
    /// Legacy `function_call` and anything newer.
    #[serde(other)]
    Unknown,
}

impl ApiFinishReason {
    const fn stop_reason(self) -> Option<StopReason> {
        match self {
            Self::Stop => Some(StopReason::EndTurn),
            Self::ToolCalls => Some(StopReason::ToolUse),
            Self::Length => Some(StopReason::MaxTokens),
            Self::ContentFilter => Some(StopReason::StopSequence),
            Self::Unknown => None,
        }
    }
}

#[derive(Default, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
