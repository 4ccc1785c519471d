use crate::llm::{ChatOutcome, ChatRequest, ChatResponse, ContentBlock, StopReason, Usage};
use crate::registry::{RegistryError, RegistryTransport};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use url::Url;

// ===================
// Mock LLM Provider
// ===================

pub struct MockProvider {
    responses: RwLock<Vec<Result<ChatOutcome, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
    call_count: AtomicUsize,
}

impl MockProvider {
    pub fn new(responses: Vec<ChatOutcome>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    /// Script outcomes and transport failures (`Err`) in call order.
    pub fn scripted(responses: Vec<Result<ChatOutcome, String>>) -> Self {
        Self {
            responses: RwLock::new(responses),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("lock poisoned").clone()
    }

    pub fn text_response(text: &str) -> ChatOutcome {
        ChatOutcome::Success(ChatResponse {
            id: "msg_1".to_string(),
            content: vec![ContentBlock::Text {
                text: text.to_string(),
            }],
            model: "mock-model".to_string(),
            stop_reason: Some(StopReason::EndTurn),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
            },
        })
    }

    pub fn tool_use_response(
        tool_id: &str,
        tool_name: &str,
        input: serde_json::Value,
    ) -> ChatOutcome {
        Self::tool_uses_response(vec![(tool_id, tool_name, input)])
    }

    pub fn tool_uses_response(tool_uses: Vec<(&str, &str, serde_json::Value)>) -> ChatOutcome {
        let content = tool_uses
            .into_iter()
            .map(|(id, name, input)| ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input,
            })
            .collect();

        ChatOutcome::Success(ChatResponse {
            id: "msg_1".to_string(),
            content,
            model: "mock-model".to_string(),
            stop_reason: Some(StopReason::ToolUse),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
            },
        })
    }
}

#[async_trait]
impl crate::llm::LlmProvider for MockProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome> {
        self.requests.lock().expect("lock poisoned").push(request);
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        let responses = self.responses.read().expect("lock poisoned");
        match responses.get(idx) {
            Some(Ok(outcome)) => Ok(outcome.clone()),
            Some(Err(message)) => Err(anyhow::anyhow!("{message}")),
            // Default: end conversation
            None => Ok(Self::text_response("Done")),
        }
    }

    fn model(&self) -> &'static str {
        "mock-model"
    }

    fn provider(&self) -> &'static str {
        "mock"
    }
}

// ===================
// Mock Registry Transport
// ===================

/// Scripted registry transport. Clones share the script and the request log.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<Result<String, RegistryError>>>>,
    urls: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, body: &str) -> Self {
        self.push(Ok(body.to_string()))
    }

    pub fn respond_json(self, body: serde_json::Value) -> Self {
        self.push(Ok(body.to_string()))
    }

    pub fn fail(self, error: RegistryError) -> Self {
        self.push(Err(error))
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.urls.lock().expect("lock poisoned").clone()
    }

    fn push(self, response: Result<String, RegistryError>) -> Self {
        self.responses
            .lock()
            .expect("lock poisoned")
            .push_back(response);
        self
    }
}

#[async_trait]
impl RegistryTransport for MockTransport {
    async fn get(&self, url: &Url) -> Result<String, RegistryError> {
        self.urls.lock().expect("lock poisoned").push(url.to_string());
        self.responses
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(RegistryError::Transport("no scripted response".into())))
    }
}
