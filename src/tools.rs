//! Tool definition and registry.
//!
//! Tools are the functions the LLM may call. This module provides:
//!
//! - [`Tool`] trait - Define a callable function and its handler
//! - [`ParamSpec`] - Declarative description of one parameter
//! - [`ToolRegistry`] - Name → tool table handed to the conversation loop
//! - [`ToolContext`] - Application context passed to tool execution
//!
//! There is no reflection: a tool declares its parameters as a list of
//! [`ParamSpec`]s and the registry derives the JSON schema the provider
//! needs from them.
//!
//! # Implementing a Tool
//!
//! ```ignore
//! use sogn_agent::{ParamKind, ParamSpec, Tool, ToolContext, ToolResult};
//!
//! struct EchoTool;
//!
//! impl Tool<()> for EchoTool {
//!     fn name(&self) -> &'static str { "echo" }
//!     fn description(&self) -> &'static str { "Repeat the given text" }
//!     fn parameters(&self) -> Vec<ParamSpec> {
//!         vec![ParamSpec::required("text", ParamKind::String, "Text to repeat")]
//!     }
//!
//!     async fn execute(&self, _ctx: &ToolContext<()>, input: Value) -> Result<ToolResult> {
//!         Ok(ToolResult::success(input["text"].to_string()))
//!     }
//! }
//! ```

use crate::llm;
use crate::types::ToolResult;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Context passed to tool execution
pub struct ToolContext<Ctx> {
    /// Application-specific context (e.g. the registry client)
    pub app: Ctx,
}

impl<Ctx> ToolContext<Ctx> {
    #[must_use]
    pub const fn new(app: Ctx) -> Self {
        Self { app }
    }
}

// ============================================================================
// Parameter Specs
// ============================================================================

/// JSON type of a tool parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
}

impl ParamKind {
    #[must_use]
    pub const fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
        }
    }
}

/// Declaration of a single tool parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParamSpec {
    #[must_use]
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
            default: None,
        }
    }

    #[must_use]
    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Build the JSON schema object describing `params`.
#[must_use]
pub fn params_schema(params: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in params {
        let mut property = Map::new();
        property.insert("type".to_owned(), json!(param.kind.json_type()));
        property.insert("description".to_owned(), json!(param.description));
        if let Some(default) = &param.default {
            property.insert("default".to_owned(), default.clone());
        }
        properties.insert(param.name.to_owned(), Value::Object(property));

        if param.required {
            required.push(json!(param.name));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

// ============================================================================
// Tool Trait
// ============================================================================

/// Definition of a tool that can be called by the agent.
///
/// This trait uses native async functions in traits; implementors do not
/// need `async_trait`.
pub trait Tool<Ctx>: Send + Sync {
    /// Function name as exposed to the LLM.
    fn name(&self) -> &'static str;

    /// Natural-language description of what the tool does.
    fn description(&self) -> &'static str;

    /// Declared parameters, in the order they are documented.
    fn parameters(&self) -> Vec<ParamSpec>;

    /// JSON schema for the tool's input, derived from [`Tool::parameters`].
    fn input_schema(&self) -> Value {
        params_schema(&self.parameters())
    }

    /// Execute the tool with the given input.
    ///
    /// # Errors
    /// Returns an error if the input is unusable or execution fails.
    fn execute(
        &self,
        ctx: &ToolContext<Ctx>,
        input: Value,
    ) -> impl Future<Output = Result<ToolResult>> + Send;
}

// ============================================================================
// Type-Erased Tool (for Registry)
// ============================================================================

/// Object-safe view of a [`Tool`] for registry storage.
#[async_trait]
pub trait ErasedTool<Ctx>: Send + Sync {
    fn name_str(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> Value;
    async fn execute(&self, ctx: &ToolContext<Ctx>, input: Value) -> Result<ToolResult>;
}

struct ToolWrapper<T, Ctx>
where
    T: Tool<Ctx>,
{
    inner: T,
    _marker: PhantomData<fn() -> Ctx>,
}

#[async_trait]
impl<T, Ctx> ErasedTool<Ctx> for ToolWrapper<T, Ctx>
where
    T: Tool<Ctx> + 'static,
    Ctx: Send + Sync + 'static,
{
    fn name_str(&self) -> &'static str {
        self.inner.name()
    }

    fn description(&self) -> &'static str {
        self.inner.description()
    }

    fn input_schema(&self) -> Value {
        self.inner.input_schema()
    }

    async fn execute(&self, ctx: &ToolContext<Ctx>, input: Value) -> Result<ToolResult> {
        self.inner.execute(ctx, input).await
    }
}

// ============================================================================
// Tool Registry
// ============================================================================

/// Registry of available tools, keyed by function name.
///
/// Built once at startup and handed to the conversation loop. Iteration is
/// ordered by name so the declarations sent to the provider are stable.
pub struct ToolRegistry<Ctx> {
    tools: BTreeMap<&'static str, Arc<dyn ErasedTool<Ctx>>>,
}

impl<Ctx> Clone for ToolRegistry<Ctx> {
    fn clone(&self) -> Self {
        Self {
            tools: self.tools.clone(),
        }
    }
}

impl<Ctx: Send + Sync + 'static> Default for ToolRegistry<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx: Send + Sync + 'static> ToolRegistry<Ctx> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. A tool with the same name replaces the previous one.
    pub fn register<T>(&mut self, tool: T) -> &mut Self
    where
        T: Tool<Ctx> + 'static,
    {
        let wrapper = ToolWrapper {
            inner: tool,
            _marker: PhantomData,
        };
        self.tools.insert(wrapper.name_str(), Arc::new(wrapper));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ErasedTool<Ctx>>> {
        self.tools.get(name)
    }


    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Convert all tools to LLM function declarations.
    #[must_use]
    pub fn to_llm_tools(&self) -> Vec<llm::Tool> {
        self.tools
            .values()
            .map(|tool| llm::Tool {
                name: tool.name_str().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes a parish code back, counting calls on the shared context.
    struct EchoCodeTool;

    impl Tool<AtomicUsize> for EchoCodeTool {
        fn name(&self) -> &'static str {
            "echo_code"
        }

        fn description(&self) -> &'static str {
            "Repeat a parish code"
        }

        fn parameters(&self) -> Vec<ParamSpec> {
            vec![ParamSpec::required("code", ParamKind::String, "Parish code")]
        }

        async fn execute(
            &self,
            ctx: &ToolContext<AtomicUsize>,
            input: Value,
        ) -> Result<ToolResult> {
            ctx.app.fetch_add(1, Ordering::SeqCst);
            match input.get("code").and_then(Value::as_str) {
                Some(code) => Ok(ToolResult::success(format!("Code: {code}"))),
                None => Err(anyhow::anyhow!("Missing or invalid 'code' parameter")),
            }
        }
    }

    struct CountTool;

    impl Tool<AtomicUsize> for CountTool {
        fn name(&self) -> &'static str {
            "count"
        }

        fn description(&self) -> &'static str {
            "Report how many calls were made"
        }

        fn parameters(&self) -> Vec<ParamSpec> {
            Vec::new()
        }

        async fn execute(
            &self,
            ctx: &ToolContext<AtomicUsize>,
            _input: Value,
        ) -> Result<ToolResult> {
            Ok(ToolResult::success(ctx.app.load(Ordering::SeqCst).to_string()))
        }
    }

    #[test]
    fn test_params_schema() {
        let schema = params_schema(&[
            ParamSpec::required("query", ParamKind::String, "What to look for"),
            ParamSpec::optional("limit", ParamKind::Integer, "How many").with_default(json!(20)),
        ]);

        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "What to look for"},
                    "limit": {"type": "integer", "description": "How many", "default": 20}
                },
                "required": ["query"]
            })
        );
    }

    #[test]
    fn test_params_schema_empty() {
        assert_eq!(
            params_schema(&[]),
            json!({"type": "object", "properties": {}, "required": []})
        );
    }

    #[test]
    fn test_lookup_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoCodeTool);

        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
        assert_eq!(
            registry.get("echo_code").unwrap().description(),
            "Repeat a parish code"
        );
        assert!(registry.get("get_parish_details").is_none());
    }

    #[test]
    fn test_register_same_name_replaces() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoCodeTool).register(EchoCodeTool);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_declarations_sorted_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoCodeTool).register(CountTool);

        let declarations = registry.to_llm_tools();
        let names: Vec<_> = declarations.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["count", "echo_code"]);
        assert_eq!(declarations[1].input_schema["required"], json!(["code"]));
    }

    #[tokio::test]
    async fn test_execute_shares_context() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoCodeTool).register(CountTool);
        let ctx = ToolContext::new(AtomicUsize::new(0));

        let echo = registry.get("echo_code").unwrap();
        let result = echo.execute(&ctx, json!({"code": "7003"})).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "Code: 7003");

        let err = echo.execute(&ctx, json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing or invalid 'code' parameter");

        let count = registry.get("count").unwrap().execute(&ctx, json!({})).await.unwrap();
        assert_eq!(count.output, "2");
    }
}
