//! The parish lookups exposed as LLM-callable functions.
//!
//! Each tool only declares its name, description and parameters and then
//! delegates to [`RegistryClient`]; all formatting lives in the registry.

use crate::registry::{DEFAULT_LIST_LIMIT, RegistryClient, RegistryTransport};
use crate::tools::{ParamKind, ParamSpec, Tool, ToolContext, ToolRegistry};
use crate::types::ToolResult;
use anyhow::{Result, anyhow};
use serde_json::{Value, json};

pub const SEARCH_PARISHES_BY_NAME: &str = "search_parishes_by_name";
pub const GET_PARISH_DETAILS: &str = "get_parish_details";
pub const LIST_PARISHES: &str = "list_parishes";

/// Build the function table for the parish assistant.
#[must_use]
pub fn parish_catalog<T>() -> ToolRegistry<RegistryClient<T>>
where
    T: RegistryTransport + 'static,
{
    let mut tools = ToolRegistry::new();
    tools
        .register(SearchParishesTool)
        .register(GetParishDetailsTool)
        .register(ListParishesTool);
    tools
}

/// `search_parishes_by_name(query)`
pub struct SearchParishesTool;

impl<T> Tool<RegistryClient<T>> for SearchParishesTool
where
    T: RegistryTransport + 'static,
{
    fn name(&self) -> &'static str {
        SEARCH_PARISHES_BY_NAME
    }

    fn description(&self) -> &'static str {
        "Search for Danish parishes (sogne) by name. Returns a list of parishes matching the search query."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "query",
            ParamKind::String,
            "The name or partial name of the parish to search for (e.g., 'København', 'Roskilde', 'Trinitatis')",
        )]
    }

    async fn execute(
        &self,
        ctx: &ToolContext<RegistryClient<T>>,
        input: Value,
    ) -> Result<ToolResult> {
        let query = required_str(&input, "query")?;
        Ok(ToolResult::success(ctx.app.search_by_name(query).await))
    }
}

/// `get_parish_details(code)`
pub struct GetParishDetailsTool;

impl<T> Tool<RegistryClient<T>> for GetParishDetailsTool
where
    T: RegistryTransport + 'static,
{
    fn name(&self) -> &'static str {
        GET_PARISH_DETAILS
    }

    fn description(&self) -> &'static str {
        "Get detailed information about a specific Danish parish by its code. Use this when you have a parish code and need full details."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "code",
            ParamKind::String,
            "The unique parish code (e.g., '7003' for Trinitatis, '7002' for Vor Frue)",
        )]
    }

    async fn execute(
        &self,
        ctx: &ToolContext<RegistryClient<T>>,
        input: Value,
    ) -> Result<ToolResult> {
        let code = required_code(&input)?;
        Ok(ToolResult::success(ctx.app.get_details(&code).await))
    }
}

/// `list_parishes(nameFilter?, limit = 20)`
pub struct ListParishesTool;

impl<T> Tool<RegistryClient<T>> for ListParishesTool
where
    T: RegistryTransport + 'static,
{
    fn name(&self) -> &'static str {
        LIST_PARISHES
    }

    fn description(&self) -> &'static str {
        "List Danish parishes, optionally filtered by a partial name. Use this to discover available parishes or browse parishes in a region."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::optional(
                "nameFilter",
                ParamKind::String,
                "Optional: partial name to filter parishes (e.g., 'Køben' for Copenhagen area parishes). Leave empty to get a sample of all parishes.",
            ),
            ParamSpec::optional(
                "limit",
                ParamKind::Integer,
                "Maximum number of parishes to return (default: 20, max: 100)",
            )
            .with_default(json!(DEFAULT_LIST_LIMIT)),
        ]
    }

    async fn execute(
        &self,
        ctx: &ToolContext<RegistryClient<T>>,
        input: Value,
    ) -> Result<ToolResult> {
        let name_filter = input.get("nameFilter").and_then(Value::as_str);
        let limit = input
            .get("limit")
            .and_then(integer_arg)
            .unwrap_or(DEFAULT_LIST_LIMIT);
        Ok(ToolResult::success(
            ctx.app.list_parishes(name_filter, limit).await,
        ))
    }
}

fn required_str<'a>(input: &'a Value, name: &str) -> Result<&'a str> {
    input
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Missing or invalid '{name}' parameter"))
}

// Models sometimes send codes as bare numbers.
fn required_code(input: &Value) -> Result<String> {
    match input.get("code") {
        Some(Value::String(code)) => Ok(code.clone()),
        Some(Value::Number(code)) => Ok(code.to_string()),
        _ => Err(anyhow!("Missing or invalid 'code' parameter")),
    }
}

/// Accept integers, floats (truncated) and numeric strings.
#[allow(clippy::cast_possible_truncation)]
fn integer_arg(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
