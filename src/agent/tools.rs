//! Agent Tool System
//!
//! Defines the tools agents can call and dispatches invocations into
//! the search and finance clients. Tool failures are folded into the
//! result record so the model sees the error text instead of the run
//! aborting.

use std::time::Instant;

use anyhow::Result;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::finance::{format_analyst_summary, format_news, format_quote};
use crate::search::format_results;
use crate::types::{
    InferenceToolDefinition, InferenceToolDefinitionFunction, ToolCallResult, ToolContext,
};

/// A built-in tool an agent can invoke.
///
/// Execution is handled by a match on the tool name in `execute_tool`,
/// so a tool definition is pure data: name, description, and a JSON
/// schema for its arguments.
#[derive(Debug, Clone)]
pub struct BuiltinTool {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// The web-search toolset.
pub fn search_tools() -> Vec<BuiltinTool> {
    vec![BuiltinTool {
        name: "web_search".to_string(),
        description: "Search the web with DuckDuckGo. Returns titled results with source URLs and snippets.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "number",
                    "description": "Maximum number of results (default: 5)"
                }
            },
            "required": ["query"]
        }),
    }]
}

/// The finance toolset: price, analyst recommendations, fundamentals,
/// and company news.
pub fn finance_tools() -> Vec<BuiltinTool> {
    let symbol_only = json!({
        "type": "object",
        "properties": {
            "symbol": {
                "type": "string",
                "description": "Ticker symbol, e.g. NVDA"
            }
        },
        "required": ["symbol"]
    });

    vec![
        BuiltinTool {
            name: "stock_price".to_string(),
            description: "Get the current stock price, previous close, and day range for a ticker symbol.".to_string(),
            parameters: symbol_only.clone(),
        },
        BuiltinTool {
            name: "analyst_recommendations".to_string(),
            description: "Get analyst recommendation counts, mean rating, and mean target price for a ticker symbol.".to_string(),
            parameters: symbol_only.clone(),
        },
        BuiltinTool {
            name: "stock_fundamentals".to_string(),
            description: "Get key fundamentals (market cap, P/E, EPS, 52-week range, dividend yield) for a ticker symbol.".to_string(),
            parameters: symbol_only,
        },
        BuiltinTool {
            name: "company_news".to_string(),
            description: "Get recent news headlines for a ticker symbol, with publisher and link.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "symbol": {
                        "type": "string",
                        "description": "Ticker symbol, e.g. NVDA"
                    },
                    "count": {
                        "type": "number",
                        "description": "Number of headlines (default: 5)"
                    }
                },
                "required": ["symbol"]
            }),
        },
    ]
}

/// Map tool definitions to the wire format the inference API expects.
pub fn tools_to_inference_format(tools: &[BuiltinTool]) -> Vec<InferenceToolDefinition> {
    tools
        .iter()
        .map(|t| InferenceToolDefinition {
            def_type: "function".to_string(),
            function: InferenceToolDefinitionFunction {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.clone(),
            },
        })
        .collect()
}

/// Execute a tool call and return the result record.
pub async fn execute_tool(
    tool_name: &str,
    args: &Value,
    tools: &[BuiltinTool],
    ctx: &ToolContext,
) -> ToolCallResult {
    let start = Instant::now();

    // A tool must be in the calling agent's own toolset; the model is
    // never allowed to reach a tool the agent was not configured with.
    if !tools.iter().any(|t| t.name == tool_name) {
        return ToolCallResult {
            id: format!("tc_{}", Uuid::new_v4()),
            name: tool_name.to_string(),
            arguments: args.clone(),
            result: String::new(),
            duration_ms: 0,
            error: Some(format!("Unknown tool: {}", tool_name)),
        };
    }

    match execute_tool_inner(tool_name, args, ctx).await {
        Ok(output) => ToolCallResult {
            id: format!("tc_{}", Uuid::new_v4()),
            name: tool_name.to_string(),
            arguments: args.clone(),
            result: output,
            duration_ms: start.elapsed().as_millis() as u64,
            error: None,
        },
        Err(err) => ToolCallResult {
            id: format!("tc_{}", Uuid::new_v4()),
            name: tool_name.to_string(),
            arguments: args.clone(),
            result: String::new(),
            duration_ms: start.elapsed().as_millis() as u64,
            error: Some(err.to_string()),
        },
    }
}

/// Internal tool execution dispatch.
async fn execute_tool_inner(tool_name: &str, args: &Value, ctx: &ToolContext) -> Result<String> {
    match tool_name {
        "web_search" => {
            let query = args["query"]
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;
            let max_results = args["max_results"].as_u64().map(|n| n as usize);
            let results = ctx.search.search(query, max_results).await?;
            Ok(format_results(query, &results))
        }

        "stock_price" => {
            let symbol = require_symbol(args)?;
            let quote = ctx.finance.stock_price(symbol).await?;
            Ok(format_quote(&quote))
        }

        "analyst_recommendations" => {
            let symbol = require_symbol(args)?;
            let summary = ctx.finance.analyst_recommendations(symbol).await?;
            Ok(format_analyst_summary(&summary))
        }

        "stock_fundamentals" => {
            let symbol = require_symbol(args)?;
            ctx.finance.stock_fundamentals(symbol).await
        }

        "company_news" => {
            let symbol = require_symbol(args)?;
            let count = args["count"].as_u64().map(|n| n as usize);
            let items = ctx.finance.company_news(symbol, count).await?;
            Ok(format_news(symbol, &items))
        }

        _ => anyhow::bail!("Unknown tool: {}", tool_name),
    }
}

fn require_symbol(args: &Value) -> Result<&str> {
    args["symbol"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Missing 'symbol' argument"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolset_contents() {
        let search = search_tools();
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].name, "web_search");

        let finance = finance_tools();
        let names: Vec<&str> = finance.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "stock_price",
                "analyst_recommendations",
                "stock_fundamentals",
                "company_news"
            ]
        );
    }

    #[test]
    fn test_tools_to_inference_format() {
        let defs = tools_to_inference_format(&finance_tools());
        assert_eq!(defs.len(), 4);
        assert!(defs.iter().all(|d| d.def_type == "function"));
        assert_eq!(defs[0].function.name, "stock_price");
        assert_eq!(defs[0].function.parameters["required"][0], "symbol");
    }

    #[tokio::test]
    async fn test_execute_tool_unknown_name() {
        let ctx = ToolContext::new();
        let result = execute_tool("transmute_gold", &json!({}), &search_tools(), &ctx).await;
        assert!(result.error.as_deref().unwrap().contains("Unknown tool"));
        assert!(result.result.is_empty());
    }

    #[tokio::test]
    async fn test_execute_tool_outside_own_toolset() {
        let ctx = ToolContext::new();
        // stock_price exists, but not in the search agent's toolset
        let result = execute_tool(
            "stock_price",
            &json!({ "symbol": "NVDA" }),
            &search_tools(),
            &ctx,
        )
        .await;
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_execute_tool_missing_argument() {
        let ctx = ToolContext::new();
        let result = execute_tool("stock_price", &json!({}), &finance_tools(), &ctx).await;
        assert!(result.error.as_deref().unwrap().contains("symbol"));
    }

    #[test]
    fn test_require_symbol_rejects_blank() {
        assert!(require_symbol(&json!({ "symbol": "  " })).is_err());
        assert_eq!(require_symbol(&json!({ "symbol": " NVDA " })).unwrap(), "NVDA");
    }
}
