//! Groq Inference Client
//!
//! Wraps an OpenAI-compatible /chat/completions endpoint.
//! Tool definitions are sent as function tools; tool calls in the
//! reply are parsed back into typed records.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::types::{
    AppConfig, ChatMessage, ChatRole, InferenceClient, InferenceOptions, InferenceResponse,
    InferenceToolCall, InferenceToolCallFunction, TokenUsage,
};

/// Inference client for OpenAI-compatible chat completions.
pub struct GroqClient {
    api_base: String,
    api_key: String,
    default_model: String,
    max_tokens: u32,
    temperature: f64,
    http: Client,
}

impl GroqClient {
    /// Create a new inference client from the loaded configuration.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            default_model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl InferenceClient for GroqClient {
    /// Send a chat completion request and return the parsed response.
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: Option<InferenceOptions>,
    ) -> Result<InferenceResponse> {
        let model = options
            .as_ref()
            .and_then(|o| o.model.as_deref())
            .unwrap_or(&self.default_model)
            .to_string();

        // Newer OpenAI-hosted models (o-series, gpt-5.x, gpt-4.1) take
        // max_completion_tokens instead of max_tokens
        let uses_completion_tokens = regex::Regex::new(r"^(o[1-9]|gpt-5|gpt-4\.1)")
            .map(|re| re.is_match(&model))
            .unwrap_or(false);

        let token_limit = options
            .as_ref()
            .and_then(|o| o.max_tokens)
            .unwrap_or(self.max_tokens);
        let temperature = options
            .as_ref()
            .and_then(|o| o.temperature)
            .unwrap_or(self.temperature);

        let formatted_messages: Vec<Value> = messages.iter().map(format_message).collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": formatted_messages,
            "temperature": temperature,
            "stream": false,
        });

        if uses_completion_tokens {
            body["max_completion_tokens"] = serde_json::json!(token_limit);
        } else {
            body["max_tokens"] = serde_json::json!(token_limit);
        }

        if let Some(tool_defs) = options.as_ref().and_then(|o| o.tools.as_ref()) {
            if !tool_defs.is_empty() {
                body["tools"] = serde_json::json!(tool_defs);
                body["tool_choice"] = serde_json::json!("auto");
            }
        }

        let url = format!("{}/chat/completions", self.api_base);
        let resp = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Inference request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Inference error: {}: {}", status.as_u16(), text);
        }

        let data: Value = resp
            .json()
            .await
            .context("Failed to parse inference response")?;

        let choice = data["choices"]
            .get(0)
            .ok_or_else(|| anyhow::anyhow!("No completion choice returned from inference"))?;

        let message = &choice["message"];

        let usage = TokenUsage {
            prompt_tokens: data["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            completion_tokens: data["usage"]["completion_tokens"].as_u64().unwrap_or(0),
            total_tokens: data["usage"]["total_tokens"].as_u64().unwrap_or(0),
        };

        let tool_calls = parse_tool_calls(message);

        let role = match message["role"].as_str().unwrap_or("assistant") {
            "system" => ChatRole::System,
            "user" => ChatRole::User,
            "tool" => ChatRole::Tool,
            _ => ChatRole::Assistant,
        };

        let response_message = ChatMessage {
            role,
            content: message["content"].as_str().unwrap_or("").to_string(),
            name: message["name"].as_str().map(|s| s.to_string()),
            tool_calls: tool_calls.clone(),
            tool_call_id: message["tool_call_id"].as_str().map(|s| s.to_string()),
        };

        Ok(InferenceResponse {
            id: data["id"].as_str().unwrap_or("").to_string(),
            model: data["model"].as_str().unwrap_or(&model).to_string(),
            message: response_message,
            tool_calls,
            usage,
            finish_reason: choice["finish_reason"].as_str().unwrap_or("stop").to_string(),
        })
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }
}

/// Parse the tool_calls array of a completion message, if present.
fn parse_tool_calls(message: &Value) -> Option<Vec<InferenceToolCall>> {
    message["tool_calls"].as_array().map(|tcs| {
        tcs.iter()
            .map(|tc| InferenceToolCall {
                id: tc["id"].as_str().unwrap_or("").to_string(),
                call_type: "function".to_string(),
                function: InferenceToolCallFunction {
                    name: tc["function"]["name"].as_str().unwrap_or("").to_string(),
                    arguments: tc["function"]["arguments"]
                        .as_str()
                        .unwrap_or("{}")
                        .to_string(),
                },
            })
            .collect()
    })
}

/// Format a ChatMessage into the JSON structure expected by the
/// OpenAI-compatible API.
fn format_message(msg: &ChatMessage) -> Value {
    let mut formatted = serde_json::json!({
        "role": msg.role,
        "content": msg.content,
    });

    if let Some(ref name) = msg.name {
        formatted["name"] = serde_json::json!(name);
    }

    if let Some(ref tool_calls) = msg.tool_calls {
        let tc_json: Vec<Value> = tool_calls
            .iter()
            .map(|tc| {
                serde_json::json!({
                    "id": tc.id,
                    "type": tc.call_type,
                    "function": {
                        "name": tc.function.name,
                        "arguments": tc.function.arguments,
                    }
                })
            })
            .collect();
        formatted["tool_calls"] = serde_json::json!(tc_json);
    }

    if let Some(ref tool_call_id) = msg.tool_call_id {
        formatted["tool_call_id"] = serde_json::json!(tool_call_id);
    }

    formatted
}
