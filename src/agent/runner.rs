//! The Agent Run Loop
//!
//! One query in, one transcript out: build the system prompt, call the
//! model, execute any requested tools, feed results back, and repeat
//! until the model answers in plain text.

use anyhow::Result;
use serde_json::Value;
use tracing::info;

use crate::types::{
    ChatMessage, ChatRole, InferenceClient, InferenceOptions, RunResponse, ToolContext,
};

use super::tools::{execute_tool, tools_to_inference_format, BuiltinTool};

/// Maximum model round-trips for a single query.
const MAX_STEPS: usize = 8;

/// Maximum tool calls executed from a single model reply.
const MAX_TOOL_CALLS_PER_TURN: usize = 10;

/// A configured agent: model role, instructions, and the tools it may
/// call. Value object, rebuilt for every interaction.
#[derive(Clone)]
pub struct Agent {
    pub name: String,
    pub role: Option<String>,
    pub instructions: Vec<String>,
    pub tools: Vec<BuiltinTool>,
    pub show_tool_calls: bool,
    pub markdown: bool,
}

impl Agent {
    /// Assemble the system prompt from role, instructions, and flags.
    pub fn system_prompt(&self) -> String {
        let mut prompt = format!("You are {}.", self.name);
        if let Some(ref role) = self.role {
            prompt.push_str(&format!(" Your role: {}.", role));
        }
        if !self.instructions.is_empty() {
            prompt.push_str("\n\nInstructions:");
            for instruction in &self.instructions {
                prompt.push_str(&format!("\n- {}", instruction));
            }
        }
        if self.markdown {
            prompt.push_str("\n\nFormat your answer as Markdown.");
        }
        prompt
    }

    /// Names of the tools invoked in a transcript, in call order.
    pub fn tools_used(response: &RunResponse) -> Vec<String> {
        response
            .messages
            .iter()
            .filter_map(|m| m.tool_calls.as_ref())
            .flatten()
            .map(|tc| tc.function.name.clone())
            .collect()
    }

    /// Run the agent against a single query.
    ///
    /// The returned transcript always ends with the final assistant
    /// answer; `RunResponse::content` relies on that.
    pub async fn run(
        &self,
        inference: &dyn InferenceClient,
        ctx: &ToolContext,
        query: &str,
    ) -> Result<RunResponse> {
        let mut messages = vec![
            ChatMessage::text(ChatRole::System, self.system_prompt()),
            ChatMessage::text(ChatRole::User, query),
        ];

        let tool_defs = if self.tools.is_empty() {
            None
        } else {
            Some(tools_to_inference_format(&self.tools))
        };

        info!(agent = %self.name, "[RUN] {}", preview(query, 100));

        for _step in 0..MAX_STEPS {
            let options = InferenceOptions {
                tools: tool_defs.clone(),
                ..Default::default()
            };

            let response = inference.chat(messages.clone(), Some(options)).await?;

            let mut tool_calls = response.tool_calls.clone().unwrap_or_default();
            if tool_calls.is_empty() {
                // Plain text reply: the answer. Push it last and stop.
                messages.push(ChatMessage {
                    name: Some(self.name.clone()),
                    ..response.message
                });
                return Ok(RunResponse { messages });
            }

            // Record the assistant turn that requested the calls, then
            // execute each and append its result as a tool message.
            // Every declared call id must be answered by a tool message,
            // so calls beyond the cap are dropped from the record too.
            tool_calls.truncate(MAX_TOOL_CALLS_PER_TURN);
            messages.push(ChatMessage {
                role: ChatRole::Assistant,
                content: response.message.content.clone(),
                name: None,
                tool_calls: Some(tool_calls.clone()),
                tool_call_id: None,
            });

            for tc in &tool_calls {
                let args: Value = serde_json::from_str(&tc.function.arguments).unwrap_or_default();

                info!(
                    agent = %self.name,
                    "[TOOL] {}({})",
                    tc.function.name,
                    preview(&tc.function.arguments, 100)
                );

                let mut result = execute_tool(&tc.function.name, &args, &self.tools, ctx).await;
                // The result id must match the id the model assigned
                result.id = tc.id.clone();

                let content = match result.error {
                    Some(ref err) => format!("Error: {}", err),
                    None => result.result.clone(),
                };

                info!(
                    agent = %self.name,
                    "[TOOL RESULT] {}: {}",
                    result.name,
                    preview(&content, 200)
                );

                messages.push(ChatMessage {
                    role: ChatRole::Tool,
                    content,
                    name: None,
                    tool_calls: None,
                    tool_call_id: Some(result.id),
                });
            }
        }

        anyhow::bail!(
            "Agent '{}' exceeded {} tool-calling rounds without answering",
            self.name,
            MAX_STEPS
        )
    }
}

/// Truncate a string for log output, respecting char boundaries.
fn preview(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedInference;
    use crate::agent::tools::search_tools;
    use crate::types::{InferenceToolCall, InferenceToolCallFunction};

    fn test_agent() -> Agent {
        Agent {
            name: "Test Agent".to_string(),
            role: Some("answer questions".to_string()),
            instructions: vec!["Always include sources".to_string()],
            tools: search_tools(),
            show_tool_calls: true,
            markdown: true,
        }
    }

    #[test]
    fn test_system_prompt_layout() {
        let prompt = test_agent().system_prompt();
        assert!(prompt.starts_with("You are Test Agent."));
        assert!(prompt.contains("Your role: answer questions."));
        assert!(prompt.contains("- Always include sources"));
        assert!(prompt.contains("Markdown"));
    }

    #[test]
    fn test_system_prompt_without_role_or_markdown() {
        let agent = Agent {
            name: "Bare".to_string(),
            role: None,
            instructions: vec![],
            tools: vec![],
            show_tool_calls: false,
            markdown: false,
        };
        let prompt = agent.system_prompt();
        assert_eq!(prompt, "You are Bare.");
    }

    #[tokio::test]
    async fn test_run_plain_answer() {
        let inference = ScriptedInference::answering(&["The answer is 42."]);
        let ctx = ToolContext::new();

        let response = test_agent()
            .run(&inference, &ctx, "what is the answer?")
            .await
            .unwrap();

        assert_eq!(response.content(), "The answer is 42.");
        // system + user + assistant
        assert_eq!(response.messages.len(), 3);
        assert_eq!(inference.call_count(), 1);

        // The dispatched query must arrive verbatim
        let first_call = inference.calls()[0].clone();
        assert_eq!(first_call[1].content, "what is the answer?");
    }

    #[tokio::test]
    async fn test_run_tool_round_then_answer() {
        // First reply requests an out-of-toolset tool (executes locally,
        // fails, no network); second reply answers in text.
        let inference = ScriptedInference::new(vec![
            ScriptedInference::tool_call_reply(vec![InferenceToolCall {
                id: "call_1".to_string(),
                call_type: "function".to_string(),
                function: InferenceToolCallFunction {
                    name: "stock_price".to_string(),
                    arguments: "{\"symbol\":\"NVDA\"}".to_string(),
                },
            }]),
            ScriptedInference::text_reply("done"),
        ]);
        let ctx = ToolContext::new();

        let response = test_agent().run(&inference, &ctx, "price?").await.unwrap();

        assert_eq!(response.content(), "done");
        assert_eq!(inference.call_count(), 2);

        // Tool result was fed back with the model's call id
        let second_call = inference.calls()[1].clone();
        let tool_msg = second_call
            .iter()
            .find(|m| m.role == ChatRole::Tool)
            .unwrap();
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert!(tool_msg.content.starts_with("Error:"));

        assert_eq!(Agent::tools_used(&response), vec!["stock_price"]);
    }

    #[tokio::test]
    async fn test_run_gives_up_after_max_steps() {
        let reply = ScriptedInference::tool_call_reply(vec![InferenceToolCall {
            id: "call_x".to_string(),
            call_type: "function".to_string(),
            function: InferenceToolCallFunction {
                name: "no_such_tool".to_string(),
                arguments: "{}".to_string(),
            },
        }]);
        let inference = ScriptedInference::new(vec![reply; 20]);
        let ctx = ToolContext::new();

        let err = test_agent().run(&inference, &ctx, "loop").await.unwrap_err();
        assert!(err.to_string().contains("exceeded"));
        assert_eq!(inference.call_count(), 8);
    }

    #[tokio::test]
    async fn test_run_caps_tool_calls_and_answers_every_declared_id() {
        // One reply requesting 12 calls; only the first 10 may be kept,
        // and each kept call id must get a matching tool result.
        let calls: Vec<InferenceToolCall> = (0..12)
            .map(|i| InferenceToolCall {
                id: format!("call_{}", i),
                call_type: "function".to_string(),
                function: InferenceToolCallFunction {
                    name: "no_such_tool".to_string(),
                    arguments: "{}".to_string(),
                },
            })
            .collect();
        let inference = ScriptedInference::new(vec![
            ScriptedInference::tool_call_reply(calls),
            ScriptedInference::text_reply("done"),
        ]);
        let ctx = ToolContext::new();

        let response = test_agent().run(&inference, &ctx, "q").await.unwrap();
        assert_eq!(response.content(), "done");

        // Inspect the second request: the assistant message must declare
        // exactly the calls that were executed, each answered in order.
        let second_call = inference.calls()[1].clone();
        let assistant = second_call
            .iter()
            .find(|m| m.role == ChatRole::Assistant)
            .unwrap();
        let declared = assistant.tool_calls.as_ref().unwrap();
        assert_eq!(declared.len(), 10);

        let tool_ids: Vec<&str> = second_call
            .iter()
            .filter(|m| m.role == ChatRole::Tool)
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(tool_ids.len(), declared.len());
        for (tc, answered) in declared.iter().zip(&tool_ids) {
            assert_eq!(tc.id, *answered);
        }
        assert!(!tool_ids.contains(&"call_10"));
        assert!(!tool_ids.contains(&"call_11"));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("aaaaab", 5), "aaaaa...");
        // multibyte chars must not panic
        assert_eq!(preview("éééééé", 3), "ééé...");
    }
}
