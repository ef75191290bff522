//! Agent layer: descriptors, presets, the run loop, and tools.

pub mod presets;
pub mod runner;
pub mod team;
pub mod tools;

pub use runner::Agent;
pub use team::{dispatch, Team};

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted inference client for offline run-loop tests.

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::types::{
        ChatMessage, ChatRole, InferenceClient, InferenceOptions, InferenceResponse,
        InferenceToolCall, TokenUsage,
    };

    /// Replays a fixed sequence of replies (or failures) and records
    /// every message list it was called with.
    pub struct ScriptedInference {
        script: Mutex<Vec<Result<InferenceResponse, String>>>,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedInference {
        pub fn new(replies: Vec<InferenceResponse>) -> Self {
            Self {
                script: Mutex::new(replies.into_iter().map(Ok).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Plain text replies, one per expected call.
        pub fn answering(texts: &[&str]) -> Self {
            Self::new(texts.iter().map(|t| Self::text_reply(t)).collect())
        }

        /// Every call fails with the given message.
        pub fn failing(message: &str) -> Self {
            Self {
                script: Mutex::new(vec![Err(message.to_string()); 8]),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn text_reply(content: &str) -> InferenceResponse {
            InferenceResponse {
                id: "resp".to_string(),
                model: "scripted".to_string(),
                message: ChatMessage::text(ChatRole::Assistant, content),
                tool_calls: None,
                usage: TokenUsage::default(),
                finish_reason: "stop".to_string(),
            }
        }

        pub fn tool_call_reply(calls: Vec<InferenceToolCall>) -> InferenceResponse {
            InferenceResponse {
                id: "resp".to_string(),
                model: "scripted".to_string(),
                message: ChatMessage {
                    role: ChatRole::Assistant,
                    content: String::new(),
                    name: None,
                    tool_calls: Some(calls.clone()),
                    tool_call_id: None,
                },
                tool_calls: Some(calls),
                usage: TokenUsage::default(),
                finish_reason: "tool_calls".to_string(),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InferenceClient for ScriptedInference {
        async fn chat(
            &self,
            messages: Vec<ChatMessage>,
            _options: Option<InferenceOptions>,
        ) -> anyhow::Result<InferenceResponse> {
            self.calls.lock().unwrap().push(messages);
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                anyhow::bail!("scripted inference exhausted");
            }
            script.remove(0).map_err(|e| anyhow::anyhow!(e))
        }

        fn default_model(&self) -> String {
            "scripted".to_string()
        }
    }
}
