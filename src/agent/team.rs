//! Team Composition
//!
//! A team is an explicit composite: a list of member agents the
//! dispatcher consults one after another, followed by a single
//! synthesis call that folds their findings into one answer. Members
//! run sequentially; there is no fan-out.

use anyhow::{Context, Result};
use tracing::info;

use crate::types::{
    ChatMessage, ChatRole, InferenceClient, InferenceOptions, RunResponse, ToolContext,
};

use super::runner::Agent;

/// A composite agent whose members are consulted together to answer a
/// single query.
#[derive(Clone)]
pub struct Team {
    pub name: String,
    pub members: Vec<Agent>,
    pub instructions: Vec<String>,
    pub markdown: bool,
}

impl Team {
    /// System prompt for the synthesis call.
    fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are {}. You coordinate a team of specialist agents and \
             combine their findings into one answer for the user.",
            self.name
        );
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

    /// Run the team against a single query.
    ///
    /// Each member receives the raw query and runs to completion before
    /// the next starts. The returned transcript records the query, one
    /// message per member finding, and ends with the synthesis answer.
    pub async fn run(
        &self,
        inference: &dyn InferenceClient,
        ctx: &ToolContext,
        query: &str,
    ) -> Result<RunResponse> {
        let mut transcript = vec![ChatMessage::text(ChatRole::User, query)];
        let mut findings: Vec<String> = Vec::new();

        for member in &self.members {
            info!(team = %self.name, member = %member.name, "consulting member");
            let response = member
                .run(inference, ctx, query)
                .await
                .with_context(|| format!("Member agent '{}' failed", member.name))?;

            let mut section = format!("### {}\n\n{}", member.name, response.content());
            if member.show_tool_calls {
                let used = Agent::tools_used(&response);
                if !used.is_empty() {
                    section.push_str(&format!("\n\nTools used: {}", used.join(", ")));
                }
            }

            transcript.push(ChatMessage {
                role: ChatRole::Assistant,
                content: response.content().to_string(),
                name: Some(member.name.clone()),
                tool_calls: None,
                tool_call_id: None,
            });
            findings.push(section);
        }

        let synthesis_input = format!(
            "User query: {}\n\nFindings from your team:\n\n{}",
            query,
            findings.join("\n\n")
        );

        let response = inference
            .chat(
                vec![
                    ChatMessage::text(ChatRole::System, self.system_prompt()),
                    ChatMessage::text(ChatRole::User, synthesis_input),
                ],
                Some(InferenceOptions::default()),
            )
            .await
            .context("Team synthesis call failed")?;

        // The synthesis answer is always the last message
        transcript.push(ChatMessage {
            name: Some(self.name.clone()),
            ..response.message
        });

        Ok(RunResponse {
            messages: transcript,
        })
    }
}

/// Send one user query to the team and return the displayed answer.
///
/// Exactly one team run per activation; any failure surfaces as a
/// single undifferentiated "agent invocation failed" error carrying
/// the underlying message.
pub async fn dispatch(
    team: &Team,
    inference: &dyn InferenceClient,
    ctx: &ToolContext,
    query: &str,
) -> Result<String> {
    info!(team = %team.name, "dispatching query");
    let response = team
        .run(inference, ctx, query)
        .await
        .context("Agent invocation failed")?;
    Ok(response.content().to_string())
}
