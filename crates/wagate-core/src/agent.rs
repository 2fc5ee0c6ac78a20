//! AI agent responder
//!
//! Response generation is a stub: [`CannedResponder`] picks one of a few
//! fixed replies. The conversation context is still maintained so a real
//! model can be dropped in behind [`AgentResponder`].

use crate::error::Result;
use crate::models::{AiAgent, ConversationTurn};
use async_trait::async_trait;

/// Turns kept per conversation
pub const MAX_CONTEXT_TURNS: usize = 20;

/// Produces a reply to an inbound message
#[async_trait]
pub trait AgentResponder: Send + Sync {
    /// Reply to `incoming`, given the conversation so far (oldest first)
    async fn respond(
        &self,
        agent: &AiAgent,
        context: &[ConversationTurn],
        incoming: &str,
    ) -> Result<String>;
}

/// Fixed-reply responder
#[derive(Debug, Default, Clone, Copy)]
pub struct CannedResponder;

const GREETINGS: &[&str] = &["hi", "hello", "hey", "hola", "good morning", "good evening"];

impl CannedResponder {
    fn is_greeting(text: &str) -> bool {
        let lower = text.trim().to_lowercase();
        GREETINGS
            .iter()
            .any(|g| lower == *g || lower.starts_with(&format!("{g} ")) || lower.starts_with(&format!("{g}!")))
    }
}

#[async_trait]
impl AgentResponder for CannedResponder {
    async fn respond(
        &self,
        agent: &AiAgent,
        context: &[ConversationTurn],
        incoming: &str,
    ) -> Result<String> {
        let reply = if Self::is_greeting(incoming) {
            if context.is_empty() {
                format!("Hello! I'm {}. How can I help you today?", agent.name)
            } else {
                "Hello again! What else can I do for you?".to_string()
            }
        } else if incoming.to_lowercase().contains("help") {
            format!(
                "I'm {}, an automated assistant. Tell me what you need and a team member will follow up if I can't help.",
                agent.name
            )
        } else {
            format!(
                "{} received your message: \"{}\". We'll get back to you shortly.",
                agent.name,
                incoming.trim()
            )
        };

        Ok(reply)
    }
}
