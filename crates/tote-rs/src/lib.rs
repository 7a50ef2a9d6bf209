//! Conversation compaction and persona inference core for a shopping assistant.
//!
//! `tote-rs` contains the two subsystems of the assistant that do real
//! algorithmic work, decoupled from transport, UI, and the LLM call itself:
//!
//! 1. **Window compaction** ([`context`]) — keeps a multi-turn chat history
//!    inside a model token budget. Tool results in older messages are replaced
//!    with one-line digests, and messages that still don't fit are dropped
//!    oldest-first. The first message (original intent) and the previous full
//!    turn are always preserved verbatim so follow-up questions keep working.
//!
//! 2. **Persona inference** ([`persona`]) — extracts behavioral signals from
//!    user activity (chat statements, searches, purchases), merges them into a
//!    durable confidence-scored profile, and renders that profile as a text
//!    block for injection into a system prompt.
//!
//! Everything else — HTTP routing, auth, vendor-API calls, the model call —
//! is an external collaborator: the compactor takes a raw history and returns
//! a reduced one; the persona engine takes signals and a user id and persists
//! an updated record.
//!
//! # Getting started
//!
//! ```ignore
//! use tote_rs::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     // Compact an incoming history before sending it to the model.
//!     let compactor = HistoryCompactor::new().with_max_tokens(6000.0);
//!     let reduced = compactor.compact(&history);
//!
//!     // Learn from the user's latest message, off the response path.
//!     let engine = Arc::new(PersonaEngine::new(Arc::new(
//!         JsonFileStore::new(".tote/personas").map_err(|e| e.to_string())?,
//!     )));
//!     let signals = extract_chat_signals("I'm vegan and my budget is $150");
//!     engine.record_signals_detached("user-1", signals);
//!
//!     // Later: inject what we know into the system prompt.
//!     if let Some(profile) = engine.render("user-1").await? {
//!         println!("{profile}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`context`] | Token estimation, tool result digests, history compaction |
//! | [`persona`] | Signal extraction, merge rules, persistence, profile rendering |
//!
//! # Design principles
//!
//! 1. **The core is pure.** Estimation, summarization, compaction, signal
//!    extraction, merging, and rendering are total functions over plain data —
//!    no I/O, no errors, safe to call concurrently.
//!
//! 2. **Personalization is best-effort.** Persona persistence runs as a
//!    fire-and-forget task off the chat path. A lost persona update is
//!    tolerable; a delayed chat response is not.
//!
//! 3. **The budget is a soft target.** Compaction selects whole messages
//!    under the budget; it never slices a message mid-content, and a
//!    pathological input passes through rather than being corrupted.

pub mod context;
pub mod persona;
pub mod prelude;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Message types ──────────────────────────────────────────────────

/// Author of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// Lifecycle state of a tool call embedded in a message.
///
/// Only [`OutputAvailable`](ToolCallState::OutputAvailable) calls are ever
/// summarized during compaction; pending and failed calls are dropped so a
/// partial result can't leak into the reduced history.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCallState {
    Pending,
    OutputAvailable,
    Failed,
}

/// One part of a message.
///
/// A closed tagged union: every consumer matches exhaustively, so adding a
/// variant forces every call site to decide how to handle it. `Reasoning` and
/// `StepStart` are opaque — the compactor passes them through or drops the
/// whole message, never rewrites them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Part {
    /// Plain text authored by the user or the model.
    Text { text: String },
    /// A tool invocation and (eventually) its result.
    #[serde(rename_all = "camelCase")]
    ToolCall {
        tool_name: String,
        call_id: String,
        state: ToolCallState,
        #[serde(default)]
        input: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<serde_json::Value>,
    },
    /// Model reasoning content. Passed through verbatim.
    Reasoning { text: String },
    /// Step boundary marker. Passed through verbatim.
    StepStart,
}

impl Part {
    /// Plain text part.
    pub fn text(content: impl Into<String>) -> Self {
        Part::Text {
            text: content.into(),
        }
    }

    /// Completed tool call with its output attached.
    pub fn tool_output(
        tool_name: impl Into<String>,
        call_id: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
    ) -> Self {
        Part::ToolCall {
            tool_name: tool_name.into(),
            call_id: call_id.into(),
            state: ToolCallState::OutputAvailable,
            input,
            output: Some(output),
        }
    }
}

/// A message in the conversation history.
///
/// Immutable once appended: compaction produces rewritten copies, it never
/// mutates the owned history.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub parts: Vec<Part>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            parts,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(content)])
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![Part::text(content)])
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, vec![Part::text(content)])
    }

    /// Assistant message carrying a single completed tool call.
    pub fn tool_call(part: Part) -> Self {
        Self::new(Role::Assistant, vec![part])
    }

    /// Assistant message with an explicit part list.
    pub fn assistant_parts(parts: Vec<Part>) -> Self {
        Self::new(Role::Assistant, parts)
    }

    /// Replace the generated id (histories loaded from storage carry their own).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Concatenated text content of all `Text` parts.
    pub fn text_content(&self) -> String {
        let chunks: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        chunks.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let user = Message::user("hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.text_content(), "hello");
        assert!(!user.id.is_empty());

        let assist = Message::assistant_text("hi there");
        assert_eq!(assist.role, Role::Assistant);

        let sys = Message::system("be helpful");
        assert_eq!(sys.role, Role::System);
    }

    #[test]
    fn with_id_overrides_generated_id() {
        let msg = Message::user("hello").with_id("m-1");
        assert_eq!(msg.id, "m-1");
    }

    #[test]
    fn text_content_skips_non_text_parts() {
        let msg = Message::assistant_parts(vec![
            Part::text("before"),
            Part::StepStart,
            Part::tool_output("search_products", "c1", serde_json::json!({}), serde_json::json!({})),
            Part::text("after"),
        ]);
        assert_eq!(msg.text_content(), "before after");
    }

    #[test]
    fn part_wire_format_matches_original_tags() {
        let part = Part::tool_output(
            "search_products",
            "call-1",
            serde_json::json!({"query": "lamp"}),
            serde_json::json!({"products": []}),
        );
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "tool-call");
        assert_eq!(json["toolName"], "search_products");
        assert_eq!(json["callId"], "call-1");
        assert_eq!(json["state"], "output-available");

        let step = serde_json::to_value(Part::StepStart).unwrap();
        assert_eq!(step["type"], "step-start");
    }

    #[test]
    fn role_round_trips_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);
    }
}
