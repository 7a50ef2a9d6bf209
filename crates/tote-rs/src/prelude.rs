//! Convenience re-exports for common `tote-rs` types.
//!
//! Meant to be glob-imported by callers wiring the compactor and persona
//! engine into a chat backend:
//!
//! ```ignore
//! use tote_rs::prelude::*;
//! ```
//!
//! Specialized items (single-rule extractors, store future alias, label
//! helpers) are intentionally excluded — import those from their modules
//! directly when needed.

// ── Core message model ──────────────────────────────────────────────
pub use crate::{Message, Part, Role, ToolCallState};

// ── Window compaction ───────────────────────────────────────────────
pub use crate::context::{
    HistoryCompactor, estimate_message, estimate_messages, summarize_tool_parts,
    summarize_tool_result,
};

// ── Persona engine ──────────────────────────────────────────────────
pub use crate::persona::{
    JsonFileStore, MemoryStore, OnboardingAnswers, PersonaEdit, PersonaEngine, PersonaRecord,
    PersonaSignal, PersonaStore, PurchasedProduct, SignalKind, SignalSource, SignalValue,
    extract_chat_signals, extract_purchase_signals, extract_search_signals, merge_signals,
    render_persona,
};
