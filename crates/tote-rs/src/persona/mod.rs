//! Persona inference: signals in, personalized context out.
//!
//! The engine turns raw user activity into a durable, confidence-scored
//! shopping profile in four stages:
//!
//! 1. **[`signal`]** — pattern-based extractors scan chat text, searches, and
//!    purchases for typed preference evidence ([`PersonaSignal`]).
//!
//! 2. **[`merge`]** — each signal updates the record through a per-kind rule
//!    (EMA brand affinity, additive interest, clamped spectrum shifts) and
//!    nudges the aggregate confidence score upward.
//!
//! 3. **[`store`]** / **[`engine`]** — the record persists behind a two-method
//!    storage trait; the engine serializes read-modify-write cycles per user
//!    and runs merges off the chat response path.
//!
//! 4. **[`render`]** — the record becomes a plain-text profile block injected
//!    into the model's system prompt on later turns.
//!
//! The whole pipeline is best-effort by design: extraction is heuristic,
//! merging is fire-and-forget, and a lost update costs one increment of
//! personalization, never a user-visible failure.

pub mod engine;
pub mod merge;
pub mod record;
pub mod render;
pub mod signal;
pub mod store;

// Re-export commonly used items at the module level.
pub use engine::PersonaEngine;
pub use merge::merge_signals;
pub use record::{BudgetRange, OnboardingAnswers, PersonaEdit, PersonaRecord, apply_edit};
pub use render::{confidence_label, price_quality_label, render_persona};
pub use signal::{
    PersonaSignal, PurchasedProduct, SignalKind, SignalSource, SignalValue, extract_chat_signals,
    extract_purchase_signals, extract_search_signals, infer_categories,
};
pub use store::{JsonFileStore, MemoryStore, PersonaStore, StoreFuture};
