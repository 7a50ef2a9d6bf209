//! Conversation window management: estimation, tool digests, compaction.
//!
//! The context window is the scarcest resource in any chat loop. This module
//! keeps a multi-turn history inside a token budget in three layered steps:
//!
//! 1. **[`estimate`]** — approximates the token cost of a message from its
//!    character count. A heuristic, not a tokenizer; downstream thresholds
//!    were tuned against it.
//!
//! 2. **[`summary`]** — converts a completed tool call's structured output
//!    into a short text digest (product names, prices, URLs), per tool kind.
//!    One-shot actions like purchases produce no digest at all.
//!
//! 3. **[`compactor`]** — selects which messages survive: the first message
//!    and the previous full turn are kept verbatim, the middle is summarized
//!    newest-first under the budget, and whatever doesn't fit is dropped.
//!
//! Compaction is lossy and irreversible by design — bounded cost is traded
//! against completeness, and nothing recovers a dropped message.

pub mod compactor;
pub mod estimate;
pub mod summary;

// Re-export commonly used items at the module level.
pub use compactor::{DEFAULT_MAX_TOKENS, HistoryCompactor, tail_start};
pub use estimate::{CHARS_PER_TOKEN, estimate_message, estimate_messages, estimate_part};
pub use summary::{summarize_tool_parts, summarize_tool_result};
