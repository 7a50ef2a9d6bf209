//! Token-aware history compaction.
//!
//! Keeps a conversation inside a token budget without losing the context a
//! follow-up question needs. Two zones are sacred and always pass through
//! byte-for-byte:
//!
//! - the **first message**, which establishes the user's original intent;
//! - the **tail window**, from the start of the previous full turn onward,
//!   so product URLs and prices produced by the prior turn's tool calls are
//!   still on hand for "what about the second one?" questions.
//!
//! Everything between is walked newest-first: tool payloads are replaced
//! with digests, emptied messages are dropped, and the walk stops as soon as
//! the budget would be exceeded — recency is the strongest predictor of
//! relevance, so distant history is sacrificed first. The budget is a soft
//! target for selection, never a slicing boundary: a single oversized message
//! is passed through rather than truncated mid-content.

use crate::context::estimate::{estimate_message, estimate_messages};
use crate::context::summary::summarize_tool_parts;
use crate::{Message, Role};
use std::collections::VecDeque;
use tracing::debug;

/// Default token budget for a compacted history.
pub const DEFAULT_MAX_TOKENS: f64 = 6000.0;

/// Index where the preserved tail window starts.
///
/// The tail begins at the second-most-recent user message (the start of the
/// previous full turn). With only one user message the tail starts there;
/// with none it is just the final message.
pub fn tail_start(messages: &[Message]) -> usize {
    let Some(last_user) = messages.iter().rposition(|m| m.role == Role::User) else {
        return messages.len().saturating_sub(1);
    };
    match messages[..last_user].iter().rposition(|m| m.role == Role::User) {
        Some(prev_user) => prev_user,
        None => last_user,
    }
}

/// Token-aware message selection under a budget.
///
/// # Example
///
/// ```ignore
/// let compactor = HistoryCompactor::new().with_max_tokens(4000.0);
/// let reduced = compactor.compact(&history);
/// ```
#[derive(Debug, Clone)]
pub struct HistoryCompactor {
    max_tokens: f64,
}

impl Default for HistoryCompactor {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl HistoryCompactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the token budget.
    pub fn with_max_tokens(mut self, max: f64) -> Self {
        self.max_tokens = max;
        self
    }

    /// The configured token budget.
    pub fn max_tokens(&self) -> f64 {
        self.max_tokens
    }

    /// Reduce a history to fit the budget.
    ///
    /// Output order is always a subsequence of input order. Histories of
    /// three or fewer messages, and histories whose tail window reaches back
    /// to the first message, are returned unchanged — there is no middle to
    /// compact.
    pub fn compact(&self, messages: &[Message]) -> Vec<Message> {
        if messages.len() <= 3 {
            return messages.to_vec();
        }

        let tail_start = tail_start(messages);
        if tail_start == 0 {
            return messages.to_vec();
        }

        let first = &messages[0];
        let middle = &messages[1..tail_start];
        let tail = &messages[tail_start..];

        // The preserved zones are spent before any middle message is admitted.
        let mut total = estimate_message(first) + estimate_messages(tail);
        let mut kept: VecDeque<Message> = VecDeque::new();
        let mut dropped = 0usize;

        for message in middle.iter().rev() {
            let summarized = summarize_tool_parts(message);
            if summarized.parts.is_empty() {
                dropped += 1;
                continue;
            }
            let cost = estimate_message(&summarized);
            if total + cost > self.max_tokens {
                // Everything older than this point is dropped, not summarized.
                dropped += middle.len() - kept.len() - dropped;
                break;
            }
            total += cost;
            kept.push_front(summarized);
        }

        debug!(
            "compacted history: {} -> {} messages ({} middle kept, {} dropped, ~{:.0} tokens of {:.0})",
            messages.len(),
            1 + kept.len() + tail.len(),
            kept.len(),
            dropped,
            total,
            self.max_tokens,
        );

        let mut out = Vec::with_capacity(1 + kept.len() + tail.len());
        out.push(first.clone());
        out.extend(kept);
        out.extend(tail.iter().cloned());
        out
    }
}
