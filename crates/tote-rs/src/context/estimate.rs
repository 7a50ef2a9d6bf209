//! Token cost estimation from character counts.
//!
//! Approximates tokens as `chars / 4` for text and as the length of the JSON
//! serialization for structured parts. This is deliberately not a tokenizer:
//! the compactor's budget policy was tuned against this heuristic, and an
//! exact count would shift every downstream threshold.

use crate::{Message, Part};

/// Characters per token for English text and JSON payloads.
pub const CHARS_PER_TOKEN: f64 = 4.0;

/// Estimated token cost of a single part.
///
/// Text parts cost their character count over [`CHARS_PER_TOKEN`]; any other
/// part costs the length of its JSON form, so a bulky tool result is priced
/// at roughly what the model would actually see.
pub fn estimate_part(part: &Part) -> f64 {
    match part {
        Part::Text { text } => text.len() as f64 / CHARS_PER_TOKEN,
        other => {
            let len = serde_json::to_string(other).map_or(0, |s| s.len());
            len as f64 / CHARS_PER_TOKEN
        }
    }
}

/// Estimated token cost of a message (sum over its parts).
pub fn estimate_message(message: &Message) -> f64 {
    message.parts.iter().map(estimate_part).sum()
}

/// Estimated token cost of a slice of messages.
pub fn estimate_messages(messages: &[Message]) -> f64 {
    messages.iter().map(estimate_message).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn longer_text_costs_more() {
        let short = Message::user("hi");
        let long = Message::user("hi there, I'm looking for a standing desk");
        assert!(estimate_message(&long) > estimate_message(&short));
    }

    #[test]
    fn text_cost_is_roughly_proportional() {
        let msg = Message::user("a".repeat(1000));
        let cost = estimate_message(&msg);
        assert!((cost - 250.0).abs() < 1.0);
    }

    #[test]
    fn tool_parts_cost_their_json_size() {
        let small = Message::tool_call(Part::tool_output(
            "search_products",
            "c1",
            json!({"query": "lamp"}),
            json!({"products": []}),
        ));
        let large = Message::tool_call(Part::tool_output(
            "search_products",
            "c1",
            json!({"query": "lamp"}),
            json!({"products": ["x".repeat(2000)]}),
        ));
        assert!(estimate_message(&large) > estimate_message(&small));
        assert!(estimate_message(&small) > 0.0);
    }

    #[test]
    fn empty_message_costs_nothing() {
        let msg = Message::assistant_parts(vec![]);
        assert_eq!(estimate_message(&msg), 0.0);
    }

    #[test]
    fn slice_estimate_sums_messages() {
        let msgs = vec![Message::user("one"), Message::user("two")];
        let total = estimate_messages(&msgs);
        let by_hand = estimate_message(&msgs[0]) + estimate_message(&msgs[1]);
        assert_eq!(total, by_hand);
    }
}
