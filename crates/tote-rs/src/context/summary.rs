//! Tool result digests: structured output → one-line text summaries.
//!
//! Full tool payloads are the single largest context consumer in the chat
//! loop — a product search can return kilobytes of JSON the model has already
//! acted on. When a message leaves the recency window, each completed tool
//! call is replaced with a short digest that keeps the follow-up-relevant
//! facts (titles, prices, URLs) and discards the rest.
//!
//! Tools whose results have no follow-up value (price tracking, purchases)
//! produce no digest at all — a one-shot action summarized is still token
//! bloat. Pending and failed calls are dropped entirely so a partial result
//! never leaks into the reduced history.

use crate::{Message, Part, ToolCallState};
use serde_json::Value;

/// Maximum items listed in a search or recommendations digest.
const MAX_SUMMARY_ITEMS: usize = 5;

/// Render a price field as `$<value>`.
///
/// Upstream scrapers deliver prices as either JSON numbers or strings;
/// both forms are accepted. Empty strings are treated as absent.
fn price_fragment(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::Number(n)) => Some(format!("${n}")),
        Some(Value::String(s)) if !s.is_empty() => Some(format!("${s}")),
        _ => None,
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn array_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter().find_map(|k| value.get(*k).and_then(Value::as_array))
}

/// Digest a completed tool call into a short text summary.
///
/// Returns `None` for tool kinds with no durable follow-up value and for any
/// payload shape the rules can't make sense of — the caller omits the part
/// rather than keeping a corrupt one.
pub fn summarize_tool_result(tool_name: &str, input: &Value, output: &Value) -> Option<String> {
    match tool_name {
        "search_products" => {
            let query = input.get("query").and_then(Value::as_str).unwrap_or("unknown");
            let products = array_field(output, &["products", "results"]);
            let Some(products) = products.filter(|p| !p.is_empty()) else {
                return Some(format!(
                    "[Previous search for \"{query}\" returned no results]"
                ));
            };
            let items: Vec<String> = products
                .iter()
                .take(MAX_SUMMARY_ITEMS)
                .map(|p| {
                    let mut fragments =
                        vec![str_field(p, "title").unwrap_or("Unknown").to_string()];
                    if let Some(price) = price_fragment(p.get("price")) {
                        fragments.push(price);
                    }
                    if let Some(url) = str_field(p, "retailerUrl") {
                        fragments.push(url.to_string());
                    }
                    fragments.join(" — ")
                })
                .collect();
            Some(format!(
                "[Previous search for \"{query}\" found: {}]",
                items.join("; ")
            ))
        }
        "get_product_details" => {
            let product = output.get("product").filter(|p| !p.is_null());
            let Some(product) = product else {
                let url = input.get("url").and_then(Value::as_str).unwrap_or("unknown");
                return Some(format!("[Product details lookup failed for {url}]"));
            };
            let mut fragments =
                vec![str_field(product, "title").unwrap_or("Unknown product").to_string()];
            if let Some(price) = price_fragment(product.get("price")) {
                fragments.push(price);
            }
            if let Some(url) = str_field(product, "url") {
                fragments.push(url.to_string());
            }
            Some(format!("[Product details: {}]", fragments.join(" — ")))
        }
        "get_recommendations" => {
            let recs = array_field(output, &["recommendations", "products"])?;
            if recs.is_empty() {
                return None;
            }
            let items: Vec<String> = recs
                .iter()
                .take(MAX_SUMMARY_ITEMS)
                .map(|p| match str_field(p, "title") {
                    Some(title) => match price_fragment(p.get("price")) {
                        Some(price) => format!("{title} ({price})"),
                        None => title.to_string(),
                    },
                    None => "item".to_string(),
                })
                .collect();
            Some(format!("[Recommendations: {}]", items.join(", ")))
        }
        // track_price, purchase — no useful follow-up context.
        _ => None,
    }
}

/// Rewrite a message for retention in a compacted history.
///
/// Completed tool calls become text digests (when their tool kind yields
/// one), pending and failed calls are dropped, and every non-tool part passes
/// through verbatim. The result may have no parts left at all — the compactor
/// drops such messages.
pub fn summarize_tool_parts(message: &Message) -> Message {
    let mut parts: Vec<Part> = Vec::with_capacity(message.parts.len());

    for part in &message.parts {
        match part {
            Part::ToolCall {
                tool_name,
                state: ToolCallState::OutputAvailable,
                input,
                output,
                ..
            } => {
                let output = output.clone().unwrap_or(Value::Null);
                if let Some(summary) = summarize_tool_result(tool_name, input, &output) {
                    parts.push(Part::text(summary));
                }
            }
            // Pending / failed calls carry no usable result.
            Part::ToolCall { .. } => {}
            other => parts.push(other.clone()),
        }
    }

    Message {
        parts,
        ..message.clone()
    }
}
