//! Behavioral signal extraction from user activity.
//!
//! Each chat rule is an independently testable pure function returning at
//! most one signal (dietary keywords may yield several), composed into
//! [`extract_chat_signals`]. This is deliberately heuristic pattern matching,
//! not language understanding — sarcasm and ambiguity can misfire, and that's
//! acceptable because every signal carries a confidence weight and the merger
//! accumulates rather than trusts.
//!
//! Trust ordering across sources: purchases are committed behavior (0.8–1.0),
//! chat statements are explicit but noisy (0.6–0.95), searches are weak
//! intent (0.5–0.6).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// ── Signal types ───────────────────────────────────────────────────

/// What kind of preference a signal describes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    BrandPreference,
    BudgetSignal,
    CategoryInterest,
    Lifestyle,
    QualityPreference,
    RetailerPreference,
}

/// Where a signal was observed.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Chat,
    Search,
    Purchase,
    Click,
    Feedback,
    Onboarding,
}

/// A signal's payload: a score/amount or a label.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum SignalValue {
    Number(f64),
    Text(String),
}

impl SignalValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SignalValue::Number(n) => Some(*n),
            SignalValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SignalValue::Text(s) => Some(s),
            SignalValue::Number(_) => None,
        }
    }
}

/// One typed unit of evidence about a user preference.
///
/// Ephemeral: produced per user action, consumed immediately by the merger,
/// never persisted standalone.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersonaSignal {
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub key: String,
    pub value: SignalValue,
    /// 0 to 1.
    pub confidence: f64,
    pub source: SignalSource,
}

fn signal(
    kind: SignalKind,
    key: impl Into<String>,
    value: SignalValue,
    confidence: f64,
    source: SignalSource,
) -> PersonaSignal {
    PersonaSignal {
        kind,
        key: key.into(),
        value,
        confidence,
        source,
    }
}

// ── Chat rules ─────────────────────────────────────────────────────

static BUDGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:budget|spend|afford|under|less than|max|no more than)\s*(?:of|is)?\s*\$?\s*(\d+)")
        .expect("BUDGET_RE regex should compile")
});

static PRICE_FOCUSED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:cheap|cheapest|affordable|budget|bargain)\b")
        .expect("PRICE_FOCUSED_RE regex should compile")
});

static QUALITY_FOCUSED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:premium|luxury|best quality|high[- ]end|top[- ]tier)\b")
        .expect("QUALITY_FOCUSED_RE regex should compile")
});

static POSITIVE_BRAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:i (?:like|love|prefer|want|use)|fan of|loyal to)\s+(\w+(?:\s+\w+)?)\b")
        .expect("POSITIVE_BRAND_RE regex should compile")
});

static NEGATIVE_BRAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:not|don't like|hate|avoid)\s+(\w+(?:\s+\w+)?)\b")
        .expect("NEGATIVE_BRAND_RE regex should compile")
});

const DIETARY_KEYWORDS: [&str; 8] = [
    "vegan",
    "vegetarian",
    "gluten-free",
    "organic",
    "kosher",
    "halal",
    "dairy-free",
    "keto",
];

/// Explicit spend ceiling: "budget of $150", "no more than 80".
fn budget_signal(lower: &str) -> Option<PersonaSignal> {
    let captures = BUDGET_RE.captures(lower)?;
    let amount: f64 = captures.get(1)?.as_str().parse().ok()?;
    Some(signal(
        SignalKind::BudgetSignal,
        "stated_budget",
        SignalValue::Number(amount),
        0.9,
        SignalSource::Chat,
    ))
}

/// Vocabulary that leans toward the price end of the spectrum.
fn price_focused_signal(lower: &str) -> Option<PersonaSignal> {
    PRICE_FOCUSED_RE.is_match(lower).then(|| {
        signal(
            SignalKind::QualityPreference,
            "price_sensitivity",
            SignalValue::Text("price_focused".into()),
            0.7,
            SignalSource::Chat,
        )
    })
}

/// Vocabulary that leans toward the quality end of the spectrum.
fn quality_focused_signal(lower: &str) -> Option<PersonaSignal> {
    QUALITY_FOCUSED_RE.is_match(lower).then(|| {
        signal(
            SignalKind::QualityPreference,
            "price_sensitivity",
            SignalValue::Text("quality_focused".into()),
            0.7,
            SignalSource::Chat,
        )
    })
}

/// "I love X", "fan of X" — first match wins, one to two words captured.
fn positive_brand_signal(lower: &str) -> Option<PersonaSignal> {
    let captures = POSITIVE_BRAND_RE.captures(lower)?;
    Some(signal(
        SignalKind::BrandPreference,
        captures.get(1)?.as_str().trim(),
        SignalValue::Number(1.0),
        0.8,
        SignalSource::Chat,
    ))
}

/// "avoid X", "hate X" — weaker than a positive statement.
fn negative_brand_signal(lower: &str) -> Option<PersonaSignal> {
    let captures = NEGATIVE_BRAND_RE.captures(lower)?;
    Some(signal(
        SignalKind::BrandPreference,
        captures.get(1)?.as_str().trim(),
        SignalValue::Number(-1.0),
        0.6,
        SignalSource::Chat,
    ))
}

/// One signal per dietary keyword present.
fn dietary_signals(lower: &str) -> Vec<PersonaSignal> {
    DIETARY_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(**keyword))
        .map(|keyword| {
            signal(
                SignalKind::Lifestyle,
                "dietary",
                SignalValue::Text((*keyword).into()),
                0.95,
                SignalSource::Chat,
            )
        })
        .collect()
}

/// Extract persona signals from a free-text chat statement.
///
/// Case-insensitive, never errors, always terminates; empty or non-matching
/// input yields an empty list.
pub fn extract_chat_signals(text: &str) -> Vec<PersonaSignal> {
    let lower = text.to_lowercase();
    let mut signals = Vec::new();
    signals.extend(budget_signal(&lower));
    signals.extend(price_focused_signal(&lower));
    signals.extend(quality_focused_signal(&lower));
    signals.extend(positive_brand_signal(&lower));
    signals.extend(negative_brand_signal(&lower));
    signals.extend(dietary_signals(&lower));
    signals
}

// ── Search signals ─────────────────────────────────────────────────

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "electronics",
        &[
            "phone", "laptop", "tablet", "headphone", "speaker", "camera", "tv", "monitor",
            "iphone", "samsung", "macbook",
        ],
    ),
    (
        "clothing",
        &["shirt", "pants", "dress", "shoes", "jacket", "sneaker", "boot", "hat", "hoodie"],
    ),
    (
        "home",
        &["furniture", "lamp", "chair", "table", "sofa", "bed", "pillow", "blanket", "kitchen"],
    ),
    (
        "sports",
        &["fitness", "gym", "yoga", "running", "bike", "bicycle", "ball", "racket"],
    ),
    ("beauty", &["skincare", "makeup", "perfume", "shampoo", "cream", "serum"]),
    ("toys", &["toy", "lego", "game", "puzzle", "doll", "action figure"]),
    ("grocery", &["food", "snack", "coffee", "tea", "organic", "milk", "bread"]),
];

/// Keyword-table category inference for a search query.
///
/// Falls back to `general` so every search contributes *some* interest.
pub fn infer_categories(query: &str) -> Vec<String> {
    let lower = query.to_lowercase();
    let matched: Vec<String> = CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(category, _)| (*category).to_string())
        .collect();
    if matched.is_empty() {
        vec!["general".to_string()]
    } else {
        matched
    }
}

/// Extract signals from a product search.
///
/// Searches are low-trust: interest at 0.5, a price filter at 0.6.
pub fn extract_search_signals(query: &str, max_price: Option<f64>) -> Vec<PersonaSignal> {
    let mut signals: Vec<PersonaSignal> = infer_categories(query)
        .into_iter()
        .map(|category| {
            signal(
                SignalKind::CategoryInterest,
                category,
                SignalValue::Number(1.0),
                0.5,
                SignalSource::Search,
            )
        })
        .collect();

    if let Some(ceiling) = max_price {
        signals.push(signal(
            SignalKind::BudgetSignal,
            "search_price_ceiling",
            SignalValue::Number(ceiling),
            0.6,
            SignalSource::Search,
        ));
    }

    signals
}

// ── Purchase signals ───────────────────────────────────────────────

/// The attributes of a completed purchase the extractor cares about.
#[derive(Deserialize, Clone, Debug)]
pub struct PurchasedProduct {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: f64,
    /// Retailer the purchase went through.
    pub source: String,
}

/// Extract signals from a purchase — the highest-trust source there is.
pub fn extract_purchase_signals(product: &PurchasedProduct) -> Vec<PersonaSignal> {
    let mut signals = Vec::new();

    if let Some(brand) = &product.brand {
        signals.push(signal(
            SignalKind::BrandPreference,
            brand.clone(),
            SignalValue::Number(1.0),
            0.95,
            SignalSource::Purchase,
        ));
    }

    if let Some(category) = &product.category {
        // Purchases weigh more than searches.
        signals.push(signal(
            SignalKind::CategoryInterest,
            category.clone(),
            SignalValue::Number(2.0),
            0.9,
            SignalSource::Purchase,
        ));
    }

    signals.push(signal(
        SignalKind::BudgetSignal,
        "actual_spend",
        SignalValue::Number(product.price),
        1.0,
        SignalSource::Purchase,
    ));

    signals.push(signal(
        SignalKind::RetailerPreference,
        product.source.clone(),
        SignalValue::Number(1.0),
        0.8,
        SignalSource::Purchase,
    ));

    signals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn of_kind(signals: &[PersonaSignal], kind: SignalKind) -> Vec<&PersonaSignal> {
        signals.iter().filter(|s| s.kind == kind).collect()
    }

    #[test]
    fn stated_budget_is_extracted() {
        let signals = extract_chat_signals("I have a budget of $150");
        let budget = of_kind(&signals, SignalKind::BudgetSignal);
        assert_eq!(budget.len(), 1);
        assert_eq!(budget[0].key, "stated_budget");
        assert_eq!(budget[0].value, SignalValue::Number(150.0));
        assert_eq!(budget[0].confidence, 0.9);
        assert_eq!(budget[0].source, SignalSource::Chat);
    }

    #[test]
    fn budget_phrasings_all_fire() {
        for text in [
            "I can spend $80",
            "something under 200 please",
            "no more than $45",
            "my max is 300",
        ] {
            let signals = extract_chat_signals(text);
            assert_eq!(
                of_kind(&signals, SignalKind::BudgetSignal).len(),
                1,
                "expected a budget signal for {text:?}"
            );
        }
    }

    #[test]
    fn price_and_quality_vocabulary() {
        let cheap = extract_chat_signals("looking for a cheap kettle");
        assert_eq!(
            cheap[0].value,
            SignalValue::Text("price_focused".into())
        );
        assert_eq!(cheap[0].confidence, 0.7);

        let premium = extract_chat_signals("show me high-end espresso machines");
        assert_eq!(
            premium[0].value,
            SignalValue::Text("quality_focused".into())
        );
    }

    #[test]
    fn positive_brand_captures_up_to_two_words() {
        let signals = extract_chat_signals("I love Sony headphones");
        let brands = of_kind(&signals, SignalKind::BrandPreference);
        assert_eq!(brands.len(), 1);
        assert_eq!(brands[0].key, "sony headphones");
        assert_eq!(brands[0].value, SignalValue::Number(1.0));
        assert_eq!(brands[0].confidence, 0.8);
    }

    #[test]
    fn negative_brand_is_weaker() {
        let signals = extract_chat_signals("please avoid Acme");
        let brands = of_kind(&signals, SignalKind::BrandPreference);
        assert_eq!(brands.len(), 1);
        assert_eq!(brands[0].key, "acme");
        assert_eq!(brands[0].value, SignalValue::Number(-1.0));
        assert_eq!(brands[0].confidence, 0.6);
    }

    #[test]
    fn dietary_keywords_each_fire_once() {
        let signals = extract_chat_signals("I'm vegan and avoid dairy-free stuff");
        let dietary: Vec<&str> = of_kind(&signals, SignalKind::Lifestyle)
            .iter()
            .filter_map(|s| s.value.as_text())
            .collect();
        assert_eq!(dietary, vec!["vegan", "dairy-free"]);
        assert!(
            of_kind(&signals, SignalKind::Lifestyle)
                .iter()
                .all(|s| s.key == "dietary" && s.confidence == 0.95)
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(extract_chat_signals("").is_empty());
        assert!(extract_chat_signals("just browsing around").is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let signals = extract_chat_signals("FAN OF patagonia");
        assert_eq!(signals[0].key, "patagonia");
    }

    #[test]
    fn search_infers_categories() {
        assert_eq!(infer_categories("running shoes"), vec!["clothing", "sports"]);
        assert_eq!(infer_categories("quantum widget"), vec!["general"]);

        let signals = extract_search_signals("gaming laptop", Some(1200.0));
        let interests = of_kind(&signals, SignalKind::CategoryInterest);
        assert!(interests.iter().any(|s| s.key == "electronics"));
        assert!(interests.iter().all(|s| s.confidence == 0.5));

        let ceiling = of_kind(&signals, SignalKind::BudgetSignal);
        assert_eq!(ceiling[0].key, "search_price_ceiling");
        assert_eq!(ceiling[0].value, SignalValue::Number(1200.0));
    }

    #[test]
    fn purchase_yields_high_trust_batch() {
        let product = PurchasedProduct {
            brand: Some("Patagonia".into()),
            category: Some("clothing".into()),
            price: 129.0,
            source: "rei".into(),
        };
        let signals = extract_purchase_signals(&product);
        assert_eq!(signals.len(), 4);
        assert!(signals.iter().all(|s| s.source == SignalSource::Purchase));
        assert!(signals.iter().all(|s| s.confidence >= 0.8));

        let spend = of_kind(&signals, SignalKind::BudgetSignal);
        assert_eq!(spend[0].key, "actual_spend");
        assert_eq!(spend[0].value, SignalValue::Number(129.0));
        assert_eq!(spend[0].confidence, 1.0);

        let category = of_kind(&signals, SignalKind::CategoryInterest);
        assert_eq!(category[0].value, SignalValue::Number(2.0));
    }

    #[test]
    fn purchase_without_brand_skips_brand_signal() {
        let product = PurchasedProduct {
            brand: None,
            category: None,
            price: 15.0,
            source: "amazon".into(),
        };
        let signals = extract_purchase_signals(&product);
        assert_eq!(signals.len(), 2);
        assert!(of_kind(&signals, SignalKind::BrandPreference).is_empty());
    }

    #[test]
    fn signal_wire_format_uses_snake_case_tags() {
        let sig = extract_chat_signals("I love Sony").remove(0);
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["type"], "brand_preference");
        assert_eq!(json["source"], "chat");
        assert_eq!(json["value"], 1.0);
    }
}
