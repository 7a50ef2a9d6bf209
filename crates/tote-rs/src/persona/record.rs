//! The durable persona document and its non-signal mutation paths.
//!
//! A [`PersonaRecord`] is one user's shopping profile: identity scalars,
//! accumulated affinity maps, lifestyle lists, and a confidence meta score.
//! It is created lazily (first onboarding submission or first signal-bearing
//! interaction), mutated by the merge rules in [`super::merge`] or by an
//! explicit user edit, and destroyed only by the external account-deletion
//! flow.
//!
//! Serialized field names are camelCase so stored JSON matches the documents
//! the rest of the product reads and writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-category budget window.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
}

/// A user's durable shopping profile.
///
/// Invariants maintained by the mutation paths:
/// - `price_quality_spectrum` and every brand affinity stay in `[-1, 1]`;
/// - category interest scores stay `>= 0`;
/// - map keys are case-normalized (lowercase);
/// - `confidence_score` never decreases except through an explicit reset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonaRecord {
    // Identity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub household_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub life_stage: Option<String>,

    // Shopping DNA
    /// −1 (pure price) to 1 (pure quality).
    pub price_quality_spectrum: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_order_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_responsiveness: Option<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub brand_affinities: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub category_interests: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub budget_ranges: BTreeMap<String, BudgetRange>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub size_data: BTreeMap<String, String>,

    // Lifestyle & behavior
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preferred_retailers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dietary_restrictions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hobbies: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub upcoming_needs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_patterns: Vec<String>,

    // Meta
    pub confidence_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl PersonaRecord {
    /// Neutral starting record for a user we know nothing about.
    pub fn neutral() -> Self {
        Self {
            locale: Some("en".into()),
            currency: Some("USD".into()),
            price_quality_spectrum: 0.0,
            ..Self::default()
        }
    }

    /// Seed a record from onboarding answers.
    pub fn from_onboarding(answers: &OnboardingAnswers) -> Self {
        let mut record = Self::neutral();

        // Quality-vs-price slider (1-5) maps linearly onto the spectrum.
        if let Some(q) = answers.quality_vs_price {
            record.price_quality_spectrum = (f64::from(q) - 3.0) / 2.0;
        }

        record.household_size = answers.household.as_deref().map(|h| match h {
            "living-alone" => 1,
            "couple" => 2,
            "shared" => 3,
            "family" => 4,
            _ => 1,
        });

        for brand in answers
            .brands
            .split(',')
            .map(str::trim)
            .filter(|b| !b.is_empty())
        {
            record.brand_affinities.insert(brand.to_lowercase(), 0.8);
        }

        for category in &answers.categories {
            record.category_interests.insert(category.to_lowercase(), 1.0);
        }

        record.preferred_retailers = answers.retailers.clone();

        record.average_order_value = answers.budget_range.as_deref().and_then(|b| match b {
            "under-50" => Some(30.0),
            "50-200" => Some(125.0),
            "200-500" => Some(350.0),
            "500+" => Some(750.0),
            _ => None,
        });

        record
    }
}

/// Raw answers from the onboarding questionnaire.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingAnswers {
    /// One of `under-50`, `50-200`, `200-500`, `500+`.
    pub budget_range: Option<String>,
    pub categories: Vec<String>,
    /// Comma-separated brand names.
    pub brands: String,
    /// 1 (pure price) to 5 (pure quality).
    pub quality_vs_price: Option<u8>,
    /// One of `living-alone`, `couple`, `shared`, `family`.
    pub household: Option<String>,
    pub retailers: Vec<String>,
}

// ── User edits ─────────────────────────────────────────────────────

/// An explicit profile edit from the user.
///
/// Primitives overwrite, map entries shallow-merge (`None` deletes the key),
/// arrays are replaced wholesale. Edits never touch `confidence_score`.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonaEdit {
    pub locale: Option<String>,
    pub currency: Option<String>,
    pub country: Option<String>,
    pub household_size: Option<u32>,
    pub life_stage: Option<String>,
    pub price_quality_spectrum: Option<f64>,
    pub average_order_value: Option<f64>,
    pub promotion_responsiveness: Option<f64>,

    pub brand_affinities: Option<BTreeMap<String, Option<f64>>>,
    pub category_interests: Option<BTreeMap<String, Option<f64>>>,
    pub budget_ranges: Option<BTreeMap<String, Option<BudgetRange>>>,
    pub size_data: Option<BTreeMap<String, Option<String>>>,

    pub preferred_retailers: Option<Vec<String>>,
    pub dietary_restrictions: Option<Vec<String>>,
    pub hobbies: Option<Vec<String>>,
    pub upcoming_needs: Option<Vec<String>>,
    pub search_patterns: Option<Vec<String>>,
}

fn merge_map<V: Clone>(target: &mut BTreeMap<String, V>, edits: &BTreeMap<String, Option<V>>) {
    for (key, value) in edits {
        let key = key.to_lowercase();
        match value {
            Some(v) => {
                target.insert(key, v.clone());
            }
            None => {
                target.remove(&key);
            }
        }
    }
}

/// Apply a user edit to a record.
///
/// The spectrum is clamped after an overwrite so an out-of-range client
/// value can't break the record invariant.
pub fn apply_edit(record: &mut PersonaRecord, edit: &PersonaEdit) {
    if edit.locale.is_some() {
        record.locale = edit.locale.clone();
    }
    if edit.currency.is_some() {
        record.currency = edit.currency.clone();
    }
    if edit.country.is_some() {
        record.country = edit.country.clone();
    }
    if edit.household_size.is_some() {
        record.household_size = edit.household_size;
    }
    if edit.life_stage.is_some() {
        record.life_stage = edit.life_stage.clone();
    }
    if let Some(pq) = edit.price_quality_spectrum {
        record.price_quality_spectrum = pq.clamp(-1.0, 1.0);
    }
    if edit.average_order_value.is_some() {
        record.average_order_value = edit.average_order_value;
    }
    if edit.promotion_responsiveness.is_some() {
        record.promotion_responsiveness = edit.promotion_responsiveness;
    }

    if let Some(edits) = &edit.brand_affinities {
        merge_map(&mut record.brand_affinities, edits);
        for score in record.brand_affinities.values_mut() {
            *score = score.clamp(-1.0, 1.0);
        }
    }
    if let Some(edits) = &edit.category_interests {
        merge_map(&mut record.category_interests, edits);
        for score in record.category_interests.values_mut() {
            *score = score.max(0.0);
        }
    }
    if let Some(edits) = &edit.budget_ranges {
        merge_map(&mut record.budget_ranges, edits);
    }
    if let Some(edits) = &edit.size_data {
        merge_map(&mut record.size_data, edits);
    }

    if let Some(retailers) = &edit.preferred_retailers {
        record.preferred_retailers = retailers.clone();
    }
    if let Some(dietary) = &edit.dietary_restrictions {
        record.dietary_restrictions = dietary.clone();
    }
    if let Some(hobbies) = &edit.hobbies {
        record.hobbies = hobbies.clone();
    }
    if let Some(needs) = &edit.upcoming_needs {
        record.upcoming_needs = needs.clone();
    }
    if let Some(patterns) = &edit.search_patterns {
        record.search_patterns = patterns.clone();
    }
}
