//! Profile rendering: persona record → prompt context block.
//!
//! Pure and read-only. Emits only populated fields, highest-leverage first,
//! as plain `**Label:** value` lines under a `## User Profile` heading — the
//! block is concatenated straight into a system prompt, so there is nothing
//! to escape beyond not emitting control characters.

use crate::persona::record::PersonaRecord;

/// Affinity above which a brand counts as preferred.
const PREFERRED_BRAND_THRESHOLD: f64 = 0.3;

/// Affinity below which a brand counts as avoided.
const AVOIDED_BRAND_THRESHOLD: f64 = -0.3;

/// How many category interests the profile block lists.
const TOP_INTERESTS: usize = 5;

/// Human label for an aggregate confidence score.
pub fn confidence_label(score: f64) -> &'static str {
    if score < 0.2 {
        "Just getting to know you"
    } else if score < 0.4 {
        "Learning your preferences"
    } else if score < 0.6 {
        "Getting a good sense of your style"
    } else if score < 0.8 {
        "Know your preferences well"
    } else {
        "Highly personalized"
    }
}

/// Five-bucket discretization of the continuous price/quality spectrum.
pub fn price_quality_label(spectrum: f64) -> &'static str {
    if spectrum < -0.5 {
        "Strongly price-focused"
    } else if spectrum < -0.1 {
        "Leans toward value"
    } else if spectrum < 0.1 {
        "Balanced price/quality"
    } else if spectrum < 0.5 {
        "Leans toward quality"
    } else {
        "Strongly quality-focused"
    }
}

/// Render a record as a prompt-injectable profile block.
pub fn render_persona(record: &PersonaRecord) -> String {
    let mut sections = vec![format!(
        "## User Profile (Confidence: {}% — {})",
        (record.confidence_score * 100.0).round() as i64,
        confidence_label(record.confidence_score),
    )];

    // Identity
    let identity: Vec<&str> = [&record.country, &record.locale, &record.currency]
        .iter()
        .filter_map(|field| field.as_deref())
        .collect();
    if !identity.is_empty() {
        sections.push(format!("**Location & Currency:** {}", identity.join(", ")));
    }

    // Spend
    if let Some(aov) = record.average_order_value {
        sections.push(format!(
            "**Average spend:** {} {aov:.0}",
            record.currency.as_deref().unwrap_or("USD"),
        ));
    }
    if !record.budget_ranges.is_empty() {
        let ranges: Vec<String> = record
            .budget_ranges
            .iter()
            .map(|(category, range)| {
                format!("{category}: {} {}-{}", range.currency, range.min, range.max)
            })
            .collect();
        sections.push(format!("**Budget ranges:** {}", ranges.join(", ")));
    }

    // Price vs quality
    sections.push(format!(
        "**Price/Quality preference:** {}",
        price_quality_label(record.price_quality_spectrum),
    ));

    // Brand affinities
    if !record.brand_affinities.is_empty() {
        let preferred: Vec<&str> = record
            .brand_affinities
            .iter()
            .filter(|(_, score)| **score > PREFERRED_BRAND_THRESHOLD)
            .map(|(brand, _)| brand.as_str())
            .collect();
        let avoided: Vec<&str> = record
            .brand_affinities
            .iter()
            .filter(|(_, score)| **score < AVOIDED_BRAND_THRESHOLD)
            .map(|(brand, _)| brand.as_str())
            .collect();

        if !preferred.is_empty() {
            sections.push(format!("**Preferred brands:** {}", preferred.join(", ")));
        }
        if !avoided.is_empty() {
            sections.push(format!("**Avoided brands:** {}", avoided.join(", ")));
        }
    }

    // Category interests, strongest first
    if !record.category_interests.is_empty() {
        let mut interests: Vec<(&String, &f64)> = record.category_interests.iter().collect();
        interests.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
        let top: Vec<&str> = interests
            .iter()
            .take(TOP_INTERESTS)
            .map(|(category, _)| category.as_str())
            .collect();
        sections.push(format!("**Top interests:** {}", top.join(", ")));
    }

    // Retailers & lifestyle
    if !record.preferred_retailers.is_empty() {
        sections.push(format!(
            "**Preferred stores:** {}",
            record.preferred_retailers.join(", ")
        ));
    }
    if !record.dietary_restrictions.is_empty() {
        sections.push(format!(
            "**Dietary:** {}",
            record.dietary_restrictions.join(", ")
        ));
    }
    if !record.hobbies.is_empty() {
        sections.push(format!("**Hobbies:** {}", record.hobbies.join(", ")));
    }

    sections.join("\n")
}
