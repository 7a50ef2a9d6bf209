//! Signal application: how evidence becomes profile.
//!
//! Every signal kind has one update rule. Repeated evidence converges instead
//! of overwriting: brand affinity moves by an exponential moving average
//! weighted by confidence, order value by a fixed 70/30 blend, category
//! interest accumulates additively. Each applied signal also contributes a
//! small boost to the record's aggregate confidence score, which only ever
//! moves up.
//!
//! All functions here are pure over the record; persistence and per-user
//! serialization live in [`super::engine`].

use crate::persona::record::PersonaRecord;
use crate::persona::signal::{PersonaSignal, SignalKind, SignalValue};
use chrono::Utc;

/// Blend weight kept from the previous average order value.
const ORDER_VALUE_RETENTION: f64 = 0.7;

/// How far one quality-preference signal can move the spectrum.
const SPECTRUM_STEP: f64 = 0.2;

fn clamp_unit(value: f64) -> f64 {
    value.clamp(-1.0, 1.0)
}

/// Apply one signal to a record, returning its confidence boost.
fn apply_signal(record: &mut PersonaRecord, signal: &PersonaSignal) -> f64 {
    match signal.kind {
        SignalKind::BrandPreference => {
            let Some(value) = signal.value.as_number() else {
                return 0.0;
            };
            let key = signal.key.to_lowercase();
            let current = record.brand_affinities.get(&key).copied().unwrap_or(0.0);
            // Confidence-weighted moving average.
            let updated = current * (1.0 - signal.confidence) + value * signal.confidence;
            record.brand_affinities.insert(key, clamp_unit(updated));
            0.02
        }
        SignalKind::BudgetSignal => {
            // Only committed spend moves the average; stated budgets and
            // search ceilings are hints, not behavior.
            if signal.key != "actual_spend" {
                return 0.0;
            }
            let Some(value) = signal.value.as_number() else {
                return 0.0;
            };
            let previous = record.average_order_value.unwrap_or(value);
            record.average_order_value =
                Some(previous * ORDER_VALUE_RETENTION + value * (1.0 - ORDER_VALUE_RETENTION));
            0.05
        }
        SignalKind::CategoryInterest => {
            let Some(value) = signal.value.as_number() else {
                return 0.0;
            };
            let key = signal.key.to_lowercase();
            let current = record.category_interests.get(&key).copied().unwrap_or(0.0);
            let updated = (current + value * signal.confidence).max(0.0);
            record.category_interests.insert(key, updated);
            0.01
        }
        SignalKind::QualityPreference => {
            let shift = match signal.value.as_text() {
                Some("quality_focused") => SPECTRUM_STEP,
                _ => -SPECTRUM_STEP,
            };
            record.price_quality_spectrum =
                clamp_unit(record.price_quality_spectrum + shift * signal.confidence);
            0.03
        }
        SignalKind::RetailerPreference => {
            if !record.preferred_retailers.contains(&signal.key) {
                record.preferred_retailers.push(signal.key.clone());
            }
            0.01
        }
        SignalKind::Lifestyle => {
            if signal.key != "dietary" {
                return 0.0;
            }
            let Some(restriction) = signal.value.as_text() else {
                return 0.0;
            };
            if !record
                .dietary_restrictions
                .iter()
                .any(|r| r == restriction)
            {
                record.dietary_restrictions.push(restriction.to_string());
            }
            0.05
        }
    }
}

/// Merge a batch of signals into a record.
///
/// Applies every signal in order, then bumps `confidence_score` by the
/// accumulated boost (capped at 1) and stamps `last_refreshed_at`. Returns
/// the confidence delta actually applied. An empty batch is a no-op.
pub fn merge_signals(record: &mut PersonaRecord, signals: &[PersonaSignal]) -> f64 {
    if signals.is_empty() {
        return 0.0;
    }

    let boost: f64 = signals
        .iter()
        .map(|signal| apply_signal(record, signal))
        .sum();

    let before = record.confidence_score;
    record.confidence_score = (before + boost).min(1.0);
    record.last_refreshed_at = Some(Utc::now());
    record.confidence_score - before
}
