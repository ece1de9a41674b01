//! Feature vector assembly
//!
//! Builds the fixed-order numeric vector the classifier consumes. This is
//! the compatibility seam with the trained model: slot order and semantics
//! must reproduce the training columns exactly, so the order lives in one
//! place and is pinned by tests.

use crate::models::{EngineeredFeatures, FeatureVector, RawObservation, FEATURE_COUNT};
use tracing::warn;

/// Canonical training-time column order for the classifier input
pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "body_temperature",
    "breed_type_enc",
    "milk_production",
    "respiratory_rate",
    "walking_capacity",
    "sleeping_duration",
    "body_condition_score",
    "heart_rate",
    "eating_duration",
    "lying_down_duration",
    "ruminating",
    "rumen_fill",
    "faecal_consistency_enc",
    "activity_ratio",
    "eating_efficiency",
    "vital_sign_index",
];

/// Assemble the classifier input vector in canonical slot order.
///
/// Every slot is coerced to a finite number; an unresolvable name or a
/// non-finite value becomes 0.0 with a diagnostic so NaN never reaches
/// the model.
pub fn assemble(
    obs: &RawObservation,
    engineered: &EngineeredFeatures,
    breed_code: usize,
    faecal_code: usize,
) -> FeatureVector {
    let mut values = [0.0f32; FEATURE_COUNT];
    for (slot, name) in FEATURE_ORDER.iter().enumerate() {
        let raw = match resolve(name, obs, engineered, breed_code, faecal_code) {
            Some(v) => v,
            None => {
                warn!(feature = %name, "Feature not resolvable, using default 0");
                0.0
            }
        };
        if raw.is_finite() {
            values[slot] = raw as f32;
        } else {
            warn!(feature = %name, "Non-finite feature value, using default 0");
        }
    }
    FeatureVector(values)
}

fn resolve(
    name: &str,
    obs: &RawObservation,
    engineered: &EngineeredFeatures,
    breed_code: usize,
    faecal_code: usize,
) -> Option<f64> {
    let value = match name {
        "body_temperature" => obs.body_temperature,
        "breed_type_enc" => breed_code as f64,
        "milk_production" => obs.milk_production,
        "respiratory_rate" => obs.respiratory_rate,
        "walking_capacity" => obs.walking_capacity,
        "sleeping_duration" => obs.sleeping_duration,
        "body_condition_score" => obs.body_condition_score,
        "heart_rate" => obs.heart_rate,
        "eating_duration" => obs.eating_duration,
        "lying_down_duration" => obs.lying_down_duration,
        "ruminating" => obs.ruminating,
        "rumen_fill" => obs.rumen_fill,
        "faecal_consistency_enc" => faecal_code as f64,
        "activity_ratio" => engineered.activity_ratio,
        "eating_efficiency" => engineered.eating_efficiency,
        "vital_sign_index" => engineered.vital_sign_index,
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation() -> RawObservation {
        RawObservation {
            body_temperature: 38.5,
            breed_type: "Holstein".to_string(),
            milk_production: 22.0,
            respiratory_rate: 30.0,
            walking_capacity: 12000.0,
            sleeping_duration: 6.0,
            body_condition_score: 3.5,
            heart_rate: 60.0,
            eating_duration: 4.0,
            lying_down_duration: 10.0,
            ruminating: 6.0,
            rumen_fill: 3.0,
            faecal_consistency: "ideal".to_string(),
            cattle_id: None,
        }
    }

    #[test]
    fn test_canonical_order_is_pinned() {
        // The classifier was trained against exactly this column order.
        // If this test fails, predictions are silently wrong.
        assert_eq!(
            FEATURE_ORDER,
            [
                "body_temperature",
                "breed_type_enc",
                "milk_production",
                "respiratory_rate",
                "walking_capacity",
                "sleeping_duration",
                "body_condition_score",
                "heart_rate",
                "eating_duration",
                "lying_down_duration",
                "ruminating",
                "rumen_fill",
                "faecal_consistency_enc",
                "activity_ratio",
                "eating_efficiency",
                "vital_sign_index",
            ]
        );
    }

    #[test]
    fn test_vector_has_sixteen_slots_in_order() {
        let obs = observation();
        let engineered = EngineeredFeatures::derive(&obs);
        let vector = assemble(&obs, &engineered, 1, 2);
        let v = vector.values();

        assert_eq!(v.len(), FEATURE_COUNT);
        assert_eq!(v[0], 38.5);
        assert_eq!(v[1], 1.0); // breed_type_enc
        assert_eq!(v[2], 22.0);
        assert_eq!(v[12], 2.0); // faecal_consistency_enc
        assert!((v[13] - engineered.activity_ratio as f32).abs() < 1e-3);
        assert!((v[14] - engineered.eating_efficiency as f32).abs() < 1e-3);
        assert!((v[15] - engineered.vital_sign_index as f32).abs() < 1e-3);
    }

    #[test]
    fn test_non_finite_values_become_zero() {
        let obs = observation();
        let engineered = EngineeredFeatures {
            activity_ratio: f64::NAN,
            eating_efficiency: f64::INFINITY,
            vital_sign_index: 42.0,
        };
        let vector = assemble(&obs, &engineered, 0, 0);
        assert_eq!(vector.values()[13], 0.0);
        assert_eq!(vector.values()[14], 0.0);
        assert_eq!(vector.values()[15], 42.0);
    }
}
