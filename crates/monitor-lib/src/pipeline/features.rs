//! Feature engineering for classifier input
//!
//! Derives the engineered features the model was trained with. The
//! formulas must mirror training exactly; results are not rounded here.

use crate::models::{EngineeredFeatures, RawObservation};

/// Offset added to divisors so a zero-duration vital never divides by zero
pub const EPSILON: f64 = 1e-6;

impl EngineeredFeatures {
    /// Compute engineered features from raw vitals.
    ///
    /// Pure and total: given finite inputs, every output is finite.
    pub fn derive(obs: &RawObservation) -> Self {
        Self {
            activity_ratio: obs.walking_capacity / (obs.sleeping_duration + EPSILON),
            eating_efficiency: obs.milk_production / (obs.eating_duration + EPSILON),
            vital_sign_index: (obs.heart_rate + obs.respiratory_rate + obs.body_temperature) / 3.0,
        }
    }
}
