//! Core data models for the health monitoring pipeline

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Number of slots in the classifier feature vector
pub const FEATURE_COUNT: usize = 16;

/// Fields that must be present in every prediction request
pub const REQUIRED_FIELDS: [&str; 13] = [
    "body_temperature",
    "breed_type",
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
    "faecal_consistency",
];

/// Request validation failures surfaced as 400 responses
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Request must be JSON")]
    NotAnObject,
    #[error("Missing features in input: {0:?}")]
    MissingFields(Vec<String>),
}

/// A single sensor reading for one animal
///
/// Numeric fields are coerced on construction: JSON numbers pass through,
/// numeric strings are parsed, anything else becomes 0.0 with a diagnostic.
#[derive(Debug, Clone)]
pub struct RawObservation {
    pub body_temperature: f64,
    pub breed_type: String,
    pub milk_production: f64,
    pub respiratory_rate: f64,
    pub walking_capacity: f64,
    pub sleeping_duration: f64,
    pub body_condition_score: f64,
    pub heart_rate: f64,
    pub eating_duration: f64,
    pub lying_down_duration: f64,
    pub ruminating: f64,
    pub rumen_fill: f64,
    pub faecal_consistency: String,
    pub cattle_id: Option<String>,
}

impl RawObservation {
    /// Validate field presence and build an observation from a JSON body.
    ///
    /// The 13 required fields must all exist; their values are then coerced
    /// individually so a single malformed vital never rejects the request.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| !obj.contains_key(**field))
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        Ok(Self {
            body_temperature: numeric_field(obj, "body_temperature"),
            breed_type: string_field(obj, "breed_type"),
            milk_production: numeric_field(obj, "milk_production"),
            respiratory_rate: numeric_field(obj, "respiratory_rate"),
            walking_capacity: numeric_field(obj, "walking_capacity"),
            sleeping_duration: numeric_field(obj, "sleeping_duration"),
            body_condition_score: numeric_field(obj, "body_condition_score"),
            heart_rate: numeric_field(obj, "heart_rate"),
            eating_duration: numeric_field(obj, "eating_duration"),
            lying_down_duration: numeric_field(obj, "lying_down_duration"),
            ruminating: numeric_field(obj, "ruminating"),
            rumen_fill: numeric_field(obj, "rumen_fill"),
            faecal_consistency: string_field(obj, "faecal_consistency"),
            cattle_id: obj
                .get("cattle_id")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }
}

/// Coerce a JSON value into a finite f64, defaulting to 0.0.
fn numeric_field(obj: &Map<String, Value>, field: &str) -> f64 {
    let value = match obj.get(field) {
        Some(v) => v,
        None => return 0.0,
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v,
        _ => {
            warn!(field = %field, value = %value, "Unparseable numeric field, coercing to 0");
            0.0
        }
    }
}

fn string_field(obj: &Map<String, Value>, field: &str) -> String {
    match obj.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Derived numeric features computed from raw vitals
#[derive(Debug, Clone, PartialEq)]
pub struct EngineeredFeatures {
    pub activity_ratio: f64,
    pub eating_efficiency: f64,
    pub vital_sign_index: f64,
}

/// Fixed-width numeric vector in the classifier's training order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(pub [f32; FEATURE_COUNT]);

impl FeatureVector {
    pub fn values(&self) -> &[f32; FEATURE_COUNT] {
        &self.0
    }
}
