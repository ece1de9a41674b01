//! Threshold rules for symptom-level disease detection
//!
//! Each rule is evaluated unconditionally against the raw observation;
//! rules never short-circuit each other. All cutoffs are strict
//! comparisons, matching the veterinary reference thresholds the rules
//! were calibrated with.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::RawObservation;

/// Alert severity, ordered ascending so `Ord` matches the escalation scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn ordinal(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

/// A single rule-triggered symptom flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub symptom: String,
    pub value: Value,
    pub message: String,
    pub severity: Severity,
    pub rule_triggered: String,
}

impl Alert {
    fn new(
        symptom: &str,
        value: Value,
        message: String,
        severity: Severity,
        rule_triggered: &str,
    ) -> Self {
        Self {
            symptom: symptom.to_string(),
            value,
            message,
            severity,
            rule_triggered: rule_triggered.to_string(),
        }
    }
}

/// Output of one rule-engine pass over an observation
#[derive(Debug, Clone, Default)]
pub struct RuleFindings {
    /// Deduplicated disease labels, in first-detection order
    pub diseases: Vec<String>,
    /// Alerts deduplicated by message and sorted by severity descending
    pub alerts: Vec<Alert>,
    /// Count of individual symptom flags before deduplication
    pub abnormal_indicators: usize,
}

mod thresholds {
    pub const BODY_TEMP_HIGH_RESPIRATORY: f64 = 39.5;
    pub const RESPIRATORY_RATE_HIGH_RESPIRATORY: f64 = 40.0;
    pub const MILK_PRODUCTION_LOW: f64 = 8.0;
    pub const BCS_LOW_REPRODUCTIVE: f64 = 2.5;
    pub const HEART_RATE_HIGH_REPRODUCTIVE: f64 = 80.0;
    pub const WALKING_CAPACITY_LOW: f64 = 9000.0;
    pub const BODY_TEMP_HIGH_SYSTEMIC: f64 = 39.8;
    pub const HEART_RATE_HIGH_SYSTEMIC: f64 = 80.0;
    pub const RESPIRATORY_RATE_HIGH_SYSTEMIC: f64 = 42.0;

    pub const FAECAL_ABNORMAL: [&str; 4] = [
        "watery",
        "black faece",
        "fresh blood in faeces",
        "very liquid faeces",
    ];
}

/// Evaluate all threshold rules against one observation.
///
/// Pure: no side effects, no ordering dependence between rules. Returned
/// alerts are deduplicated by exact message text (first occurrence kept)
/// and stable-sorted by severity descending, so ties keep rule order.
pub fn evaluate(obs: &RawObservation) -> RuleFindings {
    fn detect(disease: &str, diseases: &mut Vec<String>) {
        if !diseases.iter().any(|d| d == disease) {
            diseases.push(disease.to_string());
        }
    }

    let mut diseases: Vec<String> = Vec::new();
    let mut alerts: Vec<Alert> = Vec::new();
    let mut abnormal_indicators = 0usize;

    // Respiratory disease
    if obs.body_temperature > thresholds::BODY_TEMP_HIGH_RESPIRATORY
        && obs.respiratory_rate > thresholds::RESPIRATORY_RATE_HIGH_RESPIRATORY
    {
        detect("Respiratory Disease", &mut diseases);
        alerts.push(Alert::new(
            "body_temperature",
            num_value(obs.body_temperature),
            format!("High body temperature detected ({}°C)!", obs.body_temperature),
            Severity::Medium,
            "Respiratory_Temp",
        ));
        alerts.push(Alert::new(
            "respiratory_rate",
            num_value(obs.respiratory_rate),
            format!(
                "High respiratory rate detected ({} breaths/min)!",
                obs.respiratory_rate
            ),
            Severity::Medium,
            "Respiratory_Rate",
        ));
        abnormal_indicators += 2;
    }

    // Gastrointestinal disease
    let faecal = obs.faecal_consistency.to_lowercase();
    if thresholds::FAECAL_ABNORMAL.contains(&faecal.as_str()) {
        detect("Gastrointestinal Disease", &mut diseases);
        alerts.push(Alert::new(
            "faecal_consistency",
            Value::String(obs.faecal_consistency.clone()),
            format!(
                "Abnormal faecal consistency detected ({})!",
                obs.faecal_consistency
            ),
            Severity::High,
            "GI_Feces",
        ));
        abnormal_indicators += 1;
    }

    // Udder health
    if obs.milk_production < thresholds::MILK_PRODUCTION_LOW {
        detect("Udder Health Issue", &mut diseases);
        alerts.push(Alert::new(
            "milk_production",
            num_value(obs.milk_production),
            format!(
                "Very low milk production detected ({} L/day)!",
                obs.milk_production
            ),
            Severity::Medium,
            "Udder_MilkProd",
        ));
        abnormal_indicators += 1;
    }

    // Reproductive disease
    if obs.body_condition_score < thresholds::BCS_LOW_REPRODUCTIVE
        && obs.heart_rate > thresholds::HEART_RATE_HIGH_REPRODUCTIVE
    {
        detect("Reproductive Disease", &mut diseases);
        alerts.push(Alert::new(
            "body_condition_score",
            num_value(obs.body_condition_score),
            format!(
                "Low body condition score detected ({})!",
                obs.body_condition_score
            ),
            Severity::Medium,
            "Reproductive_BCS",
        ));
        alerts.push(Alert::new(
            "heart_rate",
            num_value(obs.heart_rate),
            format!("High heart rate detected ({} bpm)!", obs.heart_rate),
            Severity::Medium,
            "Reproductive_HR",
        ));
        abnormal_indicators += 2;
    }

    // Musculoskeletal issue
    if obs.walking_capacity < thresholds::WALKING_CAPACITY_LOW {
        detect("Lameness / Musculoskeletal Issue", &mut diseases);
        alerts.push(Alert::new(
            "walking_capacity",
            num_value(obs.walking_capacity),
            format!(
                "Low walking capacity detected ({} steps/day)!",
                obs.walking_capacity
            ),
            Severity::High,
            "Musculoskeletal_Walking",
        ));
        abnormal_indicators += 1;
    }

    // Systemic infection
    if obs.body_temperature > thresholds::BODY_TEMP_HIGH_SYSTEMIC
        && obs.heart_rate > thresholds::HEART_RATE_HIGH_SYSTEMIC
        && obs.respiratory_rate > thresholds::RESPIRATORY_RATE_HIGH_SYSTEMIC
    {
        detect("Systemic Infection", &mut diseases);
        alerts.push(Alert::new(
            "body_temperature",
            num_value(obs.body_temperature),
            format!(
                "Critically high body temperature detected ({}°C)!",
                obs.body_temperature
            ),
            Severity::Critical,
            "Systemic_Temp",
        ));
        alerts.push(Alert::new(
            "heart_rate",
            num_value(obs.heart_rate),
            format!("Critically high heart rate detected ({} bpm)!", obs.heart_rate),
            Severity::Critical,
            "Systemic_HR",
        ));
        alerts.push(Alert::new(
            "respiratory_rate",
            num_value(obs.respiratory_rate),
            format!(
                "Critically high respiratory rate detected ({} breaths/min)!",
                obs.respiratory_rate
            ),
            Severity::Critical,
            "Systemic_RR",
        ));
        abnormal_indicators += 3;
    }

    let mut seen = HashSet::new();
    alerts.retain(|alert| seen.insert(alert.message.clone()));
    // sort_by is stable, so equal severities keep rule-evaluation order
    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));

    RuleFindings {
        diseases,
        alerts,
        abnormal_indicators,
    }
}

/// Serialize a vital as an integer when it is whole, mirroring the JSON
/// types callers typically send.
fn num_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}
