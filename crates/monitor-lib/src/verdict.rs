//! Risk consolidation
//!
//! Merges classifier output with rule-engine findings into one verdict.
//! The policy is escalation-only: rule-triggered symptoms can raise the
//! reported risk and status but never lower what the classifier implied,
//! and vice versa.

use std::collections::BTreeMap;

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classifier::Classification;
use crate::rules::{Alert, RuleFindings, Severity};

/// Reported risk, ordered ascending for monotonic escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    #[serde(rename = "Low-Medium")]
    LowMedium,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::LowMedium => write!(f, "Low-Medium"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
            RiskLevel::Critical => write!(f, "Critical"),
        }
    }
}

/// Overall health status reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Observation,
}

impl HealthStatus {
    /// Map the classifier's predicted label. The trained vocabulary is
    /// binary, so anything that is not "healthy" reads as unhealthy.
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("healthy") {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "Healthy"),
            HealthStatus::Unhealthy => write!(f, "Unhealthy"),
            HealthStatus::Observation => write!(f, "Observation"),
        }
    }
}

/// Consolidated assessment for one observation
#[derive(Debug, Clone)]
pub struct Verdict {
    pub health_status: HealthStatus,
    pub risk_level: RiskLevel,
    /// Maximum class probability as a percentage
    pub confidence_pct: f64,
    pub predicted_class: String,
    /// Per-class probabilities as percentages, rounded to 2 decimals
    pub probabilities: BTreeMap<String, f64>,
    pub diseases: Vec<String>,
    pub alerts: Vec<Alert>,
    pub abnormal_indicators: usize,
}

/// Merge classifier output and rule findings into a [`Verdict`].
///
/// Step 1 derives the baseline from the classifier alone. Step 2 scans
/// the severity-sorted alerts and only ever escalates: the first Critical
/// alert forces Critical/Unhealthy and terminates the scan.
pub fn consolidate(classification: &Classification, findings: &RuleFindings) -> Verdict {
    let confidence_pct = classification
        .probabilities
        .values()
        .fold(0.0f64, |acc, p| acc.max(*p))
        * 100.0;

    let mut health_status = HealthStatus::from_label(&classification.label);
    let mut risk_level = if classification.label.eq_ignore_ascii_case("unhealthy") {
        if confidence_pct > 80.0 {
            RiskLevel::High
        } else if confidence_pct > 50.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::LowMedium
        }
    } else {
        RiskLevel::Low
    };

    if !findings.diseases.is_empty() {
        for alert in &findings.alerts {
            match alert.severity {
                Severity::Critical => {
                    risk_level = RiskLevel::Critical;
                    health_status = HealthStatus::Unhealthy;
                    break;
                }
                Severity::High if risk_level < RiskLevel::Critical => {
                    if risk_level < RiskLevel::High {
                        risk_level = RiskLevel::High;
                    }
                    if health_status == HealthStatus::Healthy {
                        health_status = HealthStatus::Unhealthy;
                    }
                }
                Severity::Medium if risk_level < RiskLevel::High => {
                    if risk_level < RiskLevel::Medium {
                        risk_level = RiskLevel::Medium;
                    }
                    if health_status == HealthStatus::Healthy {
                        health_status = HealthStatus::Observation;
                    }
                }
                _ => {}
            }
        }
    }

    let probabilities = classification
        .probabilities
        .iter()
        .map(|(label, p)| (label.clone(), round2(*p * 100.0)))
        .collect();

    Verdict {
        health_status,
        risk_level,
        confidence_pct,
        predicted_class: classification.label.clone(),
        probabilities,
        diseases: findings.diseases.clone(),
        alerts: findings.alerts.clone(),
        abnormal_indicators: findings.abnormal_indicators,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Headline assessment block of the response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringResults {
    pub health_status: HealthStatus,
    pub confidence: String,
    pub risk_level: RiskLevel,
}

/// Raw classifier detail block of the response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionDetail {
    pub predicted_class: String,
    pub prediction_probabilities: BTreeMap<String, f64>,
}

/// Full response document, also the unit persisted to the verdict store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionDocument {
    pub cattle_id: String,
    pub timestamp: String,
    pub monitoring_results: MonitoringResults,
    pub ml_predictions_detail: PredictionDetail,
    pub specific_diseases_detected: Vec<String>,
    pub alerts: Vec<Alert>,
    pub input_data_snapshot: Value,
}

impl Verdict {
    /// Assemble the response document, stamping server-local time.
    pub fn into_document(self, cattle_id: Option<&str>, snapshot: Value) -> PredictionDocument {
        PredictionDocument {
            cattle_id: cattle_id.unwrap_or("Unknown").to_string(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            monitoring_results: MonitoringResults {
                health_status: self.health_status,
                confidence: format!("{:.2}%", self.confidence_pct),
                risk_level: self.risk_level,
            },
            ml_predictions_detail: PredictionDetail {
                predicted_class: self.predicted_class,
                prediction_probabilities: self.probabilities,
            },
            specific_diseases_detected: self.diseases,
            alerts: self.alerts,
            input_data_snapshot: snapshot,
        }
    }
}
