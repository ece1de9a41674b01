//! Library for the livestock health monitoring service
//!
//! This crate provides the core functionality for:
//! - Request validation and feature engineering
//! - Categorical encoding against trained vocabularies
//! - Classifier feature-vector assembly and ONNX inference
//! - Rule-based disease detection
//! - Risk consolidation into a single verdict
//! - Verdict persistence, health checks, and observability

pub mod classifier;
pub mod health;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod rules;
pub mod store;
pub mod verdict;

pub use classifier::{Classification, Classifier, ModelArtifacts, OnnxClassifier};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::{RawObservation, ValidationError, FEATURE_COUNT, REQUIRED_FIELDS};
pub use observability::{MonitorMetrics, StructuredLogger};
pub use pipeline::{CategoryVocabulary, HealthPipeline};
pub use rules::{Alert, RuleFindings, Severity};
pub use store::{HttpVerdictStore, VerdictKey, VerdictStore, ANONYMOUS_USER};
pub use verdict::{HealthStatus, PredictionDocument, RiskLevel, Verdict};
