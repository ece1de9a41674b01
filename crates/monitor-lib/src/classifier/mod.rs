//! Classifier adapter
//!
//! The pipeline consumes the trained model only through the narrow
//! [`Classifier`] trait, so the core logic stays decoupled from the
//! inference library and tests can inject stubs.

mod artifacts;
mod inference;

pub use artifacts::{ModelArtifacts, ScalerParams};
pub use inference::OnnxClassifier;

use std::collections::BTreeMap;

use anyhow::Result;

use crate::models::FeatureVector;

/// One classifier invocation result
#[derive(Debug, Clone)]
pub struct Classification {
    /// Predicted class label, e.g. "healthy" or "unhealthy"
    pub label: String,
    /// Per-class probabilities in [0, 1]
    pub probabilities: BTreeMap<String, f64>,
}

/// Trait for health classification implementations
pub trait Classifier: Send + Sync {
    /// Classify a feature vector into a label with class probabilities
    fn classify(&self, vector: &FeatureVector) -> Result<Classification>;

    /// Version identifier of the loaded model
    fn model_version(&self) -> &str;
}
