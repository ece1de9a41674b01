//! Prediction pipeline
//!
//! Raw observation in, consolidated verdict out: feature engineering,
//! categorical encoding, vector assembly, classifier call, and the rule
//! engine feeding the risk consolidator.

mod encoder;
mod features;
mod vector;

pub use encoder::{CategoryVocabulary, FALLBACK_CODE};
pub use features::EPSILON;
pub use vector::{assemble, FEATURE_ORDER};

use std::sync::Arc;

use anyhow::Result;

use crate::classifier::{Classifier, ModelArtifacts};
use crate::models::{EngineeredFeatures, RawObservation};
use crate::observability::MonitorMetrics;
use crate::rules;
use crate::verdict::{consolidate, Verdict};

/// The full per-request computation, shared immutably across requests
pub struct HealthPipeline {
    classifier: Arc<dyn Classifier>,
    breed_vocab: CategoryVocabulary,
    faecal_vocab: CategoryVocabulary,
    metrics: MonitorMetrics,
}

impl HealthPipeline {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        breed_vocab: CategoryVocabulary,
        faecal_vocab: CategoryVocabulary,
    ) -> Self {
        Self {
            classifier,
            breed_vocab,
            faecal_vocab,
            metrics: MonitorMetrics::new(),
        }
    }

    pub fn from_artifacts(artifacts: ModelArtifacts) -> Self {
        Self::new(
            Arc::new(artifacts.classifier),
            artifacts.breed_vocab,
            artifacts.faecal_vocab,
        )
    }

    pub fn model_version(&self) -> &str {
        self.classifier.model_version()
    }

    /// Run one observation through the pipeline.
    ///
    /// The rule engine runs on the raw input independently of the
    /// classifier path; only the classifier call itself can fail.
    pub fn assess(&self, obs: &RawObservation) -> Result<Verdict> {
        let engineered = EngineeredFeatures::derive(obs);

        if !self.breed_vocab.contains(&obs.breed_type) {
            self.metrics.inc_unseen_categories();
        }
        if !self.faecal_vocab.contains(&obs.faecal_consistency) {
            self.metrics.inc_unseen_categories();
        }
        let breed_code = self.breed_vocab.encode(&obs.breed_type);
        let faecal_code = self.faecal_vocab.encode(&obs.faecal_consistency);

        let feature_vector = assemble(obs, &engineered, breed_code, faecal_code);
        let classification = self.classifier.classify(&feature_vector)?;

        let findings = rules::evaluate(obs);
        self.metrics.add_rule_alerts(findings.alerts.len() as u64);

        let verdict = consolidate(&classification, &findings);
        self.metrics.inc_predictions();
        Ok(verdict)
    }
}
