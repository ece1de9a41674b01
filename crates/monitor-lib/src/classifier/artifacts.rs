//! Model artifact loading
//!
//! Loads the classifier and its preprocessing companions from an
//! artifacts directory at startup. Any missing or malformed artifact is
//! fatal: the service must not serve predictions with a partial model.
//!
//! Expected layout:
//! - `model.onnx`  — the trained classifier, input `[1, 16]` f32
//! - `scaler.json` — per-slot standard-scaler mean/scale arrays
//! - `labels.json` — ordered class lists for health status and the two
//!   categorical vitals

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::OnnxClassifier;
use crate::models::FEATURE_COUNT;
use crate::pipeline::CategoryVocabulary;

/// Standard-scaler parameters fitted at training time
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl ScalerParams {
    fn validate(&self) -> Result<()> {
        if self.mean.len() != FEATURE_COUNT || self.scale.len() != FEATURE_COUNT {
            bail!(
                "Scaler has {} mean / {} scale entries, expected {}",
                self.mean.len(),
                self.scale.len(),
                FEATURE_COUNT
            );
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct LabelFile {
    health_status: Vec<String>,
    breed_type: Vec<String>,
    faecal_consistency: Vec<String>,
}

/// Everything loaded from the artifacts directory, immutable after load
#[derive(Debug)]
pub struct ModelArtifacts {
    pub classifier: OnnxClassifier,
    pub breed_vocab: CategoryVocabulary,
    pub faecal_vocab: CategoryVocabulary,
}

impl ModelArtifacts {
    /// Load and validate all artifacts. Errors abort startup.
    pub fn load(dir: &Path) -> Result<Self> {
        let scaler_path = dir.join("scaler.json");
        let scaler: ScalerParams = serde_json::from_slice(
            &fs::read(&scaler_path)
                .with_context(|| format!("Failed to read {}", scaler_path.display()))?,
        )
        .with_context(|| format!("Failed to parse {}", scaler_path.display()))?;
        scaler.validate()?;

        let labels_path = dir.join("labels.json");
        let labels: LabelFile = serde_json::from_slice(
            &fs::read(&labels_path)
                .with_context(|| format!("Failed to read {}", labels_path.display()))?,
        )
        .with_context(|| format!("Failed to parse {}", labels_path.display()))?;

        if labels.health_status.is_empty() {
            bail!("labels.json has no health_status classes");
        }
        if labels.breed_type.is_empty() || labels.faecal_consistency.is_empty() {
            bail!("labels.json is missing categorical vocabularies");
        }

        let model_path = dir.join("model.onnx");
        let model_bytes = fs::read(&model_path)
            .with_context(|| format!("Failed to read {}", model_path.display()))?;
        let classifier = OnnxClassifier::new(&model_bytes, scaler, labels.health_status)?;

        Ok(Self {
            classifier,
            breed_vocab: CategoryVocabulary::new("breed_type", labels.breed_type),
            faecal_vocab: CategoryVocabulary::new("faecal_consistency", labels.faecal_consistency),
        })
    }
}
