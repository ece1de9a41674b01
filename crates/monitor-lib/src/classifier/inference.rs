//! ONNX inference using tract
//!
//! Runs the trained health classifier via tract-onnx. The model takes the
//! standard-scaled 16-slot feature vector and returns one probability per
//! health class.

use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::{Context, Result};
use tract_onnx::prelude::*;
use tracing::{debug, warn};

use super::{Classification, Classifier, ScalerParams};
use crate::models::{FeatureVector, FEATURE_COUNT};

/// Inference latency target before a warning is logged
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Classifier backed by a tract-optimized ONNX model
#[derive(Debug)]
pub struct OnnxClassifier {
    model: TractModel,
    scaler: ScalerParams,
    health_labels: Vec<String>,
    version: String,
}

impl OnnxClassifier {
    /// Build a classifier from raw ONNX bytes and its fitted scaler.
    pub fn new(
        model_bytes: &[u8],
        scaler: ScalerParams,
        health_labels: Vec<String>,
    ) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, FEATURE_COUNT]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;

        Ok(Self {
            model,
            scaler,
            health_labels,
            version: "v1".to_string(),
        })
    }

    /// Apply the training-time standard scaler to the assembled vector.
    fn scale(&self, vector: &FeatureVector) -> Vec<f32> {
        standardize(vector.values(), &self.scaler)
    }
}

/// Standard-scale values using fitted mean/scale, guarding zero scales.
fn standardize(values: &[f32; FEATURE_COUNT], scaler: &ScalerParams) -> Vec<f32> {
    values
        .iter()
        .zip(scaler.mean.iter().zip(scaler.scale.iter()))
        .map(|(v, (mean, scale))| {
            let divisor = if *scale == 0.0 { 1.0 } else { *scale };
            (v - mean) / divisor
        })
        .collect()
}

impl Classifier for OnnxClassifier {
    fn classify(&self, vector: &FeatureVector) -> Result<Classification> {
        let start = Instant::now();

        let scaled = self.scale(vector);
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, FEATURE_COUNT), scaled)
            .context("Failed to shape input tensor")?
            .into();

        let result = self.model.run(tvec!(input.into()))?;
        let output = result.last().context("No output from model")?;
        let probs: Vec<f32> = output.to_array_view::<f32>()?.iter().copied().collect();

        if probs.len() != self.health_labels.len() {
            anyhow::bail!(
                "Model produced {} probabilities for {} classes",
                probs.len(),
                self.health_labels.len()
            );
        }

        let (best_idx, _) = probs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .context("Empty probability output")?;

        let probabilities: BTreeMap<String, f64> = self
            .health_labels
            .iter()
            .zip(probs.iter())
            .map(|(label, p)| (label.clone(), *p as f64))
            .collect();

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(
                elapsed_ms = elapsed.as_millis(),
                "Inference exceeded {}ms target", MAX_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(Classification {
            label: self.health_labels[best_idx].clone(),
            probabilities,
        })
    }

    fn model_version(&self) -> &str {
        &self.version
    }
}
