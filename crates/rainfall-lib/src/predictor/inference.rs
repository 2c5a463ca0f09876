//! ONNX inference using tract
//!
//! Runs regressors exported to ONNX (for example with skl2onnx) one row
//! at a time with a fixed `[1, n_features]` f32 input.

use super::{FeatureLayout, Predictor};
use crate::models::FeatureMatrix;
use anyhow::{Context, Result};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum per-row inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based predictor
pub struct OnnxPredictor {
    model: TractModel,
    layout: FeatureLayout,
    version: String,
}

impl OnnxPredictor {
    /// Load a model from bytes; `layout` describes the input tensor columns
    pub fn from_bytes(
        model_bytes: &[u8],
        layout: FeatureLayout,
        version: impl Into<String>,
    ) -> Result<Self> {
        let model = Self::load_model(model_bytes, layout.n_features())?;
        Ok(Self {
            model,
            layout,
            version: version.into(),
        })
    }

    /// Load and optimize an ONNX model from bytes
    fn load_model(model_bytes: &[u8], n_features: usize) -> Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, n_features]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    fn run_row(&self, row: &[f64]) -> Result<f64> {
        let start = Instant::now();

        let data: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, data.len()), data)?.into();

        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let value = output
            .to_array_view::<f32>()?
            .iter()
            .next()
            .copied()
            .context("Model output is empty")?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(
                elapsed_ms = elapsed.as_millis(),
                "Inference exceeded {}ms target", MAX_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(value as f64)
    }

}

impl Predictor for OnnxPredictor {
    fn predict_batch(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        self.layout
            .project(features)?
            .iter()
            .map(|row| self.run_row(row))
            .collect()
    }

    fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    fn model_version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_onnx_bytes() {
        let result =
            OnnxPredictor::from_bytes(b"not protobuf", FeatureLayout::positional(6), "v1");
        assert!(result.is_err());
    }
}
