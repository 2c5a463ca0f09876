//! Predictor adapter around externally trained rainfall models

mod features;
mod forest;
mod inference;
mod registry;

pub use features::FeatureLayout;
pub use forest::{ForestArtifact, ForestPredictor, TreeArtifact};
pub use inference::OnnxPredictor;
pub use registry::{
    ArtifactRegistry, ArtifactSpec, ArtifactStatus, EvaluationMetrics, ModelVariant,
    ParseVariantError, RegistryConfig,
};

use crate::models::{FeatureMatrix, FeatureRecord, ManualPrediction};
use anyhow::{Context, Result};
use chrono::NaiveDate;

/// A loaded, read-only regression model
pub trait Predictor: Send + Sync {
    /// Predict one value per row, in row order
    fn predict_batch(&self, features: &FeatureMatrix) -> Result<Vec<f64>>;

    /// Predict a single record
    fn predict(&self, record: &FeatureRecord) -> Result<f64> {
        self.predict_batch(&FeatureMatrix::from_record(record))?
            .into_iter()
            .next()
            .context("Model returned no prediction")
    }

    /// Columns the model was trained on
    fn layout(&self) -> &FeatureLayout;

    /// Version string from artifact metadata
    fn model_version(&self) -> &str;
}

/// Validate manual input against the entry bounds, then predict it
pub fn predict_manual(
    predictor: &dyn Predictor,
    record: &FeatureRecord,
    date: Option<NaiveDate>,
) -> Result<ManualPrediction> {
    record.validate()?;
    let prediction = predictor.predict(record)?;
    Ok(ManualPrediction::new(date, prediction))
}
