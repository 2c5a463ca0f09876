//! Manual prediction command

use anyhow::{Context, Result};
use chrono::NaiveDate;
use colored::Colorize;
use rainfall_lib::{
    predictor::{predict_manual, ArtifactRegistry, ModelVariant},
    FeatureRecord,
};
use serde::Serialize;
use tracing::debug;

use crate::output::{color_category, print_json, OutputFormat};

#[derive(Serialize)]
struct PredictOutput<'a> {
    model: ModelVariant,
    model_version: &'a str,
    #[serde(flatten)]
    result: &'a rainfall_lib::ManualPrediction,
}

/// Predict rainfall for one manually entered record
pub fn predict(
    registry: &ArtifactRegistry,
    variant: ModelVariant,
    record: FeatureRecord,
    date: Option<NaiveDate>,
    format: OutputFormat,
) -> Result<()> {
    // Reject out-of-range input before touching the artifact
    record.validate()?;

    let model = registry
        .load(variant)
        .with_context(|| format!("Failed to load {} model", variant))?;
    debug!(model = %variant, version = model.model_version(), "Model loaded");

    let result = predict_manual(model.as_ref(), &record, date)?;

    match format {
        OutputFormat::Json => print_json(&PredictOutput {
            model: variant,
            model_version: model.model_version(),
            result: &result,
        })?,
        OutputFormat::Table => {
            if let Some(date) = result.date {
                println!("Date:                   {}", date.format("%Y-%m-%d"));
            }
            println!("Model:                  {}", variant.to_string().cyan());
            println!(
                "Predicted rainfall (RR): {}",
                result.display_value.bold()
            );
            println!(
                "Category:               {} {}",
                color_category(result.category),
                result.category.icon()
            );
        }
    }

    Ok(())
}
