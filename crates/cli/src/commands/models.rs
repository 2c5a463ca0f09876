//! Model listing command

use anyhow::Result;
use rainfall_lib::predictor::ArtifactRegistry;
use tabled::Tabled;

use crate::output::{color_available, print_json, print_table, print_warning, OutputFormat};

/// Row for models table
#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Model")]
    variant: String,
    #[tabled(rename = "File")]
    file_name: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "RMSE")]
    rmse: String,
    #[tabled(rename = "MAPE")]
    mape: String,
    #[tabled(rename = "R²")]
    r2: String,
}

/// List model variants with their evaluation scores
pub fn list_models(registry: &ArtifactRegistry, format: OutputFormat) -> Result<()> {
    let statuses = registry.status();

    match format {
        OutputFormat::Json => print_json(&statuses)?,
        OutputFormat::Table => {
            let rows: Vec<ModelRow> = statuses
                .iter()
                .map(|s| ModelRow {
                    variant: s.variant.to_string(),
                    file_name: s.file_name.clone(),
                    available: color_available(s.available),
                    rmse: format!("{:.4}", s.evaluation.rmse),
                    mape: format!("{:.2}%", s.evaluation.mape_percent),
                    r2: format!("{:.4}", s.evaluation.r2),
                })
                .collect();
            print_table(&rows);

            if statuses.iter().all(|s| !s.available) {
                print_warning(&format!(
                    "No model artifacts found in {}",
                    registry.config().model_dir.display()
                ));
            }
        }
    }

    Ok(())
}
