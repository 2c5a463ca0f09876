//! Batch prediction command

use anyhow::{Context, Result};
use colored::Colorize;
use rainfall_lib::{
    batch::{predict_dataset, write_full_results, write_results, BatchDataset},
    predictor::{ArtifactRegistry, ModelVariant},
    Category, PredictionRow,
};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style, Tabled};
use tracing::debug;

use crate::output::{
    color_category, print_info, print_json, print_success, print_table, OutputFormat,
};

/// Row for results table
#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Predicted RR")]
    prediction: String,
    #[tabled(rename = "Category")]
    category: String,
}

#[derive(Serialize)]
struct BatchOutput<'a> {
    model: ModelVariant,
    model_version: &'a str,
    total: usize,
    rows: &'a [PredictionRow],
}

/// Options for one batch run
pub struct BatchOptions {
    pub file: PathBuf,
    pub output: Option<PathBuf>,
    pub full: bool,
    pub preview: usize,
}

/// Predict every row of a semicolon-delimited file
pub fn run_batch(
    registry: &ArtifactRegistry,
    variant: ModelVariant,
    options: &BatchOptions,
    format: OutputFormat,
) -> Result<()> {
    let file = File::open(&options.file)
        .with_context(|| format!("Failed to open {}", options.file.display()))?;
    let dataset = BatchDataset::from_reader(file)
        .with_context(|| format!("Failed to parse {}", options.file.display()))?;
    debug!(rows = dataset.len(), "Batch file loaded");

    let model = registry
        .load(variant)
        .with_context(|| format!("Failed to load {} model", variant))?;
    let rows = predict_dataset(model.as_ref(), &dataset)?;

    match format {
        OutputFormat::Json => print_json(&BatchOutput {
            model: variant,
            model_version: model.model_version(),
            total: rows.len(),
            rows: &rows,
        })?,
        OutputFormat::Table => {
            if options.preview > 0 {
                println!("{}", "Uploaded data".bold());
                print_preview(&dataset, options.preview);
                println!();
            }

            println!("{} ({})", "Prediction results".bold(), variant.to_string().cyan());
            let table_rows: Vec<ResultRow> = rows
                .iter()
                .enumerate()
                .map(|(i, row)| ResultRow {
                    index: i + 1,
                    date: row.date.clone().unwrap_or_else(|| "-".to_string()),
                    prediction: format!("{:.4}", row.prediction),
                    category: color_category(row.category).to_string(),
                })
                .collect();
            print_table(&table_rows);
            print_summary(&rows);
        }
    }

    if let Some(output) = &options.output {
        let path = export_path(output, variant);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        if options.full {
            write_full_results(file, &dataset, &rows)?;
        } else {
            write_results(file, &dataset, &rows)?;
        }
        if format == OutputFormat::Table {
            print_success(&format!("Exported {} rows to {}", rows.len(), path.display()));
        }
    }

    Ok(())
}

/// A directory target receives the default export file name
fn export_path(output: &Path, variant: ModelVariant) -> PathBuf {
    if output.is_dir() {
        output.join(variant.export_file_name())
    } else {
        output.to_path_buf()
    }
}

fn print_preview(dataset: &BatchDataset, n: usize) {
    let mut builder = Builder::default();
    builder.push_record(dataset.headers().iter().cloned());
    for record in dataset.preview(n) {
        builder.push_record(record.iter().cloned());
    }
    println!("{}", builder.build().with(Style::rounded()));
    if dataset.len() > n {
        print_info(&format!("Showing {} of {} rows", n, dataset.len()));
    }
}

fn print_summary(rows: &[PredictionRow]) {
    let counts: Vec<String> = Category::ALL
        .iter()
        .map(|category| {
            let count = rows.iter().filter(|r| r.category == *category).count();
            format!("{}: {}", category.label(), count)
        })
        .collect();
    print_info(&format!("{} rows ({})", rows.len(), counts.join(", ")));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_path_into_directory() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            export_path(dir.path(), ModelVariant::Tuned),
            dir.path().join("rainfall_predictions_tuned.csv")
        );

        let explicit = dir.path().join("out.csv");
        assert_eq!(export_path(&explicit, ModelVariant::Tuned), explicit);
    }
}
