//! Core data models for rainfall prediction

use crate::category::Category;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column names of the six weather measurements, in model order
pub const FEATURE_COLUMNS: [&str; 6] = ["TN", "TX", "TAVG", "RH_AVG", "FF_X", "FF_AVG"];

/// Observed precipitation column, never passed to the model
pub const TARGET_COLUMN: &str = "RR";

/// Date key column, echoed in batch output when present
pub const DATE_COLUMN: &str = "TANGGAL";

/// Entry-control bounds for a single manual input field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureBound {
    pub name: &'static str,
    pub description: &'static str,
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
}

/// Bounds in the same order as [`FEATURE_COLUMNS`]
pub const FEATURE_BOUNDS: [FeatureBound; 6] = [
    bound("TN", "Minimum temperature", 0.0, 50.0, "°C"),
    bound("TX", "Maximum temperature", 0.0, 50.0, "°C"),
    bound("TAVG", "Average temperature", 0.0, 50.0, "°C"),
    bound("RH_AVG", "Average relative humidity", 0.0, 100.0, "%"),
    bound("FF_X", "Maximum wind speed", 0.0, 20.0, "m/s"),
    bound("FF_AVG", "Average wind speed", 0.0, 20.0, "m/s"),
];

const fn bound(
    name: &'static str,
    description: &'static str,
    min: f64,
    max: f64,
    unit: &'static str,
) -> FeatureBound {
    FeatureBound {
        name,
        description,
        min,
        max,
        unit,
    }
}

/// Manual input rejected by the entry bounds
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} must be between {min} and {max} {unit}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
        unit: &'static str,
    },
}

/// One day of weather measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(rename = "TN")]
    pub tn: f64,
    #[serde(rename = "TX")]
    pub tx: f64,
    #[serde(rename = "TAVG")]
    pub tavg: f64,
    #[serde(rename = "RH_AVG")]
    pub rh_avg: f64,
    #[serde(rename = "FF_X")]
    pub ff_x: f64,
    #[serde(rename = "FF_AVG")]
    pub ff_avg: f64,
}

impl FeatureRecord {
    pub fn new(tn: f64, tx: f64, tavg: f64, rh_avg: f64, ff_x: f64, ff_avg: f64) -> Self {
        Self {
            tn,
            tx,
            tavg,
            rh_avg,
            ff_x,
            ff_avg,
        }
    }

    /// Values in [`FEATURE_COLUMNS`] order
    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.tn, self.tx, self.tavg, self.rh_avg, self.ff_x, self.ff_avg]
    }

    /// Check every field against its entry-control bounds
    pub fn validate(&self) -> Result<(), InputError> {
        for (bound, value) in FEATURE_BOUNDS.iter().zip(self.to_vec()) {
            // NaN fails both comparisons, so test for containment instead
            if !(bound.min..=bound.max).contains(&value) {
                return Err(InputError::OutOfRange {
                    field: bound.name,
                    value,
                    min: bound.min,
                    max: bound.max,
                    unit: bound.unit,
                });
            }
        }
        Ok(())
    }
}

/// Named numeric columns handed to a predictor
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Self { columns, rows }
    }

    /// Single-row matrix with the canonical feature names
    pub fn from_record(record: &FeatureRecord) -> Self {
        Self {
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: vec![record.to_vec()],
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One output row of a batch prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub prediction: f64,
    pub category: Category,
    pub badge: String,
}

impl PredictionRow {
    pub fn new(date: Option<String>, prediction: f64) -> Self {
        let category = Category::from_prediction(prediction);
        Self {
            date,
            prediction,
            category,
            badge: category.badge(),
        }
    }
}

/// Result of a manually entered prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualPrediction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub prediction: f64,
    /// Prediction fixed to four decimal places
    pub display_value: String,
    pub category: Category,
    pub badge: String,
}

impl ManualPrediction {
    pub fn new(date: Option<NaiveDate>, prediction: f64) -> Self {
        let category = Category::from_prediction(prediction);
        Self {
            date,
            prediction,
            display_value: format!("{:.4}", prediction),
            category,
            badge: category.badge(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureRecord {
        FeatureRecord::new(20.0, 30.0, 25.0, 80.0, 5.0, 2.0)
    }

    #[test]
    fn test_to_vec_follows_column_order() {
        assert_eq!(sample().to_vec(), vec![20.0, 30.0, 25.0, 80.0, 5.0, 2.0]);
    }

    #[test]
    fn test_validate_accepts_bounds_inclusive() {
        assert!(sample().validate().is_ok());
        assert!(FeatureRecord::new(0.0, 50.0, 0.0, 100.0, 20.0, 0.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_humidity() {
        let mut record = sample();
        record.rh_avg = 100.5;
        match record.validate() {
            Err(InputError::OutOfRange { field, max, .. }) => {
                assert_eq!(field, "RH_AVG");
                assert_eq!(max, 100.0);
            }
            other => panic!("expected out of range error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_negative_and_nan() {
        let mut record = sample();
        record.ff_avg = -0.1;
        assert!(record.validate().is_err());

        let mut record = sample();
        record.tn = f64::NAN;
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_record_deserializes_from_column_names() {
        let json = r#"{"TN":20.0,"TX":30.0,"TAVG":25.0,"RH_AVG":80.0,"FF_X":5.0,"FF_AVG":2.0}"#;
        let record: FeatureRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record, sample());
    }

    #[test]
    fn test_matrix_from_record() {
        let matrix = FeatureMatrix::from_record(&sample());
        assert_eq!(matrix.columns, FEATURE_COLUMNS.to_vec());
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn test_manual_prediction_display_has_four_decimals() {
        let result = ManualPrediction::new(None, 0.123456);
        assert_eq!(result.display_value, "0.1235");
        assert_eq!(result.category, Category::ClearLight);
    }
}
