//! Batch input and output
//!
//! Historical records arrive as a semicolon-delimited file with a header
//! row. The target (`RR`) and date (`TANGGAL`) columns are excluded from
//! the features; every other column goes to the model in file order.
//! Results are exported as a comma-delimited file.

use crate::error::BatchError;
use crate::models::{FeatureMatrix, PredictionRow, DATE_COLUMN, TARGET_COLUMN};
use crate::predictor::Predictor;
use anyhow::{ensure, Result};
use std::io::{Read, Write};
use tracing::debug;

/// Input field delimiter
pub const INPUT_DELIMITER: u8 = b';';

/// Header of the prediction column in exports
pub const PREDICTION_COLUMN: &str = "predicted_rr";

/// Header of the category column in exports
pub const CATEGORY_COLUMN: &str = "category";

/// Parsed batch file
#[derive(Debug, Clone)]
pub struct BatchDataset {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
    features: FeatureMatrix,
    dates: Option<Vec<String>>,
}

impl BatchDataset {
    /// Parse a semicolon-delimited file; any malformed row fails the whole
    /// dataset
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, BatchError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(INPUT_DELIMITER)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(BatchError::MissingHeader);
        }

        let feature_idx: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.as_str() != TARGET_COLUMN && h.as_str() != DATE_COLUMN)
            .map(|(i, _)| i)
            .collect();
        if feature_idx.is_empty() {
            return Err(BatchError::NoFeatureColumns);
        }
        let date_idx = headers.iter().position(|h| h == DATE_COLUMN);

        let mut records = Vec::new();
        let mut rows = Vec::new();
        let mut dates = date_idx.map(|_| Vec::new());

        for (i, result) in rdr.records().enumerate() {
            let record = result?;
            let row = feature_idx
                .iter()
                .map(|&idx| {
                    let raw = &record[idx];
                    raw.trim().parse::<f64>().map_err(|_| BatchError::InvalidNumber {
                        row: i + 1,
                        column: headers[idx].clone(),
                        value: raw.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            rows.push(row);

            if let (Some(idx), Some(dates)) = (date_idx, dates.as_mut()) {
                dates.push(record[idx].trim().to_string());
            }
            records.push(record.iter().map(|f| f.to_string()).collect());
        }

        let columns = feature_idx.iter().map(|&idx| headers[idx].clone()).collect();
        debug!(rows = rows.len(), columns = feature_idx.len(), "Batch file parsed");

        Ok(Self {
            headers,
            records,
            features: FeatureMatrix::new(columns, rows),
            dates,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    pub fn dates(&self) -> Option<&[String]> {
        self.dates.as_deref()
    }

    pub fn has_date_column(&self) -> bool {
        self.dates.is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First `n` raw rows for display
    pub fn preview(&self, n: usize) -> &[Vec<String>] {
        &self.records[..n.min(self.records.len())]
    }

    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }
}

/// Predict and categorize every row, preserving row order
pub fn predict_dataset(
    predictor: &dyn Predictor,
    dataset: &BatchDataset,
) -> Result<Vec<PredictionRow>> {
    let predictions = predictor.predict_batch(dataset.features())?;
    ensure!(
        predictions.len() == dataset.len(),
        "model returned {} predictions for {} rows",
        predictions.len(),
        dataset.len()
    );

    let rows = predictions
        .into_iter()
        .enumerate()
        .map(|(i, prediction)| {
            let date = dataset.dates().map(|d| d[i].clone());
            PredictionRow::new(date, prediction)
        })
        .collect();
    Ok(rows)
}

/// Write the result table: date (if the input had one), prediction, category
pub fn write_results<W: Write>(
    writer: W,
    dataset: &BatchDataset,
    rows: &[PredictionRow],
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    if dataset.has_date_column() {
        wtr.write_record([DATE_COLUMN, PREDICTION_COLUMN, CATEGORY_COLUMN])?;
    } else {
        wtr.write_record([PREDICTION_COLUMN, CATEGORY_COLUMN])?;
    }

    for row in rows {
        let prediction = row.prediction.to_string();
        match (&row.date, dataset.has_date_column()) {
            (Some(date), true) => {
                wtr.write_record([date.as_str(), prediction.as_str(), row.badge.as_str()])?
            }
            _ => wtr.write_record([prediction.as_str(), row.badge.as_str()])?,
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Write every input column followed by the prediction and category
pub fn write_full_results<W: Write>(
    writer: W,
    dataset: &BatchDataset,
    rows: &[PredictionRow],
) -> Result<()> {
    ensure!(
        rows.len() == dataset.len(),
        "{} result rows for {} input rows",
        rows.len(),
        dataset.len()
    );

    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = dataset.headers().iter().map(String::as_str).collect();
    header.push(PREDICTION_COLUMN);
    header.push(CATEGORY_COLUMN);
    wtr.write_record(&header)?;

    for (record, row) in dataset.records().iter().zip(rows) {
        let mut fields: Vec<String> = record.clone();
        fields.push(row.prediction.to_string());
        fields.push(row.badge.clone());
        wtr.write_record(&fields)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::error::FeatureError;
    use crate::predictor::test_support::humidity_forest;
    use crate::predictor::ForestPredictor;

    const SAMPLE: &str = "\
TANGGAL ; TN;TX;TAVG;RH_AVG;FF_X;FF_AVG;RR
01-01-2024;23.0;31.2;26.4;90;5;2;12.5
02-01-2024;22.4;30.8;25.9;80;4;1;0.0
03-01-2024;23.1;32.0;27.0;60;6;3;0.0
";

    fn parse(text: &str) -> Result<BatchDataset, BatchError> {
        BatchDataset::from_reader(text.as_bytes())
    }

    #[test]
    fn test_excludes_target_and_date_columns() {
        let dataset = parse(SAMPLE).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(
            dataset.features().columns,
            vec!["TN", "TX", "TAVG", "RH_AVG", "FF_X", "FF_AVG"]
        );
        assert_eq!(dataset.features().rows[0], vec![23.0, 31.2, 26.4, 90.0, 5.0, 2.0]);
        assert_eq!(
            dataset.dates().unwrap(),
            &["01-01-2024", "02-01-2024", "03-01-2024"]
        );
    }

    #[test]
    fn test_without_optional_columns() {
        let dataset = parse("TN;TX\n1;2\n3;4\n").unwrap();

        assert!(!dataset.has_date_column());
        assert_eq!(dataset.features().columns, vec!["TN", "TX"]);
        assert_eq!(dataset.features().rows, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_invalid_number_names_row_and_column() {
        let err = parse("TN;TX\n1;2\n3;abc\n").unwrap_err();
        match err {
            BatchError::InvalidNumber { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "TX");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_ragged_row_fails() {
        assert!(matches!(parse("TN;TX\n1;2\n3\n"), Err(BatchError::Csv(_))));
    }

    #[test]
    fn test_only_excluded_columns_fails() {
        assert!(matches!(
            parse("TANGGAL;RR\n01-01-2024;1.0\n"),
            Err(BatchError::NoFeatureColumns)
        ));
    }

    #[test]
    fn test_preview_is_bounded() {
        let dataset = parse(SAMPLE).unwrap();
        assert_eq!(dataset.preview(2).len(), 2);
        assert_eq!(dataset.preview(10).len(), 3);
        assert_eq!(dataset.preview(1)[0][0], "01-01-2024");
    }

    #[test]
    fn test_predict_dataset_matches_single_record_rule() {
        let predictor = ForestPredictor::new(humidity_forest()).unwrap();
        let dataset = parse(SAMPLE).unwrap();

        let rows = predict_dataset(&predictor, &dataset).unwrap();
        assert_eq!(rows.len(), dataset.len());

        let categories: Vec<Category> = rows.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![Category::Extreme, Category::Moderate, Category::ClearLight]
        );
        for row in &rows {
            assert_eq!(row.category, Category::from_prediction(row.prediction));
        }
        assert_eq!(rows[1].date.as_deref(), Some("02-01-2024"));
    }

    #[test]
    fn test_predict_dataset_missing_feature_fails() {
        let predictor = ForestPredictor::new(humidity_forest()).unwrap();
        let dataset = parse("TN;TX\n1;2\n").unwrap();

        assert!(predict_dataset(&predictor, &dataset).is_err());
    }

    #[test]
    fn test_predict_dataset_extra_column_fails() {
        let predictor = ForestPredictor::new(humidity_forest()).unwrap();
        let dataset = parse(
            "TANGGAL;TN;TX;TAVG;RH_AVG;FF_X;FF_AVG;SS;RR\n01-01-2024;23;31;26;90;5;2;6.5;12.5\n",
        )
        .unwrap();

        let err = predict_dataset(&predictor, &dataset).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FeatureError>(),
            Some(&FeatureError::UnexpectedColumn("SS".to_string()))
        );
    }

    #[test]
    fn test_write_results_with_date() {
        let predictor = ForestPredictor::new(humidity_forest()).unwrap();
        let dataset = parse(SAMPLE).unwrap();
        let rows = predict_dataset(&predictor, &dataset).unwrap();

        let mut out = Vec::new();
        write_results(&mut out, &dataset, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "TANGGAL,predicted_rr,category");
        assert_eq!(lines[1], "01-01-2024,0.75,🔴 Extreme");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_write_results_without_date() {
        let rows = vec![PredictionRow::new(None, 0.1), PredictionRow::new(None, 0.4)];
        let dataset = parse("A\n1\n2\n").unwrap();

        let mut out = Vec::new();
        write_results(&mut out, &dataset, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text, "predicted_rr,category\n0.1,🟢 Clear/Light\n0.4,🟡 Moderate\n");
    }

    #[test]
    fn test_write_full_results_keeps_input_columns() {
        let predictor = ForestPredictor::new(humidity_forest()).unwrap();
        let dataset = parse(SAMPLE).unwrap();
        let rows = predict_dataset(&predictor, &dataset).unwrap();

        let mut out = Vec::new();
        write_full_results(&mut out, &dataset, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let header = text.lines().next().unwrap();

        assert_eq!(
            header,
            "TANGGAL,TN,TX,TAVG,RH_AVG,FF_X,FF_AVG,RR,predicted_rr,category"
        );
        let last = text.lines().nth(3).unwrap();
        assert!(last.starts_with("03-01-2024,23.1,"));
        assert!(last.ends_with(",🟢 Clear/Light"));
    }
}
