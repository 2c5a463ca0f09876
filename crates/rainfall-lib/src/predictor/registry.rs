//! Named model artifacts and their on-disk locations
//!
//! Two pre-trained variants are available: the baseline forest and the
//! hyperparameter-tuned one. Every `load` reads the artifact from disk
//! afresh; a missing or undeserializable artifact is an error and there is
//! no fallback model.

use super::{FeatureLayout, ForestPredictor, OnnxPredictor, Predictor};
use crate::error::ArtifactError;
use crate::models::FEATURE_COLUMNS;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Pre-trained model variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    Baseline,
    Tuned,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 2] = [ModelVariant::Baseline, ModelVariant::Tuned];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Baseline => "baseline",
            ModelVariant::Tuned => "tuned",
        }
    }

    pub fn default_file_name(&self) -> &'static str {
        match self {
            ModelVariant::Baseline => "random_forest_baseline.json",
            ModelVariant::Tuned => "random_forest_tuned.json",
        }
    }

    /// Reported hold-out scores from training; not computed here
    pub fn evaluation(&self) -> EvaluationMetrics {
        match self {
            ModelVariant::Baseline => EvaluationMetrics {
                rmse: 0.3207,
                mape_percent: 240.66,
                r2: 0.2690,
            },
            ModelVariant::Tuned => EvaluationMetrics {
                rmse: 7.2947,
                mape_percent: 1460.25,
                r2: 0.2547,
            },
        }
    }

    /// File name for exported batch results
    pub fn export_file_name(&self) -> String {
        format!("rainfall_predictions_{}.csv", self.as_str())
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown model '{0}' (expected 'baseline' or 'tuned')")]
pub struct ParseVariantError(pub String);

impl FromStr for ModelVariant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" | "awal" => Ok(ModelVariant::Baseline),
            "tuned" | "tuning" => Ok(ModelVariant::Tuned),
            _ => Err(ParseVariantError(s.to_string())),
        }
    }
}

/// Static evaluation scores shown next to a model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    pub rmse: f64,
    pub mape_percent: f64,
    pub r2: f64,
}

/// Location and optional checksum of one artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub file_name: String,
    /// Hex-encoded SHA-256 of the file, verified on load when set
    #[serde(default)]
    pub sha256: Option<String>,
}

impl ArtifactSpec {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            sha256: None,
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
    #[serde(default = "default_baseline")]
    pub baseline: ArtifactSpec,
    #[serde(default = "default_tuned")]
    pub tuned: ArtifactSpec,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_baseline() -> ArtifactSpec {
    ArtifactSpec::new(ModelVariant::Baseline.default_file_name())
}

fn default_tuned() -> ArtifactSpec {
    ArtifactSpec::new(ModelVariant::Tuned.default_file_name())
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            baseline: default_baseline(),
            tuned: default_tuned(),
        }
    }
}

/// Availability of one artifact on disk
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactStatus {
    pub variant: ModelVariant,
    pub file_name: String,
    pub path: PathBuf,
    pub available: bool,
    pub evaluation: EvaluationMetrics,
}

/// Resolves variants to artifacts and loads them
#[derive(Debug, Clone)]
pub struct ArtifactRegistry {
    config: RegistryConfig,
}

impl ArtifactRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    /// Registry with default file names under `model_dir`
    pub fn with_model_dir(model_dir: impl Into<PathBuf>) -> Self {
        Self::new(RegistryConfig {
            model_dir: model_dir.into(),
            ..RegistryConfig::default()
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn spec(&self, variant: ModelVariant) -> &ArtifactSpec {
        match variant {
            ModelVariant::Baseline => &self.config.baseline,
            ModelVariant::Tuned => &self.config.tuned,
        }
    }

    pub fn path(&self, variant: ModelVariant) -> PathBuf {
        self.config.model_dir.join(&self.spec(variant).file_name)
    }

    pub fn status(&self) -> Vec<ArtifactStatus> {
        ModelVariant::ALL
            .iter()
            .map(|&variant| {
                let path = self.path(variant);
                ArtifactStatus {
                    variant,
                    file_name: self.spec(variant).file_name.clone(),
                    available: path.is_file(),
                    path,
                    evaluation: variant.evaluation(),
                }
            })
            .collect()
    }

    /// Read, verify and deserialize the artifact for `variant`
    pub fn load(&self, variant: ModelVariant) -> Result<Box<dyn Predictor>, ArtifactError> {
        let path = self.path(variant);
        let format = ArtifactFormat::from_path(&path)?;
        let bytes = read_artifact(&path)?;

        if let Some(expected) = &self.spec(variant).sha256 {
            verify_checksum(&path, &bytes, expected)?;
        }

        let predictor = build_predictor(format, &path, &bytes).map_err(|e| {
            warn!(
                variant = %variant,
                path = %path.display(),
                error = %e,
                "Model artifact rejected"
            );
            ArtifactError::Invalid {
                path: path.clone(),
                reason: format!("{:#}", e),
            }
        })?;

        info!(
            variant = %variant,
            path = %path.display(),
            model_version = %predictor.model_version(),
            n_features = predictor.layout().n_features(),
            "Model artifact loaded"
        );
        Ok(predictor)
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn verify_checksum(path: &Path, bytes: &[u8], expected: &str) -> Result<(), ArtifactError> {
    let actual = compute_checksum(bytes);
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(ArtifactError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }
    debug!(path = %path.display(), checksum = %actual, "Model checksum validated");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArtifactFormat {
    Forest,
    Onnx,
}

impl ArtifactFormat {
    fn from_path(path: &Path) -> Result<Self, ArtifactError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => Ok(ArtifactFormat::Forest),
            Some("onnx") => Ok(ArtifactFormat::Onnx),
            _ => Err(ArtifactError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

fn build_predictor(
    format: ArtifactFormat,
    path: &Path,
    bytes: &[u8],
) -> anyhow::Result<Box<dyn Predictor>> {
    match format {
        ArtifactFormat::Forest => Ok(Box::new(ForestPredictor::from_slice(bytes)?)),
        ArtifactFormat::Onnx => {
            let names = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
            let layout = FeatureLayout::named(names);
            let version = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("onnx")
                .to_string();
            Ok(Box::new(OnnxPredictor::from_bytes(bytes, layout, version)?))
        }
    }
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::humidity_forest;
    use super::*;
    use crate::models::FeatureRecord;
    use tempfile::TempDir;

    fn write_forest(dir: &Path, file_name: &str) -> Vec<u8> {
        let bytes = serde_json::to_vec(&humidity_forest()).unwrap();
        std::fs::write(dir.join(file_name), &bytes).unwrap();
        bytes
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("baseline".parse::<ModelVariant>().unwrap(), ModelVariant::Baseline);
        assert_eq!("Tuned".parse::<ModelVariant>().unwrap(), ModelVariant::Tuned);
        assert_eq!("Awal".parse::<ModelVariant>().unwrap(), ModelVariant::Baseline);
        assert_eq!("tuning".parse::<ModelVariant>().unwrap(), ModelVariant::Tuned);
        assert!("gradient".parse::<ModelVariant>().is_err());
    }

    #[test]
    fn test_reported_metrics() {
        let baseline = ModelVariant::Baseline.evaluation();
        assert_eq!(baseline.rmse, 0.3207);
        assert_eq!(baseline.mape_percent, 240.66);
        assert_eq!(baseline.r2, 0.2690);

        let tuned = ModelVariant::Tuned.evaluation();
        assert_eq!(tuned.rmse, 7.2947);
        assert_eq!(tuned.mape_percent, 1460.25);
        assert_eq!(tuned.r2, 0.2547);
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            ModelVariant::Tuned.export_file_name(),
            "rainfall_predictions_tuned.csv"
        );
    }

    #[test]
    fn test_load_missing_artifact_fails() {
        let dir = TempDir::new().unwrap();
        let registry = ArtifactRegistry::with_model_dir(dir.path());

        let err = registry.load(ModelVariant::Baseline).err().unwrap();
        assert!(matches!(err, ArtifactError::NotFound { .. }));
    }

    #[test]
    fn test_load_and_predict() {
        let dir = TempDir::new().unwrap();
        write_forest(dir.path(), ModelVariant::Baseline.default_file_name());
        let registry = ArtifactRegistry::with_model_dir(dir.path());

        let predictor = registry.load(ModelVariant::Baseline).unwrap();
        let value = predictor
            .predict(&FeatureRecord::new(20.0, 30.0, 25.0, 80.0, 5.0, 2.0))
            .unwrap();
        assert!((value - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_status_reports_availability() {
        let dir = TempDir::new().unwrap();
        write_forest(dir.path(), ModelVariant::Tuned.default_file_name());
        let registry = ArtifactRegistry::with_model_dir(dir.path());

        let status = registry.status();
        assert_eq!(status.len(), 2);
        assert!(!status[0].available);
        assert!(status[1].available);
        assert_eq!(status[1].variant, ModelVariant::Tuned);
    }

    #[test]
    fn test_checksum_verified_on_load() {
        let dir = TempDir::new().unwrap();
        let bytes = write_forest(dir.path(), "forest.json");

        let mut config = RegistryConfig {
            model_dir: dir.path().to_path_buf(),
            ..RegistryConfig::default()
        };
        config.baseline = ArtifactSpec {
            file_name: "forest.json".to_string(),
            sha256: Some(compute_checksum(&bytes).to_uppercase()),
        };
        config.tuned = ArtifactSpec {
            file_name: "forest.json".to_string(),
            sha256: Some("00".repeat(32)),
        };
        let registry = ArtifactRegistry::new(config);

        assert!(registry.load(ModelVariant::Baseline).is_ok());
        assert!(matches!(
            registry.load(ModelVariant::Tuned).err().unwrap(),
            ArtifactError::ChecksumMismatch { .. }
        ));
    }

    #[test]
    fn test_corrupt_artifact_is_invalid() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(ModelVariant::Baseline.default_file_name()), b"{").unwrap();
        let registry = ArtifactRegistry::with_model_dir(dir.path());

        assert!(matches!(
            registry.load(ModelVariant::Baseline).err().unwrap(),
            ArtifactError::Invalid { .. }
        ));
    }

    #[test]
    fn test_pickle_artifact_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("random_forest_awal.pkl"), b"\x80\x04").unwrap();
        let registry = ArtifactRegistry::new(RegistryConfig {
            model_dir: dir.path().to_path_buf(),
            baseline: ArtifactSpec::new("random_forest_awal.pkl"),
            tuned: default_tuned(),
        });

        assert!(matches!(
            registry.load(ModelVariant::Baseline).err().unwrap(),
            ArtifactError::UnsupportedFormat { .. }
        ));
    }

    #[test]
    fn test_checksum_is_hex_sha256() {
        assert_eq!(
            compute_checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
