//! Dashboard configuration
//!
//! Values come from serde defaults, then an optional `dashboard.toml`
//! (or `.yaml`/`.json`) in the working directory, then `RAINFALL_*`
//! environment variables.

use anyhow::{Context, Result};
use rainfall_lib::predictor::{ArtifactSpec, RegistryConfig};
use serde::Deserialize;
use std::path::PathBuf;

/// Dashboard configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Name reported in structured logs
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the model artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    #[serde(default = "default_baseline_artifact")]
    pub baseline_artifact: String,

    #[serde(default)]
    pub baseline_sha256: Option<String>,

    #[serde(default = "default_tuned_artifact")]
    pub tuned_artifact: String,

    #[serde(default)]
    pub tuned_sha256: Option<String>,

    /// Largest accepted batch upload
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "rainfall-dashboard".to_string())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_model_dir() -> PathBuf {
    RegistryConfig::default().model_dir
}

fn default_baseline_artifact() -> String {
    RegistryConfig::default().baseline.file_name
}

fn default_tuned_artifact() -> String {
    RegistryConfig::default().tuned.file_name
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            host: default_host(),
            port: default_port(),
            model_dir: default_model_dir(),
            baseline_artifact: default_baseline_artifact(),
            baseline_sha256: None,
            tuned_artifact: default_tuned_artifact(),
            tuned_sha256: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from the optional config file and environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("dashboard").required(false))
            .add_source(config::Environment::with_prefix("RAINFALL").try_parsing(true))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse dashboard configuration")
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            model_dir: self.model_dir.clone(),
            baseline: ArtifactSpec {
                file_name: self.baseline_artifact.clone(),
                sha256: self.baseline_sha256.clone(),
            },
            tuned: ArtifactSpec {
                file_name: self.tuned_artifact.clone(),
                sha256: self.tuned_sha256.clone(),
            },
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
