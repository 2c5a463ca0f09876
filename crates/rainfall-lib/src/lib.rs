//! Rainfall (RR) prediction library
//!
//! This crate provides the core functionality for:
//! - Weather feature records and their entry bounds
//! - Severity categorization of predicted rainfall
//! - Loading pre-trained model artifacts and running predictions
//! - Semicolon-delimited batch input and CSV export
//! - Health checks and observability

pub mod batch;
pub mod category;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

pub use batch::{predict_dataset, write_full_results, write_results, BatchDataset};
pub use category::{categorize, Category};
pub use error::{ArtifactError, BatchError, FeatureError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PredictionMetrics, StructuredLogger};
pub use predictor::{predict_manual, ArtifactRegistry, ModelVariant, Predictor, RegistryConfig};
