//! Rainfall prediction dashboard service
//!
//! HTTP front end over `rainfall-lib`: model selection with reported
//! evaluation scores, manual prediction, batch upload with CSV export,
//! plus health and Prometheus endpoints.

pub mod api;
pub mod config;
pub mod error;

pub use api::{create_router, serve, AppState};
pub use config::DashboardConfig;
pub use error::AppError;
