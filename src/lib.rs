//! Home price inference service.
//!
//! Serves price estimates from a pre-trained linear regression model over a
//! one-hot location-encoded feature vector. Artifacts are loaded once at
//! startup into an [`ArtifactStore`] and shared read-only by every request.

pub mod config;
pub mod error;
pub mod estimator;
pub mod model;
pub mod schema;
pub mod server;
pub mod store;

pub use config::Config;
pub use error::EstimateError;
pub use estimator::{EstimatorConfig, PriceEstimator, UnknownLocationPolicy};
pub use model::{LinearModel, Regressor};
pub use schema::{ColumnSchema, SchemaConfig};
pub use store::{ArtifactPaths, ArtifactStore};

/// Result type for process-level plumbing (config, startup).
pub type Result<T> = anyhow::Result<T>;
