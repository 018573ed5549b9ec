//! Error types for artifact loading and price estimation.

use std::path::PathBuf;

/// Errors returned by the artifact store and the price estimator.
///
/// Every failure of an estimate is one of these kinds; a numeric result is
/// only ever returned on success.
#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    /// Missing or corrupt artifact, or schema/model disagreement.
    #[error("failed to load artifact {}: {reason}", .path.display())]
    ArtifactLoad { path: PathBuf, reason: String },

    #[error("artifacts have not been loaded")]
    NotLoaded,

    #[error("location '{0}' is not available")]
    UnknownLocation(String),

    #[error("predicted price is negative ({0:.2}), please check the input data")]
    NegativePrediction(f64),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The model could not be evaluated or produced a non-finite value.
    #[error("model inference failed: {0}")]
    Inference(String),
}

impl EstimateError {
    pub(crate) fn artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ArtifactLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the failure was caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::UnknownLocation(_))
    }
}
