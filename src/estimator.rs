//! Price estimation from the loaded artifacts.
//!
//! Builds the one-hot feature vector for a request, runs the regression
//! model and post-processes the prediction.

use crate::error::EstimateError;
use crate::store::ArtifactStore;
use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What to do with a location that is not in the schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownLocationPolicy {
    /// Fail with [`EstimateError::UnknownLocation`]
    #[default]
    Reject,

    /// Predict with no location bit set
    Ignore,
}

/// Estimator settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub unknown_location: UnknownLocationPolicy,
}

/// Round a price to 2 decimal places.
pub fn round_price(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

/// Home price estimator backed by an [`ArtifactStore`].
#[derive(Debug, Clone)]
pub struct PriceEstimator {
    store: Arc<ArtifactStore>,
    config: EstimatorConfig,
}

impl PriceEstimator {
    pub fn new(store: Arc<ArtifactStore>, config: EstimatorConfig) -> Self {
        Self { store, config }
    }

    /// Known location names, lower-cased, in schema order.
    pub fn location_names(&self) -> Result<&[String], EstimateError> {
        self.store.locations()
    }

    /// Assemble the model input for one request.
    ///
    /// Numeric features are written at the positions the schema assigns to
    /// their column names. At most one location bit is set.
    pub fn feature_vector(
        &self,
        location: &str,
        area: f64,
        bedrooms: u32,
        bathrooms: u32,
    ) -> Result<Array1<f64>, EstimateError> {
        validate(location, area, bedrooms, bathrooms)?;

        let schema = self.store.schema()?;
        let indices = schema.indices();

        let mut x = Array1::<f64>::zeros(schema.len());
        x[indices.area] = area;
        x[indices.bath] = f64::from(bathrooms);
        x[indices.bed] = f64::from(bedrooms);

        match schema.location_position(location.trim()) {
            Some(position) => x[position] = 1.0,
            None => match self.config.unknown_location {
                UnknownLocationPolicy::Reject => {
                    return Err(EstimateError::UnknownLocation(location.trim().to_lowercase()));
                }
                UnknownLocationPolicy::Ignore => {
                    debug!("Unknown location '{}', predicting without location", location);
                }
            },
        }

        Ok(x)
    }

    /// Estimate the price of a home.
    ///
    /// Returns a non-negative price rounded to 2 decimal places.
    pub fn estimate(
        &self,
        location: &str,
        area: f64,
        bedrooms: u32,
        bathrooms: u32,
    ) -> Result<f64, EstimateError> {
        let x = self.feature_vector(location, area, bedrooms, bathrooms)?;
        let raw = self.store.model()?.predict(x.view())?;

        if !raw.is_finite() {
            return Err(EstimateError::Inference(format!(
                "model produced a non-finite prediction ({})",
                raw
            )));
        }
        if raw < 0.0 {
            return Err(EstimateError::NegativePrediction(raw));
        }

        // Scaling by 100 overflows for raw values near f64::MAX
        let price = round_price(raw);
        if !price.is_finite() {
            return Err(EstimateError::Inference(format!(
                "prediction {:e} is out of range",
                raw
            )));
        }
        Ok(price)
    }
}

fn validate(location: &str, area: f64, bedrooms: u32, bathrooms: u32) -> Result<(), EstimateError> {
    if location.trim().is_empty() {
        return Err(EstimateError::InvalidInput("location must not be empty".to_string()));
    }
    if !area.is_finite() || area <= 0.0 {
        return Err(EstimateError::InvalidInput(format!(
            "area must be a positive number, got {}",
            area
        )));
    }
    if bedrooms == 0 {
        return Err(EstimateError::InvalidInput("bedrooms must be positive".to_string()));
    }
    if bathrooms == 0 {
        return Err(EstimateError::InvalidInput("bathrooms must be positive".to_string()));
    }
    Ok(())
}
