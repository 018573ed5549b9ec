//! HTTP front end for the price estimator.
//!
//! Endpoints:
//! - `GET /get_location_names`: known locations
//! - `GET /predict_home_price?location=..&total_sqft=..&bhk=..&bath=..`
//! - `POST /predict_home_price` with the same fields as a form or JSON body

use crate::error::EstimateError;
use crate::estimator::PriceEstimator;
use axum::{
    extract::{rejection::QueryRejection, FromRequest, Query, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Prediction request fields.
///
/// Missing numeric fields default to zero and are rejected by validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictParams {
    pub location: String,

    /// Total area in square feet
    #[serde(alias = "sqft")]
    pub total_sqft: f64,

    /// Number of bedrooms
    #[serde(alias = "bed")]
    pub bhk: i64,

    /// Number of bathrooms
    pub bath: i64,

    /// Accepted for compatibility; does not affect the prediction
    pub balcony: Option<i64>,
}

impl PredictParams {
    fn counts(&self) -> Result<(u32, u32), EstimateError> {
        let count = |name: &str, value: i64| {
            u32::try_from(value).map_err(|_| {
                EstimateError::InvalidInput(format!("{} must be a positive integer, got {}", name, value))
            })
        };
        Ok((count("bhk", self.bhk)?, count("bath", self.bath)?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationsResponse {
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceResponse {
    pub estimated_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failure of a request, rendered as `{"error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// Request fields could not be parsed
    Format(String),
    /// Estimator failure
    Estimate(EstimateError),
}

impl From<EstimateError> for ApiError {
    fn from(err: EstimateError) -> Self {
        Self::Estimate(err)
    }
}

/// HTTP status for an estimator failure.
pub fn status_code(err: &EstimateError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Format(detail) => {
                warn!("Rejected malformed request: {}", detail);
                (
                    StatusCode::BAD_REQUEST,
                    format!("Invalid input format. Please check the input values. ({})", detail),
                )
            }
            ApiError::Estimate(err) => {
                let status = status_code(&err);
                if status.is_client_error() {
                    warn!("Rejected request: {}", err);
                    (status, err.to_string())
                } else {
                    error!("Prediction failed: {}", err);
                    (status, format!("Prediction failed. Details: {}", err))
                }
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Build the application router.
pub fn router(estimator: Arc<PriceEstimator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/get_location_names", get(get_location_names))
        .route("/predict_home_price", get(predict_query).post(predict_body))
        .layer(cors)
        .with_state(estimator)
}

/// Serve the application on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    estimator: Arc<PriceEstimator>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Home price server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(estimator))
        .with_graceful_shutdown(shutdown)
        .await
}

/// GET /get_location_names
async fn get_location_names(
    State(estimator): State<Arc<PriceEstimator>>,
) -> Result<Json<LocationsResponse>, ApiError> {
    let locations = estimator.location_names()?.to_vec();
    debug!("Serving {} location names", locations.len());
    Ok(Json(LocationsResponse { locations }))
}

/// GET /predict_home_price
async fn predict_query(
    State(estimator): State<Arc<PriceEstimator>>,
    params: Result<Query<PredictParams>, QueryRejection>,
) -> Result<Json<PriceResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::Format(e.body_text()))?;
    predict(&estimator, params)
}

/// POST /predict_home_price, JSON or form-encoded
async fn predict_body(
    State(estimator): State<Arc<PriceEstimator>>,
    request: Request,
) -> Result<Json<PriceResponse>, ApiError> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    let params = if is_json {
        let Json(params) = Json::<PredictParams>::from_request(request, &())
            .await
            .map_err(|e| ApiError::Format(e.body_text()))?;
        params
    } else {
        let Form(params) = Form::<PredictParams>::from_request(request, &())
            .await
            .map_err(|e| ApiError::Format(e.body_text()))?;
        params
    };
    predict(&estimator, params)
}

fn predict(
    estimator: &PriceEstimator,
    params: PredictParams,
) -> Result<Json<PriceResponse>, ApiError> {
    debug!("Prediction request: {:?}", params);
    let (bedrooms, bathrooms) = params.counts()?;
    let estimated_price =
        estimator.estimate(params.location.trim(), params.total_sqft, bedrooms, bathrooms)?;
    Ok(Json(PriceResponse { estimated_price }))
}
