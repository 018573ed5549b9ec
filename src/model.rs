//! Regression model backends.
//!
//! A model artifact is selected by file extension:
//! - `.json`: linear regression parameters (coefficients + intercept)
//! - `.onnx`: ONNX graph evaluated with ONNX Runtime (`onnx` feature)

use crate::error::EstimateError;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A model that maps a fixed-length feature vector to a scalar prediction.
///
/// Implementations are shared read-only across request handlers.
pub trait Regressor: Send + Sync {
    /// Expected input length, when the artifact declares it.
    ///
    /// Backends that return `None` are checked with a trial prediction at load.
    fn n_features(&self) -> Option<usize>;

    /// Predict a single scalar from one feature vector.
    fn predict(&self, features: ArrayView1<'_, f64>) -> Result<f64, EstimateError>;

    /// Short backend name for logging.
    fn kind(&self) -> &'static str;
}

impl fmt::Debug for dyn Regressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Regressor")
            .field("kind", &self.kind())
            .field("n_features", &self.n_features())
            .finish()
    }
}

/// Ordinary least squares model: `y = coefficients . x + intercept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// One weight per schema column
    #[serde(alias = "coef_")]
    pub coefficients: Vec<f64>,

    /// Bias term
    #[serde(alias = "intercept_", default)]
    pub intercept: f64,
}

impl LinearModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Parse model parameters from JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let model: Self =
            serde_json::from_str(json).map_err(|e| format!("malformed model file: {}", e))?;
        if let Some(i) = model.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(format!("coefficient {} is not finite", i));
        }
        if !model.intercept.is_finite() {
            return Err("intercept is not finite".to_string());
        }
        Ok(model)
    }
}

impl Regressor for LinearModel {
    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> Result<f64, EstimateError> {
        if features.len() != self.coefficients.len() {
            return Err(EstimateError::Inference(format!(
                "expected {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }
        let weights = ArrayView1::from(self.coefficients.as_slice());
        Ok(weights.dot(&features) + self.intercept)
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}

/// Load a model artifact, dispatching on the file extension.
pub fn load_model(path: &Path) -> Result<Box<dyn Regressor>, EstimateError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => {
            let json =
                std::fs::read_to_string(path).map_err(|e| EstimateError::artifact(path, e))?;
            let model =
                LinearModel::from_json(&json).map_err(|reason| EstimateError::artifact(path, reason))?;
            Ok(Box::new(model))
        }
        #[cfg(feature = "onnx")]
        Some("onnx") => Ok(Box::new(onnx::OnnxRegressor::from_file(path)?)),
        #[cfg(not(feature = "onnx"))]
        Some("onnx") => Err(EstimateError::artifact(
            path,
            "ONNX models require the `onnx` feature",
        )),
        _ => Err(EstimateError::artifact(
            path,
            "unsupported model format, expected .json or .onnx",
        )),
    }
}

/// Check that a model accepts vectors of the schema's length.
pub fn verify_dimensions(
    model: &dyn Regressor,
    expected: usize,
    path: &Path,
) -> Result<(), EstimateError> {
    match model.n_features() {
        Some(n) if n != expected => Err(EstimateError::artifact(
            path,
            format!(
                "model expects {} features but schema has {} columns",
                n, expected
            ),
        )),
        Some(_) => Ok(()),
        None => {
            let zeros = Array1::<f64>::zeros(expected);
            model
                .predict(zeros.view())
                .map(|_| ())
                .map_err(|e| EstimateError::artifact(path, format!("trial prediction failed: {}", e)))
        }
    }
}

#[cfg(feature = "onnx")]
mod onnx {
    use super::Regressor;
    use crate::error::EstimateError;
    use ndarray::{Array2, ArrayView1};
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use ort::value::Value;
    use parking_lot::Mutex;
    use std::path::Path;

    /// ONNX Runtime backed regressor.
    ///
    /// `Session::run` needs exclusive access, so concurrent predictions are
    /// serialized on the session lock.
    pub struct OnnxRegressor {
        session: Mutex<Session>,
    }

    impl OnnxRegressor {
        pub fn from_file(path: &Path) -> Result<Self, EstimateError> {
            let session = Session::builder()
                .map_err(load_error(path))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(load_error(path))?
                .with_intra_threads(1)
                .map_err(load_error(path))?
                .commit_from_file(path)
                .map_err(load_error(path))?;

            Ok(Self {
                session: Mutex::new(session),
            })
        }
    }

    fn load_error<E: std::fmt::Display>(path: &Path) -> impl Fn(E) -> EstimateError + '_ {
        move |e| EstimateError::artifact(path, e)
    }

    impl Regressor for OnnxRegressor {
        fn n_features(&self) -> Option<usize> {
            None
        }

        fn predict(&self, features: ArrayView1<'_, f64>) -> Result<f64, EstimateError> {
            let inference = |e: ort::Error| EstimateError::Inference(e.to_string());

            // skl2onnx exports take a [batch, n_features] float tensor
            let input: Array2<f32> = features
                .mapv(|x| x as f32)
                .into_shape_with_order((1, features.len()))
                .map_err(|e| EstimateError::Inference(e.to_string()))?;
            let input_tensor = Value::from_array(input).map_err(inference)?;

            let mut session = self.session.lock();
            let outputs = session.run(ort::inputs![input_tensor]).map_err(inference)?;
            let (_, data) = outputs[0].try_extract_tensor::<f32>().map_err(inference)?;

            data.first()
                .map(|&y| f64::from(y))
                .ok_or_else(|| EstimateError::Inference("model produced no output".to_string()))
        }

        fn kind(&self) -> &'static str {
            "onnx"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_linear_predict() {
        let model = LinearModel::new(vec![2.0, 10.0, 5.0, 100.0], 1.0);
        let x = Array1::from(vec![1000.0, 3.0, 2.0, 1.0]);
        let y = model.predict(x.view()).unwrap();
        assert!((y - (2000.0 + 30.0 + 10.0 + 100.0 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_linear_predict_wrong_length() {
        let model = LinearModel::new(vec![1.0, 1.0, 1.0], 0.0);
        let x = Array1::from(vec![1.0, 1.0]);
        assert!(matches!(
            model.predict(x.view()),
            Err(EstimateError::Inference(_))
        ));
    }

    #[test]
    fn test_linear_from_json_sklearn_names() {
        let model = LinearModel::from_json(r#"{"coef_": [0.1, 2.0, 3.0], "intercept_": -4.5}"#)
            .unwrap();
        assert_eq!(model.coefficients, vec![0.1, 2.0, 3.0]);
        assert_eq!(model.intercept, -4.5);
        assert_eq!(model.n_features(), Some(3));
    }

    #[test]
    fn test_linear_from_json_default_intercept() {
        let model = LinearModel::from_json(r#"{"coefficients": [1.0, 2.0, 3.0]}"#).unwrap();
        assert_eq!(model.intercept, 0.0);
    }

    #[test]
    fn test_linear_from_json_malformed() {
        assert!(LinearModel::from_json("not json").is_err());
        assert!(LinearModel::from_json(r#"{"intercept": 1.0}"#).is_err());
    }

    #[test]
    fn test_load_model_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"coefficients": [1.0, 2.0, 3.0, 4.0], "intercept": 0.5}}"#).unwrap();

        let model = load_model(file.path()).unwrap();
        assert_eq!(model.kind(), "linear");
        assert_eq!(model.n_features(), Some(4));
    }

    #[test]
    fn test_load_model_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".pickle").tempfile().unwrap();
        let err = load_model(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported model format"));
    }

    #[test]
    fn test_load_model_missing() {
        let err = load_model(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, EstimateError::ArtifactLoad { .. }));
    }

    /// Backend without a declared input size, like an ONNX graph.
    struct UndeclaredModel {
        accepts: usize,
    }

    impl Regressor for UndeclaredModel {
        fn n_features(&self) -> Option<usize> {
            None
        }

        fn predict(&self, features: ArrayView1<'_, f64>) -> Result<f64, EstimateError> {
            if features.len() == self.accepts {
                Ok(features.sum())
            } else {
                Err(EstimateError::Inference(format!(
                    "input has {} columns, graph takes {}",
                    features.len(),
                    self.accepts
                )))
            }
        }

        fn kind(&self) -> &'static str {
            "undeclared"
        }
    }

    #[test]
    fn test_verify_dimensions_undeclared_size() {
        let model = UndeclaredModel { accepts: 4 };
        let path = Path::new("model.onnx");
        assert!(verify_dimensions(&model, 4, path).is_ok());

        let err = verify_dimensions(&model, 5, path).unwrap_err();
        match err {
            EstimateError::ArtifactLoad { reason, .. } => {
                assert!(reason.contains("trial prediction failed"));
                assert!(reason.contains("graph takes 4"));
            }
            other => panic!("expected ArtifactLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_dimensions() {
        let model = LinearModel::new(vec![1.0; 5], 0.0);
        let path = Path::new("model.json");
        assert!(verify_dimensions(&model, 5, path).is_ok());

        let err = verify_dimensions(&model, 6, path).unwrap_err();
        assert!(err.to_string().contains("expects 5 features"));
    }
}
