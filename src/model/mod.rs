mod onnx;
mod scaler;

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

pub use onnx::OnnxRegressor;
pub use scaler::StandardScaler;

pub const FEATURE_COUNT: usize = 7;

/// Column order the model was trained on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gender",
    "age",
    "height",
    "weight",
    "duration",
    "heart_rate",
    "body_temp",
];

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {artifact} artifact {path}: {source}")]
    Io {
        artifact: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {artifact} artifact: {reason}")]
    Parse {
        artifact: &'static str,
        reason: String,
    },

    #[error("invalid model shape: {0}")]
    Shape(String),

    #[error("inference runtime error: {0}")]
    Runtime(String),

    #[error("model produced a non-finite prediction ({0})")]
    NonFinite(f64),
}

/// A fitted regressor taking one row of scaled features.
pub trait Regressor: Send + Sync {
    fn predict_row(&self, row: &[f32; FEATURE_COUNT]) -> Result<f32, ModelError>;
}

/// Calorie regression model plus the scaler fitted alongside it.
pub struct CaloriePredictor {
    scaler: StandardScaler,
    regressor: Box<dyn Regressor>,
}

impl std::fmt::Debug for CaloriePredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaloriePredictor")
            .field("scaler", &self.scaler)
            .finish_non_exhaustive()
    }
}

impl CaloriePredictor {
    pub fn new(scaler: StandardScaler, regressor: impl Regressor + 'static) -> Self {
        Self {
            scaler,
            regressor: Box::new(regressor),
        }
    }

    /// Load both artifacts from disk. Any failure here is fatal for the process.
    pub fn load(
        model_path: impl AsRef<Path>,
        scaler_path: impl AsRef<Path>,
    ) -> Result<Self, ModelError> {
        let scaler = StandardScaler::from_json(&read_artifact("scaler", scaler_path.as_ref())?)?;
        let regressor = OnnxRegressor::load(model_path.as_ref())?;
        info!(
            model = %model_path.as_ref().display(),
            scaler = %scaler_path.as_ref().display(),
            "calorie model loaded"
        );
        Ok(Self::new(scaler, regressor))
    }

    /// Inputs are passed through unchecked; only the output is required to be finite.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> Result<f64, ModelError> {
        let row = to_input_row(&self.scaler.transform(features));
        let value = f64::from(self.regressor.predict_row(&row)?);
        debug!(?features, prediction = value, "calorie prediction");
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ModelError::NonFinite(value))
        }
    }
}

/// Tree ensembles compare features against `f32` split thresholds, so the
/// scaled row is narrowed before it reaches the model.
fn to_input_row(scaled: &[f64; FEATURE_COUNT]) -> [f32; FEATURE_COUNT] {
    scaled.map(|v| v as f32)
}

fn read_artifact(artifact: &'static str, path: &Path) -> Result<String, ModelError> {
    std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        artifact,
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use super::*;

    pub(crate) const TEST_SCALER: &str = r#"{
        "mean": [0.5, 42.8, 174.5, 75.0, 15.5, 95.5, 40.0],
        "scale": [0.5, 16.9, 14.3, 15.0, 8.3, 9.6, 0.8],
        "feature_names": ["gender", "age", "height", "weight", "duration", "heart_rate", "body_temp"]
    }"#;

    const IDENTITY_SCALER: &str = r#"{
        "mean": [0, 0, 0, 0, 0, 0, 0],
        "scale": [1, 1, 1, 1, 1, 1, 1]
    }"#;

    /// Depth-one trees: each goes left when `row[feature] < threshold`.
    pub(crate) struct Stumps {
        pub base: f32,
        pub trees: Vec<(usize, f32, f32, f32)>,
    }

    impl Regressor for Stumps {
        fn predict_row(&self, row: &[f32; FEATURE_COUNT]) -> Result<f32, ModelError> {
            Ok(self
                .trees
                .iter()
                .fold(self.base, |acc, &(feature, threshold, left, right)| {
                    acc + if row[feature] < threshold { left } else { right }
                }))
        }
    }

    struct Constant(f32);

    impl Regressor for Constant {
        fn predict_row(&self, _row: &[f32; FEATURE_COUNT]) -> Result<f32, ModelError> {
            Ok(self.0)
        }
    }

    pub(crate) fn test_predictor() -> CaloriePredictor {
        CaloriePredictor::new(
            StandardScaler::from_json(TEST_SCALER).unwrap(),
            Stumps {
                base: 89.0,
                trees: vec![(4, 0.0, 20.0, 120.0), (5, 0.0, -5.0, 15.0)],
            },
        )
    }

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn predicts_positive_calories_for_reference_workout() {
        let predictor = test_predictor();
        let kcal = predictor
            .predict(&[0.0, 30.0, 175.0, 70.0, 20.0, 110.0, 38.5])
            .unwrap();
        assert!(kcal.is_finite());
        assert!(kcal > 0.0);
        assert_eq!(kcal, 89.0 + 120.0 + 15.0);
    }

    #[test]
    fn short_low_intensity_workout_takes_left_branches() {
        let predictor = test_predictor();
        let kcal = predictor
            .predict(&[1.0, 20.0, 160.0, 55.0, 5.0, 80.0, 39.0])
            .unwrap();
        assert_eq!(kcal, 89.0 + 20.0 - 5.0);
    }

    #[test]
    fn features_are_compared_at_single_precision() {
        // Below 0.1 in f64, equal to the split once narrowed to f32.
        let value = 0.099_999_999_99_f64;
        assert!(value < f64::from(0.1_f32));
        assert_eq!(value as f32, 0.1_f32);

        let predictor = CaloriePredictor::new(
            StandardScaler::from_json(IDENTITY_SCALER).unwrap(),
            Stumps {
                base: 0.0,
                trees: vec![(4, 0.1, 1.0, 2.0)],
            },
        );
        let kcal = predictor
            .predict(&[0.0, 0.0, 0.0, 0.0, value, 0.0, 0.0])
            .unwrap();
        assert_eq!(kcal, 2.0);
    }

    #[test]
    fn input_row_narrows_every_feature() {
        let row = to_input_row(&[0.0, -1.5, 2.25, 1e-3, 0.1, 7.0, -0.0]);
        assert_eq!(row, [0.0, -1.5, 2.25, 1e-3_f32, 0.1_f32, 7.0, 0.0]);
    }

    #[test]
    fn load_fails_on_missing_model() {
        let scaler = write_temp(TEST_SCALER);
        let err = CaloriePredictor::load("/definitely/not/here.onnx", scaler.path()).unwrap_err();
        assert!(matches!(err, ModelError::Io { artifact: "model", .. }));
    }

    #[test]
    fn load_fails_on_missing_scaler() {
        let err = CaloriePredictor::load("/definitely/not/here.onnx", "/nor/here.json").unwrap_err();
        assert!(matches!(err, ModelError::Io { artifact: "scaler", .. }));
    }

    #[test]
    fn load_fails_on_malformed_scaler() {
        let model = write_temp("not an onnx graph");
        let scaler = write_temp("{\"mean\": []}");
        let err = CaloriePredictor::load(model.path(), scaler.path()).unwrap_err();
        assert!(matches!(err, ModelError::Parse { artifact: "scaler", .. } | ModelError::Shape(_)));
    }

    #[test]
    fn non_finite_output_is_an_error() {
        let scaler = StandardScaler::from_json(TEST_SCALER).unwrap();
        for output in [f32::INFINITY, f32::NAN] {
            let predictor = CaloriePredictor::new(scaler.clone(), Constant(output));
            let err = predictor
                .predict(&[0.0, 30.0, 175.0, 70.0, 20.0, 110.0, 38.5])
                .unwrap_err();
            assert!(matches!(err, ModelError::NonFinite(_)));
        }
    }
}
