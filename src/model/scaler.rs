use serde::Deserialize;

use super::{ModelError, FEATURE_COUNT, FEATURE_NAMES};

/// Pre-fitted standard scaler, exported from the training run as
/// `{"mean": [...], "scale": [...], "feature_names": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let mut scaler: StandardScaler =
            serde_json::from_str(raw).map_err(|e| ModelError::Parse {
                artifact: "scaler",
                reason: e.to_string(),
            })?;
        scaler.validate()?;
        // A constant feature has scale 0; the fitted transform leaves it unscaled.
        for s in &mut scaler.scale {
            if *s == 0.0 {
                *s = 1.0;
            }
        }
        Ok(scaler)
    }

    fn validate(&self) -> Result<(), ModelError> {
        for (field, len) in [("mean", self.mean.len()), ("scale", self.scale.len())] {
            if len != FEATURE_COUNT {
                return Err(ModelError::Shape(format!(
                    "scaler {field} has {len} entries, expected {FEATURE_COUNT}"
                )));
            }
        }
        if let Some(names) = &self.feature_names {
            if names.iter().map(String::as_str).ne(FEATURE_NAMES) {
                return Err(ModelError::Shape(format!(
                    "scaler feature order {names:?} does not match {FEATURE_NAMES:?}"
                )));
            }
        }
        if self
            .mean
            .iter()
            .chain(&self.scale)
            .any(|v| !v.is_finite())
        {
            return Err(ModelError::Shape("scaler contains non-finite values".into()));
        }
        Ok(())
    }

    pub fn transform(&self, features: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, x) in features.iter().enumerate() {
            out[i] = (x - self.mean[i]) / self.scale[i];
        }
        out
    }
}
