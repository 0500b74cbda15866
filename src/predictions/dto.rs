use serde::{de, Deserialize, Deserializer, Serialize};

use crate::model::FEATURE_COUNT;
use crate::records::Record;

/// Biometric inputs for one workout. Values are not range-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaloriePredictionInput {
    pub user_id: String,
    #[serde(deserialize_with = "integral")]
    pub gender: i32, // 0 = male, 1 = female
    pub age: f64,
    pub height: f64,
    pub weight: f64,
    pub duration: f64,
    pub heart_rate: f64,
    pub body_temp: f64,
}

impl CaloriePredictionInput {
    /// Feature vector in training column order.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.gender),
            self.age,
            self.height,
            self.weight,
            self.duration,
            self.heart_rate,
            self.body_temp,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaloriePrediction {
    pub user_id: String,
    pub input_data: CaloriePredictionInput,
    pub predicted_calories: f64,
}

pub type CaloriePredictionResult = Record<CaloriePrediction>;

/// Accepts an integer, a float with no fractional part (`1.0`), or an integer string.
fn integral<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let wide = match Number::deserialize(deserializer)? {
        Number::Int(v) => v,
        Number::Float(v) if v.is_finite() && v.fract() == 0.0 => v as i64,
        Number::Float(v) => {
            return Err(de::Error::custom(format!("expected an integer, got {v}")));
        }
        Number::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("expected an integer, got {s:?}")))?,
    };
    i32::try_from(wide).map_err(|_| de::Error::custom(format!("integer {wide} out of range")))
}
