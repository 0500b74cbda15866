use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::debug;

use super::{ModelError, Regressor, FEATURE_COUNT};

/// Pretrained regressor exported to ONNX, evaluated with ONNX Runtime.
pub struct OnnxRegressor {
    // `Session::run` takes `&mut self`.
    session: Mutex<Session>,
}

impl OnnxRegressor {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::Io {
                artifact: "model",
                path: path.display().to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        let session = Session::builder()
            .map_err(|e| ModelError::Runtime(e.to_string()))?
            .with_intra_threads(1)
            .map_err(|e| ModelError::Runtime(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| ModelError::Parse {
                artifact: "model",
                reason: e.to_string(),
            })?;
        debug!(model = %path.display(), "onnx session ready");
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl Regressor for OnnxRegressor {
    fn predict_row(&self, row: &[f32; FEATURE_COUNT]) -> Result<f32, ModelError> {
        let input = Tensor::from_array((vec![1i64, FEATURE_COUNT as i64], row.to_vec()))
            .map_err(|e| ModelError::Runtime(format!("tensor creation error: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ModelError::Runtime(format!("session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| ModelError::Runtime(e.to_string()))?;

        let (_name, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| ModelError::Shape("model produced no output tensor".into()))?;
        let (_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Shape(format!("output is not a float tensor: {e}")))?;
        data.first()
            .copied()
            .ok_or_else(|| ModelError::Shape("model produced an empty output tensor".into()))
    }
}
