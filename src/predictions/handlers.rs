use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tracing::{info, instrument};

use super::dto::{CaloriePrediction, CaloriePredictionInput, CaloriePredictionResult};
use crate::{
    error::ApiError,
    records::{list_for_user, persist},
    state::AppState,
    store::Collection,
};

/// POST /predict-calories
#[instrument(skip(state, payload))]
pub async fn predict_calories(
    State(state): State<AppState>,
    payload: Result<Json<CaloriePredictionInput>, JsonRejection>,
) -> Result<Json<CaloriePredictionResult>, ApiError> {
    let Json(input) = payload?;

    let predictor = state.predictor.clone();
    let features = input.features();
    let predicted_calories = tokio::task::spawn_blocking(move || predictor.predict(&features))
        .await
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e).context("inference task")))??;

    let prediction = CaloriePrediction {
        user_id: input.user_id.clone(),
        input_data: input,
        predicted_calories,
    };
    let record = persist(
        state.store.as_ref(),
        Collection::CaloriePredictions,
        &prediction.user_id,
        prediction.clone(),
    )
    .await?;

    info!(id = %record.id, user_id = %record.body.user_id, predicted_calories, "prediction stored");
    Ok(Json(record))
}

/// GET /user/predictions/:user_id
#[instrument(skip(state))]
pub async fn list_user_predictions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CaloriePredictionResult>>, ApiError> {
    let records = list_for_user(
        state.store.as_ref(),
        Collection::CaloriePredictions,
        &user_id,
        state.config.limits.predictions,
    )
    .await?;
    Ok(Json(records))
}
