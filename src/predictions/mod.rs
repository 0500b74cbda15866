mod dto;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/predict-calories", post(handlers::predict_calories))
        .route(
            "/user/predictions/:user_id",
            get(handlers::list_user_predictions),
        )
}
