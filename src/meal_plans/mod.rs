mod dto;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/meal-plan", post(handlers::create_meal_plan))
        .route("/user/meals/:user_id", get(handlers::list_user_meal_plans))
}
