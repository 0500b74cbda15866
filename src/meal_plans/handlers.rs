use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use tracing::{info, instrument, warn};

use super::dto::{MealPlan, MealPlanRequest, MealPlanResult, UserQuery};
use crate::{
    error::ApiError,
    records::{list_for_user, persist},
    state::AppState,
    store::Collection,
};

const NO_MEALS: &str = "No meals found. Try relaxing your filters.";

/// POST /meal-plan?user_id=...
#[instrument(skip(state, query, payload))]
pub async fn create_meal_plan(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
    payload: Result<Json<MealPlanRequest>, JsonRejection>,
) -> Result<Json<MealPlanResult>, ApiError> {
    let Query(UserQuery { user_id }) = query?;
    let Json(request) = payload?;

    let plan = state
        .planner
        .generate_meal_plan(
            request.diet_type.as_deref(),
            request.max_calories,
            request.intolerances.as_deref().unwrap_or(&[]),
        )
        .await?;

    if plan.is_empty() {
        info!(%user_id, "meal plan came back empty");
        return Err(ApiError::NotFound(NO_MEALS.into()));
    }

    let recipe_ids = plan.recipe_ids();
    let fetch = state.planner.fetch_recipe_details(&recipe_ids).await;
    if !fetch.failed.is_empty() {
        warn!(
            %user_id,
            requested = recipe_ids.len(),
            failed = ?fetch.failed,
            "some recipe details are missing from the plan"
        );
    }

    let meal_plan = MealPlan {
        user_id: user_id.clone(),
        request_data: request,
        recipes: fetch.recipes,
        missing_recipe_ids: fetch.failed,
    };
    let record = persist(
        state.store.as_ref(),
        Collection::MealPlans,
        &user_id,
        meal_plan,
    )
    .await?;

    info!(id = %record.id, %user_id, recipes = record.body.recipes.len(), "meal plan stored");
    Ok(Json(record))
}

/// GET /user/meals/:user_id
#[instrument(skip(state))]
pub async fn list_user_meal_plans(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<MealPlanResult>>, ApiError> {
    let records = list_for_user(
        state.store.as_ref(),
        Collection::MealPlans,
        &user_id,
        state.config.limits.meal_plans,
    )
    .await?;
    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::app::testing::{get, post_json};
    use crate::state::AppState;
    use crate::store::memory::MemoryStore;
    use crate::store::Collection;

    async fn mount_plan(server: &MockServer, plan: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/mealplanner/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(plan))
            .mount(server)
            .await;
    }

    async fn mount_recipe(server: &MockServer, id: u64, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/recipes/{id}/information")))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({ "id": id, "title": "dish" })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn builds_and_persists_plan_with_recipe_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mealplanner/generate"))
            .and(query_param("diet", "vegan"))
            .and(query_param("targetCalories", "1800"))
            .and(query_param("intolerances", "peanut"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "week": {
                    "monday": {"meals": [{"id": 1}, {"id": 2}]},
                    "tuesday": {"meals": [{"id": 3}]}
                }
            })))
            .mount(&server)
            .await;
        for id in [1, 2, 3] {
            mount_recipe(&server, id, 200).await;
        }

        let store = Arc::new(MemoryStore::default());
        let state = AppState::fake(store.clone(), &server.uri());
        let request = json!({
            "diet_type": "vegan",
            "max_calories": 1800,
            "intolerances": ["peanut"],
            "meal_type": "dinner"
        });

        let (status, body) = post_json(state.clone(), "/meal-plan?user_id=u42", request.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], "u42");
        assert_eq!(body["request_data"], request);
        assert_eq!(body["recipes"].as_array().unwrap().len(), 3);
        assert_eq!(body["missing_recipe_ids"], json!([]));
        assert_eq!(store.count(Collection::MealPlans).await, 1);

        let (status, listed) = get(state, "/user/meals/u42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["_id"], body["_id"]);
    }

    #[tokio::test]
    async fn partial_recipe_failures_still_succeed() {
        let server = MockServer::start().await;
        mount_plan(
            &server,
            json!({ "week": { "friday": {"meals": [{"id": 7}, {"id": 8}, {"id": 9}]} } }),
        )
        .await;
        mount_recipe(&server, 7, 200).await;
        mount_recipe(&server, 8, 500).await;
        mount_recipe(&server, 9, 200).await;

        let store = Arc::new(MemoryStore::default());
        let (status, body) = post_json(
            AppState::fake(store.clone(), &server.uri()),
            "/meal-plan?user_id=u1",
            json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recipes"].as_array().unwrap().len(), 2);
        assert_eq!(body["missing_recipe_ids"], json!([8]));
        assert_eq!(store.count(Collection::MealPlans).await, 1);
    }

    #[tokio::test]
    async fn empty_week_is_not_found_and_not_persisted() {
        let server = MockServer::start().await;
        mount_plan(&server, json!({ "week": {} })).await;

        let store = Arc::new(MemoryStore::default());
        let (status, body) = post_json(
            AppState::fake(store.clone(), &server.uri()),
            "/meal-plan?user_id=u1",
            json!({ "diet_type": "carnivore" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "No meals found. Try relaxing your filters.");
        assert_eq!(store.count(Collection::MealPlans).await, 0);
    }

    #[tokio::test]
    async fn week_without_meals_is_stored_with_no_recipes() {
        let server = MockServer::start().await;
        mount_plan(&server, json!({ "week": { "monday": { "meals": [] } } })).await;

        let store = Arc::new(MemoryStore::default());
        let (status, body) = post_json(
            AppState::fake(store.clone(), &server.uri()),
            "/meal-plan?user_id=u1",
            json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recipes"], json!([]));
        assert_eq!(body["missing_recipe_ids"], json!([]));
        assert_eq!(store.count(Collection::MealPlans).await, 1);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1, "no recipe lookups expected");
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_bad_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mealplanner/generate"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::default());
        let (status, body) = post_json(
            AppState::fake(store.clone(), &server.uri()),
            "/meal-plan?user_id=u1",
            json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Spoonacular API error: HTTP 401");
        assert_eq!(store.count(Collection::MealPlans).await, 0);
    }

    #[tokio::test]
    async fn unreachable_upstream_maps_to_bad_request() {
        let store = Arc::new(MemoryStore::default());
        let (status, body) = post_json(
            AppState::fake(store, "http://127.0.0.1:9"),
            "/meal-plan?user_id=u1",
            json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Spoonacular API error: service unreachable");
    }

    #[tokio::test]
    async fn missing_user_id_is_a_validation_error() {
        let server = MockServer::start().await;
        let (status, _) = post_json(
            AppState::fake(Arc::new(MemoryStore::default()), &server.uri()),
            "/meal-plan",
            json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn meal_listing_for_unknown_user_is_empty() {
        let state = AppState::fake(Arc::new(MemoryStore::default()), "http://127.0.0.1:9");
        let (status, body) = get(state, "/user/meals/ghost").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }
}
