use futures_util::future::join_all;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::dto::{RecipeFetch, WeeklyPlan};
use super::PlannerError;
use crate::config::SpoonacularConfig;

/// Client for the Spoonacular meal planner and recipe endpoints.
#[derive(Clone)]
pub struct SpoonacularClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl SpoonacularClient {
    pub fn new(config: &SpoonacularConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
        }
    }

    /// Generate a one-week plan. Absent, empty or zero filters are left out of the query.
    #[instrument(skip(self, intolerances), fields(intolerances = intolerances.len()))]
    pub async fn generate_meal_plan(
        &self,
        diet: Option<&str>,
        target_calories: Option<i64>,
        intolerances: &[String],
    ) -> Result<WeeklyPlan, PlannerError> {
        let mut params: Vec<(&str, String)> = vec![
            ("apiKey", self.api_key.clone()),
            ("timeFrame", "week".to_owned()),
        ];
        if let Some(diet) = diet.filter(|d| !d.is_empty()) {
            params.push(("diet", diet.to_owned()));
        }
        if let Some(calories) = target_calories.filter(|c| *c != 0) {
            params.push(("targetCalories", calories.to_string()));
        }
        if !intolerances.is_empty() {
            params.push(("intolerances", intolerances.join(",")));
        }

        let url = format!("{}/mealplanner/generate", self.base_url);
        self.get_json(&url, &params).await
    }

    /// Fetch `/recipes/{id}/information` for every id concurrently.
    /// Failed lookups are reported in `RecipeFetch::failed`, never as an overall error.
    #[instrument(skip(self, recipe_ids), fields(requested = recipe_ids.len()))]
    pub async fn fetch_recipe_details(&self, recipe_ids: &[u64]) -> RecipeFetch {
        let params = [("apiKey", self.api_key.clone())];
        let lookups = recipe_ids.iter().map(|&id| {
            let url = format!("{}/recipes/{id}/information", self.base_url);
            let params = &params;
            async move { (id, self.get_json::<Value>(&url, params).await) }
        });

        let mut fetch = RecipeFetch::default();
        for (id, result) in join_all(lookups).await {
            match result {
                Ok(recipe) => fetch.recipes.push(recipe),
                Err(e) => {
                    warn!(recipe_id = id, error = %e, "recipe detail fetch failed; skipping");
                    fetch.failed.push(id);
                }
            }
        }
        debug!(
            fetched = fetch.recipes.len(),
            failed = fetch.failed.len(),
            "recipe details collected"
        );
        fetch
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, PlannerError> {
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(PlannerError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlannerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| PlannerError::Decode(e.to_string()))
    }
}
