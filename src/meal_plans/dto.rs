use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::Record;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanRequest {
    pub diet_type: Option<String>,
    pub max_calories: Option<i64>,
    pub intolerances: Option<Vec<String>>,
    pub meal_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlan {
    pub user_id: String,
    pub request_data: MealPlanRequest,
    pub recipes: Vec<Value>,
    /// Recipes referenced by the plan whose details could not be fetched.
    #[serde(default)]
    pub missing_recipe_ids: Vec<u64>,
}

pub type MealPlanResult = Record<MealPlan>;
