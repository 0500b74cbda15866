use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of `GET /mealplanner/generate?timeFrame=week`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WeeklyPlan {
    #[serde(default)]
    pub week: Option<BTreeMap<String, DayPlan>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DayPlan {
    #[serde(default)]
    pub meals: Vec<PlannedMeal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrients: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlannedMeal {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl WeeklyPlan {
    /// True when the upstream returned no days at all.
    pub fn is_empty(&self) -> bool {
        self.week.as_ref().map_or(true, BTreeMap::is_empty)
    }

    /// Every recipe id referenced by any day; order is unspecified.
    pub fn recipe_ids(&self) -> Vec<u64> {
        self.week
            .iter()
            .flat_map(|week| week.values())
            .flat_map(|day| day.meals.iter().map(|m| m.id))
            .collect()
    }
}

/// Outcome of the recipe detail fan-out: successes and the ids that failed.
#[derive(Debug, Clone, Default)]
pub struct RecipeFetch {
    pub recipes: Vec<Value>,
    pub failed: Vec<u64>,
}
