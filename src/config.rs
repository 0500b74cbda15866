use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub name: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub model_path: String,
    pub scaler_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpoonacularConfig {
    pub api_key: String,
    pub base_url: String,
}

/// Per-collection result caps for the read-through endpoints. `None` means uncapped.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryLimits {
    pub predictions: Option<i64>,
    pub meal_plans: Option<i64>,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            predictions: Some(100),
            meal_plans: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub model: ModelConfig,
    pub spoonacular: SpoonacularConfig,
    pub limits: QueryLimits,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
            name: std::env::var("DATABASE_NAME").ok().filter(|v| !v.is_empty()),
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
        };
        let model = ModelConfig {
            model_path: std::env::var("CALORIE_MODEL_PATH")
                .context("CALORIE_MODEL_PATH is not set")?,
            scaler_path: std::env::var("CALORIE_SCALER_PATH")
                .unwrap_or_else(|_| "std_scaler.json".into()),
        };
        let spoonacular = SpoonacularConfig {
            api_key: std::env::var("SPOONACULAR_API_KEY")
                .context("SPOONACULAR_API_KEY is not set")?,
            base_url: std::env::var("SPOONACULAR_BASE_URL")
                .unwrap_or_else(|_| "https://api.spoonacular.com".into()),
        };
        let defaults = QueryLimits::default();
        let limits = QueryLimits {
            predictions: parse_limit("PREDICTIONS_QUERY_LIMIT")?.or(defaults.predictions),
            meal_plans: parse_limit("MEAL_PLANS_QUERY_LIMIT")?.or(defaults.meal_plans),
        };
        Ok(Self {
            database,
            model,
            spoonacular,
            limits,
        })
    }
}

fn parse_limit(key: &str) -> anyhow::Result<Option<i64>> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => {
            let limit = v
                .trim()
                .parse::<i64>()
                .with_context(|| format!("{key} must be an integer"))?;
            anyhow::ensure!(limit > 0, "{key} must be positive");
            Ok(Some(limit))
        }
        _ => Ok(None),
    }
}
