use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Append-only record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    CaloriePredictions,
    MealPlans,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::CaloriePredictions => "calorie_predictions",
            Collection::MealPlans => "meal_plans",
        }
    }
}

/// Returned by `insert`: the store-assigned identifier, already stringified.
#[derive(Debug, Clone)]
pub struct StoredAck {
    pub id: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub user_id: String,
    pub document: Value,
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(
        &self,
        collection: Collection,
        user_id: &str,
        document: Value,
    ) -> anyhow::Result<StoredAck>;

    /// Exact match on `user_id`, oldest first. `limit = None` returns everything.
    async fn query_by_user(
        &self,
        collection: Collection,
        user_id: &str,
        limit: Option<i64>,
    ) -> anyhow::Result<Vec<StoredDocument>>;

    async fn close(&self) {}
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    user_id: String,
    document: Value,
    created_at: OffsetDateTime,
}

impl From<DocumentRow> for StoredDocument {
    fn from(r: DocumentRow) -> Self {
        Self {
            id: r.id.to_string(),
            user_id: r.user_id,
            document: r.document,
            created_at: r.created_at,
        }
    }
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(
        &self,
        collection: Collection,
        user_id: &str,
        document: Value,
    ) -> anyhow::Result<StoredAck> {
        let (id, created_at) = sqlx::query_as::<_, (Uuid, OffsetDateTime)>(&format!(
            r#"
            INSERT INTO {} (id, user_id, document)
            VALUES ($1, $2, $3)
            RETURNING id, created_at
            "#,
            collection.name()
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(document)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("insert into {}", collection.name()))?;

        Ok(StoredAck {
            id: id.to_string(),
            created_at,
        })
    }

    async fn query_by_user(
        &self,
        collection: Collection,
        user_id: &str,
        limit: Option<i64>,
    ) -> anyhow::Result<Vec<StoredDocument>> {
        // LIMIT NULL is no limit in Postgres.
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            SELECT id, user_id, document, created_at
            FROM {}
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2
            "#,
            collection.name()
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("query {} by user", collection.name()))?;

        Ok(rows.into_iter().map(StoredDocument::from).collect())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
