use anyhow::Context;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use time::OffsetDateTime;

use crate::store::{Collection, DocumentStore};

/// A persisted, write-once record: store-assigned id and creation time around a body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub body: T,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

pub async fn persist<T: Serialize>(
    store: &dyn DocumentStore,
    collection: Collection,
    user_id: &str,
    body: T,
) -> anyhow::Result<Record<T>> {
    let document = serde_json::to_value(&body)
        .with_context(|| format!("serialize {} record", collection.name()))?;
    let ack = store.insert(collection, user_id, document).await?;
    Ok(Record {
        id: ack.id,
        body,
        timestamp: ack.created_at,
    })
}

pub async fn list_for_user<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    user_id: &str,
    limit: Option<i64>,
) -> anyhow::Result<Vec<Record<T>>> {
    store
        .query_by_user(collection, user_id, limit)
        .await?
        .into_iter()
        .map(|doc| -> anyhow::Result<Record<T>> {
            let body = serde_json::from_value(doc.document)
                .with_context(|| format!("decode {} record {}", collection.name(), doc.id))?;
            Ok(Record {
                id: doc.id,
                body,
                timestamp: doc.created_at,
            })
        })
        .collect()
}
