//! MongoDB-backed [`PlantStore`] over the `plants` collection.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use bson::doc;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{Collection, Database};

use crate::models::{PlantDocument, PlantId, PlantUpdate};
use crate::store::PlantStore;

/// Name of the collection holding plant documents.
pub const PLANTS_COLLECTION: &str = "plants";

/// Plant store backed by a MongoDB collection.
///
/// Cloning is cheap: the underlying client is reference counted and shares
/// one connection pool.
#[derive(Debug, Clone)]
pub struct MongoPlantStore {
    collection: Collection<PlantDocument>,
}

impl MongoPlantStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(PLANTS_COLLECTION),
        }
    }
}

#[async_trait]
impl PlantStore for MongoPlantStore {
    async fn insert(&self, doc: PlantDocument) -> Result<PlantId> {
        let result = self
            .collection
            .insert_one(doc)
            .await
            .context("failed to insert plant")?;

        let oid = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("inserted plant has a non-ObjectId _id: {}", result.inserted_id))?;
        Ok(PlantId::from(oid))
    }

    async fn find_all(&self) -> Result<Vec<PlantDocument>> {
        let cursor = self
            .collection
            .find(doc! {})
            .await
            .context("failed to query plants")?;

        let plants: Vec<PlantDocument> = cursor
            .try_collect()
            .await
            .context("failed to read plants cursor")?;
        Ok(plants)
    }

    async fn find_by_id(&self, id: &PlantId) -> Result<Option<PlantDocument>> {
        let plant = self
            .collection
            .find_one(doc! { "_id": id.object_id() })
            .await
            .with_context(|| format!("failed to fetch plant {id}"))?;
        Ok(plant)
    }

    async fn update_by_id(
        &self,
        id: &PlantId,
        update: &PlantUpdate,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.object_id() },
                doc! { "$set": update.to_set_document(now) },
            )
            .await
            .with_context(|| format!("failed to update plant {id}"))?;
        Ok(result.matched_count)
    }

    async fn delete_by_id(&self, id: &PlantId) -> Result<u64> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.object_id() })
            .await
            .with_context(|| format!("failed to delete plant {id}"))?;
        Ok(result.deleted_count)
    }
}
