//! The `PlantStore` trait -- the document-store interface the service
//! consumes.
//!
//! Every method addresses the single logical `plants` collection. Faults
//! (connectivity, malformed queries) surface as `Err`; "nothing matched" is
//! never an error here and is reported through `Option` or a count.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{PlantDocument, PlantId, PlantUpdate};

#[async_trait]
pub trait PlantStore: Send + Sync {
    /// Insert a new document and return the identifier the store assigned.
    async fn insert(&self, doc: PlantDocument) -> Result<PlantId>;

    /// Every document in the collection, in store-native order.
    async fn find_all(&self) -> Result<Vec<PlantDocument>>;

    async fn find_by_id(&self, id: &PlantId) -> Result<Option<PlantDocument>>;

    /// Apply `update` to the matching document and set `updated_at` to `now`.
    ///
    /// Returns the number of documents the filter matched (0 or 1).
    async fn update_by_id(
        &self,
        id: &PlantId,
        update: &PlantUpdate,
        now: DateTime<Utc>,
    ) -> Result<u64>;

    /// Returns the number of documents removed (0 or 1).
    async fn delete_by_id(&self, id: &PlantId) -> Result<u64>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn PlantStore) {}
};
