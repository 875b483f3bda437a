//! In-process [`PlantStore`], for tests and `serve --in-memory`.
//!
//! Documents are kept in insertion order, which is also the order
//! [`PlantStore::find_all`] returns them in.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::{PlantDocument, PlantId, PlantUpdate};
use crate::store::PlantStore;

#[derive(Debug, Clone, Default)]
pub struct MemoryPlantStore {
    docs: Arc<RwLock<Vec<PlantDocument>>>,
}

impl MemoryPlantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait]
impl PlantStore for MemoryPlantStore {
    async fn insert(&self, mut doc: PlantDocument) -> Result<PlantId> {
        let id = match doc.id {
            Some(oid) => PlantId::from(oid),
            None => PlantId::generate(),
        };
        let mut docs = self.docs.write().await;
        if docs.iter().any(|d| d.id == Some(id.object_id())) {
            anyhow::bail!("duplicate key: plant {id} already exists");
        }
        doc.id = Some(id.object_id());
        docs.push(doc);
        Ok(id)
    }

    async fn find_all(&self) -> Result<Vec<PlantDocument>> {
        Ok(self.docs.read().await.clone())
    }

    async fn find_by_id(&self, id: &PlantId) -> Result<Option<PlantDocument>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .find(|d| d.id == Some(id.object_id()))
            .cloned())
    }

    async fn update_by_id(
        &self,
        id: &PlantId,
        update: &PlantUpdate,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.id == Some(id.object_id())) {
            Some(doc) => {
                update.apply(doc, now);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_by_id(&self, id: &PlantId) -> Result<u64> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| d.id != Some(id.object_id()));
        Ok((before - docs.len()) as u64)
    }
}
