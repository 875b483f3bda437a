//! Plant service layer.
//!
//! Translates the five API operations into document-store calls and shapes
//! the results into [`Plant`] values. Store faults are caught here and
//! turned into [`PlantError::Internal`]; an identifier that does not parse
//! is reported as [`PlantError::NotFound`], like any other unknown id.

use std::sync::Arc;

use tracing::{debug, error, info};

use decarbonator_db::models::{
    self, DeleteConfirmation, NewPlant, Plant, PlantDocument, PlantId, PlantUpdate,
};
use decarbonator_db::store::PlantStore;

use crate::error::PlantError;

/// CRUD operations over a shared [`PlantStore`].
///
/// Cloning is cheap; every clone talks to the same store handle.
#[derive(Clone)]
pub struct PlantService {
    store: Arc<dyn PlantStore>,
}

impl PlantService {
    pub fn new(store: Arc<dyn PlantStore>) -> Self {
        Self { store }
    }

    /// Create a plant, filling defaults for omitted fields.
    pub async fn create(&self, input: NewPlant) -> Result<Plant, PlantError> {
        const ACTION: &str = "creating plant";

        let mut doc = input.into_document(models::now());
        let id = self
            .store
            .insert(doc.clone())
            .await
            .map_err(|e| fault(ACTION, &e))?;
        doc.id = Some(id.object_id());

        info!(plant_id = %id, name = %doc.name, "plant created");
        to_plant(ACTION, doc)
    }

    /// Every stored plant, in store-native order.
    pub async fn list_all(&self) -> Result<Vec<Plant>, PlantError> {
        const ACTION: &str = "getting plants";

        let docs = self
            .store
            .find_all()
            .await
            .map_err(|e| fault(ACTION, &e))?;
        docs.into_iter().map(|doc| to_plant(ACTION, doc)).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Plant, PlantError> {
        const ACTION: &str = "getting plant";

        let id = parse_id(id)?;
        let doc = self
            .store
            .find_by_id(&id)
            .await
            .map_err(|e| fault(ACTION, &e))?
            .ok_or_else(|| not_found(&id))?;
        to_plant(ACTION, doc)
    }

    /// Apply a sparse update and return the plant as stored afterwards.
    ///
    /// `updated_at` is refreshed even when `update` carries no fields.
    pub async fn update(&self, id: &str, update: PlantUpdate) -> Result<Plant, PlantError> {
        const ACTION: &str = "updating plant";

        let id = parse_id(id)?;
        let matched = self
            .store
            .update_by_id(&id, &update, models::now())
            .await
            .map_err(|e| fault(ACTION, &e))?;
        if matched == 0 {
            return Err(not_found(&id));
        }

        // Deleted between the update and the re-read.
        let doc = self
            .store
            .find_by_id(&id)
            .await
            .map_err(|e| fault(ACTION, &e))?
            .ok_or_else(|| not_found(&id))?;

        info!(plant_id = %id, "plant updated");
        to_plant(ACTION, doc)
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteConfirmation, PlantError> {
        const ACTION: &str = "deleting plant";

        let raw_id = id;
        let id = parse_id(raw_id)?;
        let deleted = self
            .store
            .delete_by_id(&id)
            .await
            .map_err(|e| fault(ACTION, &e))?;
        if deleted == 0 {
            return Err(not_found(&id));
        }

        info!(plant_id = %id, "plant deleted");
        Ok(DeleteConfirmation::new(raw_id))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_id(raw: &str) -> Result<PlantId, PlantError> {
    raw.parse().map_err(|e| {
        debug!(error = %e, "rejecting malformed plant id as not found");
        PlantError::NotFound
    })
}

fn not_found(id: &PlantId) -> PlantError {
    debug!(plant_id = %id, "plant not found");
    PlantError::NotFound
}

fn fault(action: &str, err: &anyhow::Error) -> PlantError {
    error!(error = %format!("{err:#}"), "store fault while {action}");
    PlantError::internal(action, err)
}

fn to_plant(action: &str, doc: PlantDocument) -> Result<Plant, PlantError> {
    Plant::try_from(doc).map_err(|e| fault(action, &anyhow::Error::new(e)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
