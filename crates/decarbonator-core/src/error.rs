//! Errors surfaced by [`crate::PlantService`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlantError {
    /// No plant matches the identifier (including identifiers that are not
    /// well-formed).
    #[error("Plant not found")]
    NotFound,

    /// Any store-level fault. `message` carries the full cause chain.
    #[error("{message}")]
    Internal { message: String },
}

impl PlantError {
    /// Wrap a store fault for the operation described by `action`
    /// (e.g. "creating plant").
    pub fn internal(action: &str, err: &anyhow::Error) -> Self {
        Self::Internal {
            message: format!("Error {action}: {err:#}"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
