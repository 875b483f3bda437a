//! Plant service: the five CRUD operations over a [`PlantStore`].
//!
//! [`PlantStore`]: decarbonator_db::store::PlantStore

pub mod error;
pub mod service;

pub use error::PlantError;
pub use service::PlantService;
