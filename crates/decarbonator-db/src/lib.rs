//! Document-store access for plant records.
//!
//! Holds the plant data model, the [`store::PlantStore`] collaborator trait
//! and its two implementations: MongoDB ([`queries::plants::MongoPlantStore`])
//! and in-process ([`memory::MemoryPlantStore`]).

pub mod config;
pub mod memory;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;
