use std::time::Duration;

use anyhow::{Context, Result};
use bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::info;

use crate::config::DbConfig;
use crate::queries::plants::PLANTS_COLLECTION;

/// Create a client (the driver pools connections internally) and return a
/// handle to the configured database.
///
/// The returned handle is cheap to clone and meant to be created once per
/// process.
pub async fn connect(config: &DbConfig) -> Result<Database> {
    let mut options = ClientOptions::parse(&config.mongo_uri)
        .await
        .with_context(|| format!("failed to parse MongoDB URI {}", config.redacted_uri()))?;
    options.app_name = Some("decarbonator".to_owned());
    options.server_selection_timeout = Some(Duration::from_secs(10));

    let client = Client::with_options(options).context("failed to create MongoDB client")?;
    Ok(client.database(&config.database))
}

/// Round-trip a `ping` to verify the server is reachable.
pub async fn ping(db: &Database) -> Result<()> {
    db.run_command(doc! { "ping": 1 })
        .await
        .with_context(|| format!("failed to ping MongoDB database {}", db.name()))?;
    Ok(())
}

/// Ensure the `plants` collection exists, creating it if necessary.
///
/// MongoDB creates collections lazily on first insert; creating it up front
/// makes an empty deployment visible to tooling.
pub async fn ensure_collection(db: &Database) -> Result<()> {
    let names = db
        .list_collection_names()
        .await
        .context("failed to list collections")?;

    if names.iter().any(|n| n == PLANTS_COLLECTION) {
        info!(db = db.name(), "plants collection already exists");
    } else {
        db.create_collection(PLANTS_COLLECTION)
            .await
            .with_context(|| format!("failed to create collection {PLANTS_COLLECTION}"))?;
        info!(db = db.name(), "plants collection created");
    }
    Ok(())
}

/// Return the number of documents in the `plants` collection.
pub async fn plant_count(db: &Database) -> Result<u64> {
    db.collection::<bson::Document>(PLANTS_COLLECTION)
        .count_documents(doc! {})
        .await
        .context("failed to count plants")
}
