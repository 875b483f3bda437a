//! Shared test utilities for decarbonator integration tests.
//!
//! Provides a MongoDB instance shared across tests. Each test gets its own
//! database within the instance.
//!
//! Two modes:
//! - **`DECARBONATOR_TEST_MONGO_URI`** set (CI service container): use the
//!   external server directly. No testcontainers overhead per process.
//! - **No env var** (`cargo test`): spin up a container via testcontainers,
//!   shared per binary through a `OnceCell`.

use bson::oid::ObjectId;
use mongodb::Database;
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mongo::Mongo;
use tokio::sync::OnceCell;

use decarbonator_db::config::DbConfig;
use decarbonator_db::pool;

/// Shared container state: base URI and optional container handle (kept alive).
struct SharedMongo {
    base_uri: String,
    /// Held to keep the container alive. `None` when using an external URI.
    _container: Option<ContainerAsync<Mongo>>,
}

/// Lazily-initialized shared MongoDB.
static SHARED_MONGO: OnceCell<SharedMongo> = OnceCell::const_new();

async fn init_shared_mongo() -> SharedMongo {
    if let Ok(uri) = std::env::var("DECARBONATOR_TEST_MONGO_URI") {
        return SharedMongo {
            base_uri: uri,
            _container: None,
        };
    }

    let container = Mongo::default()
        .with_tag("7.0")
        .start()
        .await
        .expect("failed to start MongoDB container");

    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(27017)
        .await
        .expect("failed to get mapped port");

    SharedMongo {
        base_uri: format!("mongodb://{host}:{port}"),
        _container: Some(container),
    }
}

/// Connection URI for the shared MongoDB.
///
/// Lazily starts a container on first call (unless
/// `DECARBONATOR_TEST_MONGO_URI` is set).
pub async fn mongo_uri() -> &'static str {
    let shared = SHARED_MONGO.get_or_init(init_shared_mongo).await;
    &shared.base_uri
}

/// Create a uniquely-named database on the shared server.
///
/// Returns `(db, db_name)`. Call [`drop_test_db`] with the returned handle
/// when the test is done.
pub async fn create_test_db() -> (Database, String) {
    let uri = mongo_uri().await;
    let db_name = format!("decarbonator_test_{}", ObjectId::new().to_hex());
    let config = DbConfig::new(uri, db_name.clone());

    let db = pool::connect(&config)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to test database {db_name}: {e:#}"));
    pool::ensure_collection(&db)
        .await
        .expect("plants collection should be created");

    (db, db_name)
}

/// Drop a temporary database. Safe to call even if it was already dropped.
pub async fn drop_test_db(db: &Database) {
    let _ = db.drop().await;
}
