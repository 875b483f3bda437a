use std::env;

/// Database configuration.
///
/// Reads from the `DECARBONATOR_MONGO_URI` and `DECARBONATOR_DATABASE`
/// environment variables, falling back to a local MongoDB and the
/// `decarbonator` database when unset.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// MongoDB connection string.
    pub mongo_uri: String,
    /// Name of the database holding the `plants` collection.
    pub database: String,
}

impl DbConfig {
    /// The default connection string used when no environment variable is set.
    pub const DEFAULT_URI: &str = "mongodb://localhost:27017";

    /// The default database name.
    pub const DEFAULT_DATABASE: &str = "decarbonator";

    /// Build a config from the environment.
    pub fn from_env() -> Self {
        let mongo_uri =
            env::var("DECARBONATOR_MONGO_URI").unwrap_or_else(|_| Self::DEFAULT_URI.to_owned());
        let database = env::var("DECARBONATOR_DATABASE")
            .unwrap_or_else(|_| Self::DEFAULT_DATABASE.to_owned());
        Self {
            mongo_uri,
            database,
        }
    }

    /// Build a config from an explicit URI and database name (useful for
    /// tests and CLI flags).
    pub fn new(mongo_uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            mongo_uri: mongo_uri.into(),
            database: database.into(),
        }
    }

    /// Return the connection string with any credentials masked, for logging.
    pub fn redacted_uri(&self) -> String {
        let Some(scheme_end) = self.mongo_uri.find("://") else {
            return self.mongo_uri.clone();
        };
        let rest = &self.mongo_uri[scheme_end + 3..];
        let authority_end = rest.find('/').unwrap_or(rest.len());
        match rest[..authority_end].rfind('@') {
            Some(at) => format!(
                "{}://***@{}",
                &self.mongo_uri[..scheme_end],
                &rest[at + 1..]
            ),
            None => self.mongo_uri.clone(),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
