mod config;
mod plant_cmds;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use decarbonator_core::PlantService;
use decarbonator_db::memory::MemoryPlantStore;
use decarbonator_db::pool;
use decarbonator_db::queries::plants::MongoPlantStore;
use decarbonator_db::store::PlantStore;

use config::DecarbonatorConfig;

#[derive(Parser)]
#[command(name = "decarbonator", about = "Houseplant tracking API over MongoDB")]
struct Cli {
    /// MongoDB connection string (overrides DECARBONATOR_MONGO_URI env var)
    #[arg(long, global = true)]
    mongo_uri: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a decarbonator config file (no database required)
    Init {
        /// MongoDB connection string to store
        #[arg(long, default_value = "mongodb://localhost:27017")]
        db_url: String,
        /// Database name to store
        #[arg(long, default_value = "decarbonator")]
        db_name: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Verify the database connection and create the plants collection
    DbInit,
    /// Serve the plants HTTP API
    Serve {
        /// Address to bind (default: config file, then 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (default: config file, then 8000)
        #[arg(long)]
        port: Option<u16>,
        /// Keep plants in process memory instead of MongoDB
        #[arg(long)]
        in_memory: bool,
    },
    /// Plant management
    Plant {
        #[command(subcommand)]
        command: PlantCommands,
    },
}

#[derive(Subcommand)]
pub enum PlantCommands {
    /// Add a new plant
    Add {
        /// Plant name
        #[arg(long)]
        name: String,
        /// Plant species
        #[arg(long)]
        species: String,
        #[command(flatten)]
        fields: PlantFields,
    },
    /// List all plants
    List,
    /// Show one plant
    Show {
        /// Plant ID
        plant_id: String,
    },
    /// Update the given fields of a plant
    Update {
        /// Plant ID
        plant_id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New species
        #[arg(long)]
        species: Option<String>,
        #[command(flatten)]
        fields: PlantFields,
    },
    /// Remove a plant
    Remove {
        /// Plant ID
        plant_id: String,
    },
}

/// Optional plant fields shared by `add` and `update`.
#[derive(Args, Debug, Default)]
pub struct PlantFields {
    /// Connection status (e.g. online, offline)
    #[arg(long)]
    status: Option<String>,
    /// Health description
    #[arg(long)]
    health: Option<String>,
    /// Last watering note
    #[arg(long)]
    water: Option<String>,
    /// Image URL
    #[arg(long)]
    image: Option<String>,
    /// Age in months
    #[arg(long)]
    age_months: Option<i64>,
}

/// Execute the `decarbonator init` command: write config file.
fn cmd_init(db_url: &str, db_name: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
            name: db_name.to_string(),
        },
        server: config::ServerSection::default(),
    };

    config::save_config_to(&cfg, &path)?;

    println!("Config written to {}", path.display());
    println!("  database.name = {db_name}");
    println!("  server        = {}:{}", cfg.server.bind, cfg.server.port);
    println!();
    println!("Next: run `decarbonator db-init` to verify the database.");

    Ok(())
}

/// Execute the `decarbonator db-init` command: ping, create the collection,
/// report the document count.
async fn cmd_db_init(cli_mongo_uri: Option<&str>) -> anyhow::Result<()> {
    let resolved = DecarbonatorConfig::resolve(cli_mongo_uri)?;

    println!(
        "Initializing database {} at {}...",
        resolved.db_config.database,
        resolved.db_config.redacted_uri()
    );

    let db = pool::connect(&resolved.db_config).await?;
    pool::ping(&db).await?;
    pool::ensure_collection(&db).await?;
    let count = pool::plant_count(&db).await?;

    println!("Database ready. plants: {count} document(s)");
    Ok(())
}

/// Build the store once for the whole process and wrap it in the service.
async fn build_service(
    resolved: &DecarbonatorConfig,
    in_memory: bool,
) -> anyhow::Result<PlantService> {
    let store: Arc<dyn PlantStore> = if in_memory {
        tracing::warn!("using in-memory store; plants are lost on exit");
        Arc::new(MemoryPlantStore::new())
    } else {
        let db = pool::connect(&resolved.db_config).await?;
        pool::ping(&db).await?;
        tracing::info!(
            uri = %resolved.db_config.redacted_uri(),
            db = %resolved.db_config.database,
            "connected to MongoDB"
        );
        Arc::new(MongoPlantStore::new(&db))
    };
    Ok(PlantService::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            db_name,
            force,
        } => {
            cmd_init(&db_url, &db_name, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.mongo_uri.as_deref()).await?;
        }
        Commands::Serve {
            bind,
            port,
            in_memory,
        } => {
            let resolved = DecarbonatorConfig::resolve(cli.mongo_uri.as_deref())?;
            let service = build_service(&resolved, in_memory).await?;
            let bind = bind.unwrap_or_else(|| resolved.server.bind.clone());
            let port = port.unwrap_or(resolved.server.port);
            serve_cmd::run_serve(service, &bind, port).await?;
        }
        Commands::Plant { command } => {
            let resolved = DecarbonatorConfig::resolve(cli.mongo_uri.as_deref())?;
            let service = build_service(&resolved, false).await?;
            plant_cmds::run_plant_command(command, &service).await?;
        }
    }

    Ok(())
}
