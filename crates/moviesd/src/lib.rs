pub mod api;
pub mod cli;
pub mod logging;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use movies_config::{config_path, ensure_config};
use movies_service::MovieService;
use movies_store::{SeedDataset, SeedSummary, SqliteGraphStore, StaticDatabaseSelection};
use tokio::net::TcpListener;

use crate::cli::{Cli, Command, SeedArgs, ServeArgs, Settings};

pub fn run(cli: Cli) -> Result<()> {
    fs::create_dir_all(&cli.data_dir)
        .with_context(|| format!("failed to create data dir {}", cli.data_dir.display()))?;
    let config = ensure_config(&cli.data_dir).with_context(|| {
        format!(
            "failed to load or create config at {}",
            config_path(&cli.data_dir).display()
        )
    })?;
    let settings = Settings::resolve(&cli, &config);
    logging::init_logging(settings.log_format, &settings.log_filter)?;

    let store = open_store(&cli.data_dir, settings.database.clone())?;
    match cli.command.clone().unwrap_or_default() {
        Command::Seed(args) => {
            let summary = seed_store(&store, &args)?;
            println!(
                "seeded {} movies, {} people, {} relationships",
                summary.movies_added, summary.people_added, summary.relationships_added
            );
            Ok(())
        }
        Command::Serve(args) => serve(store, &settings, &args),
    }
}

pub fn open_store(data_dir: &Path, database: Option<String>) -> Result<SqliteGraphStore> {
    let label = database.clone().unwrap_or_else(|| "default".to_owned());
    SqliteGraphStore::open_with_selection(data_dir, StaticDatabaseSelection::new(database))
        .with_context(|| {
            format!(
                "failed to open database '{label}' in {}",
                data_dir.display()
            )
        })
}

fn seed_store(store: &SqliteGraphStore, args: &SeedArgs) -> Result<SeedSummary> {
    let dataset = match &args.from {
        Some(path) => load_dataset(path)?,
        None => SeedDataset::classic().context("bundled dataset is invalid")?,
    };
    store.seed(&dataset).context("failed to seed database")
}

fn load_dataset(path: &Path) -> Result<SeedDataset> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    SeedDataset::from_json(&raw).with_context(|| format!("invalid dataset {}", path.display()))
}

fn serve(store: SqliteGraphStore, settings: &Settings, args: &ServeArgs) -> Result<()> {
    if args.seed {
        seed_store(&store, &SeedArgs::default())?;
    }

    let service = Arc::new(MovieService::new(store));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async move {
        let listener = TcpListener::bind(&settings.bind)
            .await
            .with_context(|| format!("failed to bind {}", settings.bind))?;
        tracing::info!(bind = %settings.bind, "movie service listening");

        axum::serve(listener, api::router(service))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("http server failed")
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
