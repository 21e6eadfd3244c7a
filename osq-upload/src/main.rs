//! osq-upload - note upload and traffic-flow segment command line tool
//!
//! Subcommands:
//! - `upload`: drain the pending note queue once (Ctrl+C cancels after the
//!   note in flight)
//! - `segments --bbox min_lat,min_lon,max_lat,max_lon`: fetch traffic-flow
//!   segments and print the segment count per way
//! - `queue`: list pending notes

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use osq_common::config::{database_path, ConfigResolver, TomlConfig, ENV_CONFIG_PATH, ENV_ROOT_FOLDER};
use osq_common::events::{EventBus, UploadEvent};
use osq_common::BoundingBox;
use osq_upload::db::{note_queue, MAX_LOCK_WAIT_SETTING};
use osq_upload::remote::{OsmApiClient, PhotoServiceClient};
use osq_upload::services::{SegmentFetcher, UploadCoordinator, UploadSettings};
use sqlx::SqlitePool;
use tokio::signal;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for osq-upload
#[derive(Parser, Debug)]
#[command(name = "osq-upload")]
#[command(about = "Uploads queued OSM notes and fetches one-way traffic-flow segments")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = ENV_CONFIG_PATH)]
    config: Option<PathBuf>,

    /// Folder holding the database
    #[arg(short, long, env = ENV_ROOT_FOLDER)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload all pending notes once
    Upload,
    /// Fetch traffic-flow segments within a bounding box
    Segments {
        /// min_lat,min_lon,max_lat,max_lon
        #[arg(long)]
        bbox: BoundingBox,
    },
    /// List pending notes
    Queue,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new()
        .with_config_path(args.config.clone())
        .with_root_folder(args.root_folder.clone());
    let config = resolver.resolve().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("osq_upload={0},osq_common={0}", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting osq-upload {}", env!("CARGO_PKG_VERSION"));
    match resolver.config_path().filter(|path| path.exists()) {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }

    match args.command {
        Command::Upload => {
            let pool = open_database(&resolver, &config).await?;
            run_upload(pool, &config).await
        }
        Command::Segments { bbox } => run_segments(&config, &bbox).await,
        Command::Queue => {
            let pool = open_database(&resolver, &config).await?;
            run_queue(&pool).await
        }
    }
}

async fn open_database(resolver: &ConfigResolver, config: &TomlConfig) -> Result<SqlitePool> {
    let root_folder = resolver.resolve_root_folder(config);
    std::fs::create_dir_all(&root_folder).with_context(|| {
        format!("Failed to create root folder {}", root_folder.display())
    })?;

    let db_path = database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let pool = osq_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    osq_common::db::set_setting(
        &pool,
        MAX_LOCK_WAIT_SETTING,
        &config.upload.db_max_lock_wait_ms.to_string(),
    )
    .await
    .context("Failed to store lock wait setting")?;

    Ok(pool)
}

async fn run_upload(pool: SqlitePool, config: &TomlConfig) -> Result<()> {
    let osm = Arc::new(OsmApiClient::from_config(config).context("Failed to create OSM API client")?);
    let photos = Arc::new(
        PhotoServiceClient::from_config(config).context("Failed to create photo service client")?,
    );

    let event_bus = EventBus::default();
    let events = event_bus.subscribe();
    let printer = tokio::spawn(print_events(events, std::io::stdout()));

    let coordinator = UploadCoordinator::new(
        pool,
        osm.clone(),
        osm,
        photos,
        event_bus,
        UploadSettings::from_config(config),
    );

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, finishing current note");
            ctrl_c_token.cancel();
        }
    });

    let summary = coordinator.upload(&cancel).await.context("Upload failed")?;
    drop(coordinator);
    let _ = printer.await;

    info!(
        uploaded = summary.uploaded,
        discarded = summary.discarded,
        failed = summary.failed,
        cancelled = summary.cancelled,
        "Done"
    );
    Ok(())
}

/// Write each upload event as a JSON line until the event bus closes
async fn print_events<W: Write>(mut events: broadcast::Receiver<UploadEvent>, mut out: W) -> W {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Ok(line) = serde_json::to_string(&event) {
                    let _ = writeln!(out, "{}", line);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Event printer lagged, {} event(s) skipped", skipped);
            }
            Err(RecvError::Closed) => {
                debug!("Event bus closed, event printer stopping");
                break;
            }
        }
    }
    out
}

async fn run_segments(config: &TomlConfig, bbox: &BoundingBox) -> Result<()> {
    let fetcher = SegmentFetcher::from_config(config).context("Failed to create segment fetcher")?;
    let segments = fetcher.fetch(bbox).await.context("Failed to fetch segments")?;

    let mut way_ids: Vec<_> = segments.keys().copied().collect();
    way_ids.sort_unstable();
    for way_id in way_ids {
        let count = segments.get(&way_id).map(Vec::len).unwrap_or(0);
        println!("way/{}\t{} segment(s)", way_id, count);
    }
    Ok(())
}

async fn run_queue(pool: &SqlitePool) -> Result<()> {
    let pending = note_queue::get_all(pool)
        .await
        .context("Failed to read pending notes")?;

    if pending.is_empty() {
        println!("No pending notes");
    }
    for note in &pending {
        println!(
            "{}\t{}\t{} image(s)",
            note.log_label(),
            note.created_at.to_rfc3339(),
            note.image_paths.len()
        );
    }
    Ok(())
}
