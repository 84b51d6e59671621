#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crime dashboard.
//!
//! Serves the REST API for filing and browsing FIRs, patrol allocation,
//! the officer directory, and dashboard statistics. Uploaded evidence is
//! written to the configured upload directory and served back under
//! `/uploads`. Everything is persisted in a single `SQLite` database.

pub mod auth;
pub mod config;
pub mod error;
mod handlers;
pub mod interactive;
mod upload;

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use crime_dashboard_database::accounts::{AccountRepository, SqliteAccountRepository};
use crime_dashboard_database::firs::SqliteFirRepository;
use crime_dashboard_database::{DbError, open_db};
use crime_dashboard_directory::{DirectoryError, HotspotCatalog, OfficerDirectory, StaticDirectory};
use crime_dashboard_fir::FirService;
use crime_dashboard_patrol::cache::PatrolPlanCache;
use crime_dashboard_storage::{DiskAttachmentStore, StorageError};

pub use config::ServerConfig;
use error::ApiError;

/// Shared application state.
pub struct AppState {
    pub firs: FirService,
    pub accounts: Arc<dyn AccountRepository>,
    pub directory: Arc<dyn OfficerDirectory>,
    pub hotspots: Arc<dyn HotspotCatalog>,
    /// Most recent patrol plan.
    pub patrol_cache: PatrolPlanCache,
    pub session_ttl: chrono::Duration,
    pub max_upload_bytes: usize,
    pub progress_delay: Duration,
}

/// Errors opening the server's backing stores.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl AppState {
    /// Opens the database, attachment store, and directory named by
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if any of them cannot be opened.
    pub async fn open(config: &ServerConfig) -> Result<Self, StartupError> {
        log::info!("Opening database...");
        let db: Arc<dyn switchy_database::Database> =
            Arc::from(open_db(&config.database_path).await?);

        let store = DiskAttachmentStore::open(&config.upload_dir)?;
        log::info!("Storing uploads in {}", store.root().display());

        let directory = Arc::new(match &config.directory_path {
            Some(path) => StaticDirectory::load(path)?,
            None => StaticDirectory::demo()?,
        });

        Ok(Self {
            firs: FirService::new(
                Arc::new(SqliteFirRepository::new(db.clone())),
                Arc::new(store),
            ),
            accounts: Arc::new(SqliteAccountRepository::new(db)),
            directory: directory.clone(),
            hotspots: directory,
            patrol_cache: PatrolPlanCache::new(),
            session_ttl: config.session_ttl,
            max_upload_bytes: config.max_upload_bytes,
            progress_delay: config.progress_delay,
        })
    }
}

/// Registers every `/api` route along with extractor error handlers that
/// render decoding failures in the API's error format.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::InvalidBody(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::InvalidBody(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::InvalidBody(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route(
                "/patrol-allocations",
                web::post().to(handlers::patrol_allocations),
            )
            .route(
                "/patrol-allocations/default",
                web::post().to(handlers::default_patrol_allocations),
            )
            .route(
                "/patrol-allocations/stream",
                web::post().to(handlers::stream_patrol_allocations),
            )
            .service(
                web::resource("/patrol-allocations/latest")
                    .route(web::get().to(handlers::latest_patrol_allocation))
                    .route(web::delete().to(handlers::invalidate_patrol_allocation)),
            )
            .route("/allocate-patrol", web::post().to(handlers::allocate_patrol))
            .service(
                web::resource("/firs")
                    .route(web::get().to(handlers::list_firs))
                    .route(web::post().to(handlers::create_fir)),
            )
            .route("/firs/{id}", web::get().to(handlers::get_fir))
            .route(
                "/firs/{id}/status",
                web::patch().to(handlers::update_fir_status),
            )
            .route("/stats", web::get().to(handlers::stats))
            .route("/officers", web::get().to(handlers::officers))
            .route("/officers/divisions", web::get().to(handlers::divisions))
            .route("/hotspots", web::get().to(handlers::hotspots))
            .route("/auth/login", web::post().to(handlers::login))
            .route("/auth/logout", web::post().to(handlers::logout))
            .route("/auth/me", web::get().to(handlers::me)),
    );
}

/// Starts the crime dashboard API server.
///
/// Opens the backing stores and starts the Actix-Web HTTP server. This is a
/// regular async function; the caller provides the async runtime (e.g. via
/// `#[actix_web::main]`) and initialises logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if a backing store cannot be opened,
/// or the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let state = web::Data::new(AppState::open(&config).await.map_err(|e| {
        log::error!("Failed to start: {e}");
        std::io::Error::other(e)
    })?);

    let upload_dir = config.upload_dir.clone();

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
            // Serve uploaded evidence
            .service(Files::new("/uploads", &upload_dir))
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}
