use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    auth::require_session,
    backup::BackupStore,
    blobs::DiskBlobStore,
    handlers::{
        change_password, create_backup, create_message, delete_image, delete_message, get_config,
        health, list_backups, list_messages, login, logout, record_visit, update_config,
        update_message, upload_image, verify_auth,
    },
    session::SessionRegistry,
    store::{AdminDefaults, ConfigStore},
    AppState,
};

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    /// Default admin identity, used only when synthesizing a fresh config.
    pub admin_username: String,
    pub admin_password: String,
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("FOLIO_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("FOLIO_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            data_dir: std::env::var("FOLIO_DATA_DIR").ok().map(PathBuf::from),
            admin_username: std::env::var("FOLIO_ADMIN_USERNAME")
                .unwrap_or_else(|_| "mamu".into()),
            admin_password: std::env::var("FOLIO_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "admin123".into()),
            cors_origins: std::env::var("FOLIO_CORS_ORIGINS").ok(),
        }
    }
}

/// Resolve the data directory: explicit setting, else `FOLIO_DATA_DIR`,
/// else the platform app-data dir.
pub fn resolve_data_dir(data_dir: Option<&PathBuf>) -> Result<PathBuf> {
    match data_dir {
        Some(d) => {
            std::fs::create_dir_all(d).context("create data dir")?;
            Ok(d.clone())
        }
        None => crate::dirs::data_dir(),
    }
}

/// Wire up all stores under `data_dir` and return the shared state.
pub fn build_state(data_dir: &Path, defaults: AdminDefaults) -> Result<AppState> {
    let config_path = data_dir.join("config").join("portfolio_config.json");
    let images_dir = data_dir.join("assets").join("images");
    let backups_dir = data_dir.join("backups");

    let store = ConfigStore::open(&config_path, defaults).context("open config store")?;
    let blobs = DiskBlobStore::open(&images_dir).context("open image store")?;
    let backups = BackupStore::open(&backups_dir).context("open backup store")?;

    Ok(AppState {
        store,
        sessions: SessionRegistry::new(),
        blobs: Arc::new(blobs),
        backups,
    })
}

/// Build the full application router: public routes, session-guarded admin
/// routes, and static asset serving under `/assets`.
pub fn build_router(state: AppState, assets_dir: &Path) -> Router {
    let public = Router::new()
        .route("/api/health", get(health))
        .route("/api/config", get(get_config))
        .route("/api/auth/login", post(login))
        .route("/api/messages", post(create_message))
        .route("/api/stats/visit", post(record_visit));

    let protected = Router::new()
        .route("/api/config", put(update_config))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/change-password", post(change_password))
        .route("/api/auth/verify", get(verify_auth))
        .route("/api/messages", get(list_messages))
        .route("/api/messages/{id}", put(update_message))
        .route("/api/messages/{id}", delete(delete_message))
        .route("/api/upload", post(upload_image))
        .route("/api/images", delete(delete_image))
        .route("/api/backup", post(create_backup))
        .route("/api/backups", get(list_backups))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service("/assets", ServeDir::new(assets_dir))
        .with_state(state)
}

pub async fn run(cfg: ServerConfig) -> Result<()> {
    let data_dir = resolve_data_dir(cfg.data_dir.as_ref())?;
    info!(data_dir = %data_dir.display(), "using data directory");

    let state = build_state(
        &data_dir,
        AdminDefaults {
            username: cfg.admin_username,
            password: cfg.admin_password,
        },
    )?;

    // Materialize the default document up front so a fresh deployment is
    // loggable and loadable before the first request arrives.
    state.store.load().context("load portfolio config")?;

    let assets_dir = data_dir.join("assets");
    let app = build_router(state, &assets_dir)
        .layer(build_cors(cfg.cors_origins.as_deref()))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port")?;

    info!(%addr, "folio server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind listener")?;

    axum::serve(listener, app).await.context("server error")
}

fn build_cors(origins: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    match origins {
        Some(o) => {
            let origins: Vec<HeaderValue> =
                o.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            cors.allow_origin(origins)
        }
        None => cors.allow_origin(Any),
    }
}
