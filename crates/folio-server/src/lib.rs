pub mod auth;
pub mod backup;
pub mod blobs;
pub mod credentials;
pub mod dirs;
pub mod error;
pub mod handlers;
pub mod server;
pub mod session;
pub mod store;

use std::sync::Arc;

/// Shared application state threaded through axum handlers.
///
/// The session registry is constructed here and owned by the state, not by
/// any module-level token map. It lives exactly as long as the process.
#[derive(Clone)]
pub struct AppState {
    pub store: store::ConfigStore,
    pub sessions: session::SessionRegistry,
    pub blobs: Arc<dyn blobs::BlobStore>,
    pub backups: backup::BackupStore,
}

pub use server::{build_router, build_state, run, ServerConfig};
