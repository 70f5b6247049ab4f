use std::path::PathBuf;

use axum_test::TestServer;
use folio_server::store::AdminDefaults;
use folio_server::{build_router, build_state, AppState};
use tempfile::TempDir;

/// A server wired to a throwaway data directory, with the stock default
/// admin credentials (`mamu` / `admin123`).
pub struct TestEnv {
    data_dir: TempDir,
    #[allow(dead_code)]
    pub state: AppState,
    pub server: TestServer,
}

impl TestEnv {
    pub fn start() -> Self {
        let data_dir = tempfile::tempdir().expect("create temp data dir");
        let state = build_state(
            data_dir.path(),
            AdminDefaults {
                username: "mamu".into(),
                password: "admin123".into(),
            },
        )
        .expect("build app state");
        let router = build_router(state.clone(), &data_dir.path().join("assets"));
        let server = TestServer::new(router);
        Self {
            data_dir,
            state,
            server,
        }
    }

    /// Log in with the default credentials and return the session token.
    pub async fn login(&self) -> String {
        let response = self
            .server
            .post("/api/auth/login")
            .json(&serde_json::json!({
                "username": "mamu",
                "password": "admin123"
            }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["token"]
            .as_str()
            .expect("login response contains token")
            .to_owned()
    }

    #[allow(dead_code)]
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.path().join("assets").join("images")
    }

    #[allow(dead_code)]
    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.path().join("backups")
    }
}
