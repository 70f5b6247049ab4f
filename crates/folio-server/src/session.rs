use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;

use crate::error::AuthError;

/// Fixed absolute token lifetime: 24 hours from issuance, no sliding renewal.
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// In-memory bearer-token registry: token → absolute expiry (unix seconds).
///
/// Process-lifetime state with no persistence: a restart invalidates every
/// session and forces re-login. The lock guards the map against concurrent
/// structural mutation only; no ordering guarantee beyond that.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    tokens: Arc<RwLock<HashMap<String, i64>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new session token, valid for [`SESSION_TTL_SECS`] from now.
    pub async fn issue(&self) -> String {
        self.issue_at(now()).await
    }

    /// Issue a token with an explicit issuance instant.
    pub async fn issue_at(&self, issued_at: i64) -> String {
        let token = generate_token();
        self.tokens
            .write()
            .await
            .insert(token.clone(), issued_at + SESSION_TTL_SECS);
        token
    }

    /// Check a token. Expired entries are evicted on first use, so a retry
    /// with the same token reports `Unknown`. Expiry is never extended.
    pub async fn validate(&self, token: &str) -> Result<(), AuthError> {
        self.validate_at(token, now()).await
    }

    /// Check a token against an explicit instant.
    pub async fn validate_at(&self, token: &str, at: i64) -> Result<(), AuthError> {
        let mut tokens = self.tokens.write().await;
        match tokens.get(token) {
            None => Err(AuthError::Unknown),
            Some(&expires_at) if at >= expires_at => {
                tokens.remove(token);
                Err(AuthError::Expired)
            }
            Some(_) => Ok(()),
        }
    }

    /// Remove a token. Idempotent; revoking an absent token is not an error.
    pub async fn revoke(&self, token: &str) {
        self.tokens.write().await.remove(token);
    }
}

/// Generate a session token: 32 random bytes, hex-encoded (64 chars).
fn generate_token() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
