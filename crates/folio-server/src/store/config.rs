use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use super::model::{ConfigDocument, Meta, SCHEMA_VERSION};
use crate::credentials;
use crate::error::StorageError;

/// Admin identity used when synthesizing a fresh document. Injected from the
/// configuration layer; the store itself carries no literals.
#[derive(Debug, Clone)]
pub struct AdminDefaults {
    pub username: String,
    pub password: String,
}

/// Persistence for the single portfolio document.
///
/// Every mutating endpoint does load → mutate in memory → save. There is no
/// locking and no transaction isolation around that cycle: two concurrent
/// admin writes race and the last one wins. The write itself is atomic
/// (temp file + rename), so a reader never observes a half-written document.
#[derive(Clone)]
pub struct ConfigStore {
    path: PathBuf,
    defaults: AdminDefaults,
}

impl ConfigStore {
    /// Set up a store at `path`, creating the parent directory if needed.
    /// Does not touch the file itself; [`ConfigStore::load`] does that lazily.
    pub fn open(path: &Path, defaults: AdminDefaults) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path: path.to_owned(),
            defaults,
        })
    }

    /// Read the persisted document. If the file is absent, synthesize the
    /// default document (hashing the injected default admin password),
    /// persist it, and return it. A file that exists but does not parse is
    /// an error, not an excuse to overwrite.
    pub fn load(&self) -> Result<ConfigDocument, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let hash = credentials::hash_password(&self.defaults.password);
                let mut doc = ConfigDocument::default_with_admin(&self.defaults.username, &hash);
                self.save(&mut doc)?;
                info!(path = %self.path.display(), "created default portfolio config");
                Ok(doc)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stamp `meta` and persist the whole document atomically: write a temp
    /// file in the same directory, then rename over the target. A failed
    /// save leaves the prior persisted state intact.
    pub fn save(&self, doc: &mut ConfigDocument) -> Result<(), StorageError> {
        doc.meta = Meta {
            last_updated: Utc::now().to_rfc3339(),
            version: SCHEMA_VERSION.to_owned(),
        };

        let bytes = serde_json::to_vec_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), "saved portfolio config");
        Ok(())
    }

    /// The document as unauthenticated consumers see it: a shallow copy
    /// with the `admin` block removed.
    pub fn public_projection(doc: &ConfigDocument) -> Value {
        let mut value = serde_json::to_value(doc).unwrap_or(Value::Null);
        if let Some(obj) = value.as_object_mut() {
            obj.remove("admin");
        }
        value
    }
}
