use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::StorageError;
use crate::store::ConfigDocument;

/// A backup file on disk, as reported by `GET /api/backups`.
#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub created: String,
}

/// Snapshot storage for the config document: one pretty-printed JSON file
/// per backup, named by creation time. Backups include the admin block and
/// are only ever served to authenticated callers.
#[derive(Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_owned(),
        })
    }

    /// Write a snapshot of `doc`, returning the backup file path.
    pub fn create(&self, doc: &ConfigDocument) -> Result<PathBuf, StorageError> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = self.dir.join(format!("backup_{stamp}.json"));
        std::fs::write(&path, serde_json::to_vec_pretty(doc)?)?;
        info!(path = %path.display(), "created config backup");
        Ok(path)
    }

    /// List all `*.json` backups, newest first.
    pub fn list(&self) -> Result<Vec<BackupEntry>, StorageError> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json") != Some(true) {
                continue;
            }
            let metadata = entry.metadata()?;
            let created = metadata.created().or_else(|_| metadata.modified())?;
            entries.push(BackupEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: path.to_string_lossy().into_owned(),
                size: metadata.len(),
                created: DateTime::<Utc>::from(created).to_rfc3339(),
            });
        }
        entries.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_and_list() {
        let dir = tempdir().unwrap();
        let store = BackupStore::open(dir.path()).unwrap();
        let doc = ConfigDocument::default_with_admin("mamu", "hash");

        let path = store.create(&doc).unwrap();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("backup_"));

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].size > 0);

        // The snapshot round-trips as a full document, admin included.
        let raw = std::fs::read_to_string(&path).unwrap();
        let restored: ConfigDocument = serde_json::from_str(&raw).unwrap();
        assert_eq!(restored.admin.username, "mamu");
    }

    #[test]
    fn list_ignores_non_json() {
        let dir = tempdir().unwrap();
        let store = BackupStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a backup").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn list_is_newest_first() {
        let dir = tempdir().unwrap();
        let store = BackupStore::open(dir.path()).unwrap();
        // Fabricate names a day apart; created times are equal-ish so the
        // name-embedded stamp drives ordering via created fallback.
        let old = dir.path().join("backup_20240101_000000.json");
        let new = dir.path().join("backup_20240102_000000.json");
        std::fs::write(&old, "{}").unwrap();
        std::fs::write(&new, "{}").unwrap();

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 2);
        // Both present; ordering by created timestamp descending.
        assert!(entries[0].created >= entries[1].created);
    }
}
