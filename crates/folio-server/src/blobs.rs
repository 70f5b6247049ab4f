use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::debug;

use crate::error::StorageError;

/// URL prefix under which stored images are publicly served.
pub const PUBLIC_IMAGE_PREFIX: &str = "/assets/images";

/// MIME types accepted for upload. Checked before any bytes are written.
pub const ALLOWED_IMAGE_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/gif", "image/webp"];

pub fn is_allowed_image_type(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&content_type)
}

/// Target folder for an uploaded image, from the request's `type` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFolder {
    Profile,
    Projects,
    Misc,
}

impl ImageFolder {
    /// Unrecognized kinds fall back to `misc`, matching the upload contract.
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "profile" => Self::Profile,
            "project" => Self::Projects,
            _ => Self::Misc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Projects => "projects",
            Self::Misc => "misc",
        }
    }
}

/// Result of a successful store: the public URL path and the generated name.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub path: String,
    pub filename: String,
}

/// Opaque file storage for uploaded images. The server never trusts the
/// client-supplied filename; names are generated here.
pub trait BlobStore: Send + Sync {
    /// Persist `bytes` under `folder`, returning where it landed.
    fn save(&self, folder: ImageFolder, ext: &str, bytes: &[u8]) -> Result<StoredFile, StorageError>;

    /// Delete by public URL path. Returns false if no such file exists.
    /// Paths outside the public image prefix never resolve.
    fn delete(&self, public_path: &str) -> Result<bool, StorageError>;
}

/// Blob store backed by a local directory tree under `<root>/<folder>/`.
pub struct DiskBlobStore {
    root: PathBuf,
}

impl DiskBlobStore {
    pub fn open(root: &Path) -> Result<Self, StorageError> {
        for folder in [ImageFolder::Profile, ImageFolder::Projects, ImageFolder::Misc] {
            std::fs::create_dir_all(root.join(folder.as_str()))?;
        }
        Ok(Self {
            root: root.to_owned(),
        })
    }

    /// Map a public `/assets/images/...` path back to a disk location.
    /// Rejects anything outside the prefix and any traversal component.
    fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let relative = public_path
            .strip_prefix(PUBLIC_IMAGE_PREFIX)?
            .trim_start_matches('/');
        let candidate = Path::new(relative);
        if candidate
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            Some(self.root.join(candidate))
        } else {
            None
        }
    }
}

impl BlobStore for DiskBlobStore {
    fn save(&self, folder: ImageFolder, ext: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        let filename = generate_filename(ext);
        let disk_path = self.root.join(folder.as_str()).join(&filename);
        std::fs::write(&disk_path, bytes)?;
        debug!(path = %disk_path.display(), "stored uploaded image");
        Ok(StoredFile {
            path: format!("{}/{}/{}", PUBLIC_IMAGE_PREFIX, folder.as_str(), filename),
            filename,
        })
    }

    fn delete(&self, public_path: &str) -> Result<bool, StorageError> {
        let Some(disk_path) = self.resolve(public_path) else {
            return Ok(false);
        };
        match std::fs::remove_file(&disk_path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Generate an upload filename: `<unix seconds>_<8 hex chars>.<ext>`.
/// The client-supplied name contributes nothing but the extension.
fn generate_filename(ext: &str) -> String {
    use rand::Rng;
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let suffix: [u8; 4] = rand::thread_rng().gen();
    format!("{}_{}.{}", ts, hex::encode(suffix), ext)
}
