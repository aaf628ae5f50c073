//! Object storage backed by a local directory.
//!
//! All access goes through a `cap_std::fs::Dir` opened once at startup, so a
//! key can never resolve outside the upload root. Writes run on the blocking
//! pool.

use std::io;
use std::path::{Component, Path};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use crate::domain::ports::{ObjectStorage, ObjectStorageError};

/// Failure opening the upload root.
#[derive(Debug, thiserror::Error)]
#[error("failed to open upload directory {path}: {source}")]
pub struct StorageSetupError {
    path: String,
    #[source]
    source: io::Error,
}

/// Stores objects as files below a root directory and serves them from
/// `public_base_url`.
#[derive(Clone)]
pub struct FilesystemObjectStorage {
    root: Arc<Dir>,
    public_base_url: String,
}

impl FilesystemObjectStorage {
    /// Open (creating if needed) the upload root.
    pub fn open(
        root: impl AsRef<Path>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, StorageSetupError> {
        let root = root.as_ref();
        let setup_error = |source| StorageSetupError {
            path: root.display().to_string(),
            source,
        };
        Dir::create_ambient_dir_all(root, ambient_authority()).map_err(setup_error)?;
        let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(setup_error)?;
        Ok(Self::from_dir(dir, public_base_url))
    }

    /// Wrap an already opened directory.
    pub fn from_dir(dir: Dir, public_base_url: impl Into<String>) -> Self {
        Self {
            root: Arc::new(dir),
            public_base_url: public_base_url.into(),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url.trim_end_matches('/'))
    }
}

/// Keys are relative, slash-separated and free of `..` segments.
fn validate_key(key: &str) -> Result<&Path, ObjectStorageError> {
    let path = Path::new(key);
    let well_formed = !key.is_empty()
        && !key.contains('\\')
        && path.file_name().is_some()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if well_formed {
        Ok(path)
    } else {
        Err(ObjectStorageError::invalid_key(key))
    }
}

fn write_object(root: &Dir, path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        root.create_dir_all(parent)?;
    }
    root.write(path, bytes)
}

#[async_trait]
impl ObjectStorage for FilesystemObjectStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, ObjectStorageError> {
        let path = validate_key(key)?.to_path_buf();
        let root = Arc::clone(&self.root);
        let size = bytes.len();

        tokio::task::spawn_blocking(move || write_object(&root, &path, &bytes))
            .await
            .map_err(|err| ObjectStorageError::unavailable(format!("upload task failed: {err}")))?
            .map_err(|err| ObjectStorageError::unavailable(err.to_string()))?;

        debug!(key, size, "object stored");
        Ok(self.public_url(key))
    }
}
