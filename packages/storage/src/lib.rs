#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Evidence attachment storage.
//!
//! Uploaded files are written under a generated name of the form
//! `<unix millis>-<random hex><.ext>`, keeping the original (sanitised,
//! lower-cased) extension. The recorded path is relative to the public
//! mount (e.g. `uploads/1760000000000-3f2a9c1e.jpg`) so the server can
//! serve it back as a static file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use crime_dashboard_fir_models::{FileCategory, NewAttachment};
use thiserror::Error;

/// Default public mount for stored attachments.
pub const DEFAULT_PUBLIC_PREFIX: &str = "uploads";

/// Longest extension kept from an uploaded filename.
const MAX_EXTENSION_LEN: usize = 10;

/// Errors from attachment storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Writing or removing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File the operation was working on.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A recorded path does not belong to this store.
    #[error("Path is outside the attachment store: {0}")]
    ForeignPath(String),
}

/// Persists uploaded evidence.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Writes `bytes` under a freshly generated name derived from
    /// `original_name`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file cannot be written.
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<NewAttachment, StorageError>;

    /// Removes a file previously returned by [`AttachmentStore::store`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the path is foreign or removal fails.
    async fn remove(&self, file_path: &str) -> Result<(), StorageError>;
}

/// Stores attachments as plain files in a directory.
#[derive(Debug, Clone)]
pub struct DiskAttachmentStore {
    root: PathBuf,
    public_prefix: String,
}

impl DiskAttachmentStore {
    /// Opens (creating if needed) the store rooted at `root`, serving
    /// files under [`DEFAULT_PUBLIC_PREFIX`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::with_prefix(root, DEFAULT_PUBLIC_PREFIX)
    }

    /// Like [`DiskAttachmentStore::open`] with a custom public prefix.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory cannot be created.
    pub fn with_prefix(
        root: impl Into<PathBuf>,
        public_prefix: &str,
    ) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            root,
            public_prefix: public_prefix.trim_matches('/').to_string(),
        })
    }

    /// Directory that holds the files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a recorded relative path back to the file on disk.
    ///
    /// Only the final path component is honoured, so `../` tricks cannot
    /// escape the store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ForeignPath`] if `file_path` is not under
    /// this store's public prefix.
    pub fn resolve(&self, file_path: &str) -> Result<PathBuf, StorageError> {
        let name = file_path
            .strip_prefix(&self.public_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty() && !rest.contains('/') && !rest.contains(".."))
            .ok_or_else(|| StorageError::ForeignPath(file_path.to_string()))?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl AttachmentStore for DiskAttachmentStore {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<NewAttachment, StorageError> {
        let name = generate_name(original_name);
        let path = self.root.join(&name);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;

        log::debug!(
            "Stored attachment {original_name:?} as {} ({} bytes)",
            path.display(),
            bytes.len()
        );

        Ok(NewAttachment {
            file_path: format!("{}/{name}", self.public_prefix),
            file_type: FileCategory::from_filename(&name),
            original_name: original_name.to_string(),
            size_bytes: bytes.len() as u64,
        })
    }

    async fn remove(&self, file_path: &str) -> Result<(), StorageError> {
        let path = self.resolve(file_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// Builds a collision-resistant filename that keeps the original extension.
#[must_use]
pub fn generate_name(original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..8];

    match sanitized_extension(original_name) {
        Some(ext) => format!("{millis}-{suffix}.{ext}"),
        None => format!("{millis}-{suffix}"),
    }
}

fn sanitized_extension(original_name: &str) -> Option<String> {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| {
            !e.is_empty()
                && e.len() <= MAX_EXTENSION_LEN
                && e.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_ascii_lowercase)
}
