//! Medical-history document uploads.
//!
//! Documents are opaque bytes handed to an [`ObjectStore`]; this module only
//! enforces the extension allow-list and the size limit, then returns the
//! public URL the stored object is reachable under.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no file uploaded")]
    MissingFile,

    #[error("unsupported document format '{0}'")]
    UnsupportedFormat(String),

    #[error("document exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Persist `bytes` under `key` and return the URL clients fetch it from
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError>;
}

/// Writes objects into a directory that the router serves statically
pub struct LocalObjectStore {
    root: PathBuf,
    public_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(key), bytes).await?;
        Ok(format!("{}/{}", self.public_url, key))
    }
}

pub struct DocumentStore {
    backend: Arc<dyn ObjectStore>,
    allowed_extensions: Vec<String>,
    max_bytes: usize,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn ObjectStore>, allowed_extensions: Vec<String>, max_bytes: usize) -> Self {
        Self {
            backend,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_bytes,
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        let backend = LocalObjectStore::new(storage.upload_dir.clone(), storage.public_url.clone());
        Self::new(
            Arc::new(backend),
            storage.allowed_extensions.clone(),
            storage.max_upload_bytes,
        )
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::MissingFile);
        }
        if bytes.len() > self.max_bytes {
            return Err(StorageError::TooLarge { limit: self.max_bytes });
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !self.allowed_extensions.iter().any(|allowed| *allowed == extension) {
            return Err(StorageError::UnsupportedFormat(extension));
        }

        let key = format!("{}-{}", Uuid::new_v4(), sanitize(file_name));
        let url = self.backend.put(&key, bytes).await?;
        tracing::info!("Stored document '{}' ({} bytes)", key, bytes.len());
        Ok(url)
    }
}

/// Keep the final path component and replace anything outside [A-Za-z0-9._-]
fn sanitize(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document");
    base.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> DocumentStore {
        DocumentStore::new(
            Arc::new(LocalObjectStore::new(dir, "/uploads/")),
            vec!["pdf".into(), ".DOCX".into()],
            16,
        )
    }

    #[tokio::test]
    async fn stores_allowed_documents_under_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let url = store(dir.path()).upload("history.PDF", b"%PDF-1.4").await.unwrap();

        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with("-history.PDF"));
        let key = url.trim_start_matches("/uploads/");
        assert_eq!(std::fs::read(dir.path().join(key)).unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn rejects_unknown_extensions_and_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        assert!(matches!(
            store.upload("notes.exe", b"MZ").await,
            Err(StorageError::UnsupportedFormat(ext)) if ext == "exe"
        ));
        assert!(matches!(
            store.upload("big.pdf", &[0u8; 17]).await,
            Err(StorageError::TooLarge { limit: 16 })
        ));
        assert!(matches!(store.upload("empty.pdf", b"").await, Err(StorageError::MissingFile)));
    }

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize("../../etc/passwd"), "passwd");
        assert_eq!(sanitize("my report (1).docx"), "my_report__1_.docx");
    }
}
