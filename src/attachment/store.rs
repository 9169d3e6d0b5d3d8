//! Keeps attachment files on disk under the configured upload directory.

use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::{Error, transaction::TransactionId};

/// Where attachment files are kept.
///
/// Paths handed out by the store are relative to its root, so the upload
/// directory can be moved without touching the database.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    /// Store files under `root`, which is created on the first upload if needed.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `bytes` to a new file for the transaction and return its relative path.
    ///
    /// Files are named `transactions/<id>/<millis>-<hash>.<ext>`, where the
    /// extension is taken from `file_name`.
    pub async fn save(
        &self,
        transaction_id: TransactionId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, Error> {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let hash = format!("{:x}", Sha256::digest(bytes));
        let relative_path = format!(
            "transactions/{transaction_id}/{millis}-{}.{}",
            &hash[..16],
            sanitize_extension(file_name)
        );

        let path = self.resolve(&relative_path)?;
        if let Some(directory) = path.parent() {
            tokio::fs::create_dir_all(directory)
                .await
                .map_err(|error| Error::StorageError(error.to_string()))?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|error| Error::StorageError(error.to_string()))?;

        Ok(relative_path)
    }

    /// Read the file at `relative_path`.
    pub async fn read(&self, relative_path: &str) -> Result<Vec<u8>, Error> {
        let path = self.resolve(relative_path)?;

        tokio::fs::read(&path).await.map_err(|error| match error.kind() {
            std::io::ErrorKind::NotFound => {
                tracing::warn!("Attachment file {} is missing", path.display());
                Error::NotFound
            }
            _ => Error::StorageError(error.to_string()),
        })
    }

    /// Delete files, logging rather than returning failures.
    ///
    /// The database rows for the files are already gone when this is called,
    /// so a leftover file is harmless.
    pub async fn remove_files(&self, relative_paths: &[String]) {
        for relative_path in relative_paths {
            let path = match self.resolve(relative_path) {
                Ok(path) => path,
                Err(error) => {
                    tracing::warn!("Not removing attachment {relative_path}: {error}");
                    continue;
                }
            };

            if let Err(error) = tokio::fs::remove_file(&path).await {
                tracing::warn!("Could not remove attachment {}: {error}", path.display());
            }
        }
    }

    fn resolve(&self, relative_path: &str) -> Result<PathBuf, Error> {
        let is_contained = Path::new(relative_path)
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

        if !is_contained || relative_path.is_empty() {
            return Err(Error::StorageError(format!(
                "invalid attachment path {relative_path:?}"
            )));
        }

        Ok(self.root.join(relative_path))
    }
}

/// The lowercase extension of `file_name` with anything but ASCII letters and
/// digits removed, or "bin" if nothing is left.
fn sanitize_extension(file_name: &str) -> String {
    let extension: String = Path::new(file_name)
        .extension()
        .map(|extension| extension.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(10)
        .collect::<String>()
        .to_ascii_lowercase();

    if extension.is_empty() {
        "bin".to_owned()
    } else {
        extension
    }
}
