//! Local directory backend.
//!
//! Unlike the other backends there is no provider to ask for an `ETag`, so
//! `exists` streams the whole file through SHA-1 and is O(file size).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use sha1::{Digest, Sha1};
use tokio::{
    fs::{self, File},
    io::{self, AsyncWriteExt, BufWriter},
};
use tokio_util::io::ReaderStream;

use crate::error::{Error, Result, StorageError};
use crate::metadata::{ExistenceMetadata, http_date};
use crate::storage::{ContentStream, Storage, WriteReceipt};

pub struct FilesystemStorage {
    root: String,
}

impl FilesystemStorage {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<filename>`; the filename is not sanitized.
    fn path_for(&self, filename: &str) -> PathBuf {
        PathBuf::from(format!("{}/{}", self.root.trim_end_matches('/'), filename))
    }

    /// Hidden sibling the data is staged in before the final rename.
    ///
    /// The filename must end in a file component; otherwise the sibling
    /// would land next to a directory, possibly outside the root.
    fn staging_path(path: &Path, filename: &str) -> io::Result<PathBuf> {
        let last = filename.rsplit('/').next().unwrap_or_default();
        if matches!(last, "" | "." | "..") {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("`{filename}` does not name a file"),
            ));
        }
        Ok(path.with_file_name(format!(".{last}.{}.tmp", uuid::Uuid::new_v4())))
    }

    async fn discard(staging: &Path) {
        if let Err(err) = fs::remove_file(staging).await {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove staging file {}: {err}", staging.display());
            }
        }
    }

    async fn copy_into(mut stream: ContentStream, staging: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(staging).await?);
        while let Some(chunk) = stream.try_next().await? {
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;
        writer.into_inner().sync_all().await?;
        Ok(())
    }
}

/// Hex-encoded SHA-1 of everything `file` yields from its current position.
pub async fn sha1_hex(file: File) -> io::Result<String> {
    let mut hasher = Sha1::new();
    let mut chunks = ReaderStream::new(file);
    while let Some(chunk) = chunks.try_next().await? {
        hasher.update(&chunk);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[async_trait]
impl Storage for FilesystemStorage {
    async fn exists(&self, filename: &str) -> Result<ExistenceMetadata> {
        let path = self.path_for(filename);
        let meta = match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => {
                tracing::debug!("{} is not a regular file", path.display());
                return Err(StorageError::not_found().into());
            }
            Err(err) => {
                tracing::debug!("stat {} failed: {err}", path.display());
                return Err(StorageError::not_found().into());
            }
        };

        // Errors from here on (e.g. the file vanishing between stat and open)
        // are passed through as-is.
        let etag = sha1_hex(File::open(&path).await?).await?;

        Ok(ExistenceMetadata {
            accept_ranges: Some("bytes".to_string()),
            content_length: Some(meta.len()),
            etag: Some(etag),
            last_modified: Some(http_date(meta.modified()?)),
        })
    }

    fn read(&self, filename: &str) -> ContentStream {
        let path = self.path_for(filename);
        stream::once(async move {
            let file = File::open(&path).await?;
            Ok::<_, Error>(ReaderStream::new(file).map_err(Error::from))
        })
        .try_flatten()
        .boxed()
    }

    async fn write(&self, filename: &str, stream: ContentStream) -> Result<WriteReceipt> {
        let path = self.path_for(filename);
        let staging = Self::staging_path(&path, filename)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let outcome = match Self::copy_into(stream, &staging).await {
            Ok(()) => fs::rename(&staging, &path).await.map_err(Error::from),
            Err(err) => Err(err),
        };
        if let Err(err) = outcome {
            Self::discard(&staging).await;
            return Err(err);
        }
        tracing::debug!("wrote {}", path.display());
        Ok(WriteReceipt::default())
    }
}
