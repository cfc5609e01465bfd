//! Storage backends.
//!
//! Submodules:
//! - `http`: a remote store addressed as `<base_url>/<filename>`
//! - `s3`: a bucket in an S3-compatible object store
//! - `filesystem`: a local directory addressed as `<root>/<filename>`
//!
//! Every backend implements [`Storage`]. Picking one is up to the caller and
//! happens once, when it is configured.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metadata::ExistenceMetadata;

pub mod filesystem;
pub mod http;
pub mod s3;

pub use filesystem::FilesystemStorage;
pub use http::HttpStorage;
pub use s3::S3Storage;

/// Object contents flowing in or out of a backend. Errors raised mid-transfer
/// show up as items of the stream.
pub type ContentStream = BoxStream<'static, Result<Bytes, Error>>;

/// What a backend reports once a write has completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Describes `filename` without transferring its body.
    ///
    /// An absent object is always `Error::Storage(StorageError::not_found())`,
    /// whatever the backend. The cost is backend-defined: the filesystem
    /// backend reads the whole file to compute its `ETag`.
    async fn exists(&self, filename: &str) -> Result<ExistenceMetadata>;

    /// Streams the contents of `filename`.
    ///
    /// Returns at once; nothing is checked up front and failures (including
    /// a missing object) arrive as the first error item of the stream.
    fn read(&self, filename: &str) -> ContentStream;

    /// Consumes `stream` to completion and stores it as `filename`.
    async fn write(&self, filename: &str, stream: ContentStream) -> Result<WriteReceipt>;
}
