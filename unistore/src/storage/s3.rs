//! S3 backend: a bucket/key pair in an S3-compatible object store, driven
//! through an injected `aws_sdk_s3::Client`.
//!
//! The client is shared by every call so the SDK's connection pool and
//! credential cache are reused; this module never builds one itself.

use std::io;

use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::http::HttpResponse,
    error::SdkError,
    operation::head_object::HeadObjectError,
    primitives::{ByteStream, DateTimeFormat},
};
use bytes::BytesMut;
use futures::{StreamExt, TryStreamExt, stream};
use tokio_util::io::ReaderStream;

use crate::error::{Error, Result, StorageError};
use crate::metadata::ExistenceMetadata;
use crate::storage::{ContentStream, Storage, WriteReceipt};

/// Largest object a single PutObject accepts (5 GiB).
pub const MAX_SINGLE_PUT: usize = 5 * 1024 * 1024 * 1024;

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    max_object_size: usize,
}

impl S3Storage {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            max_object_size: MAX_SINGLE_PUT,
        }
    }

    /// Caps how many bytes `write` buffers before giving up.
    pub fn with_max_object_size(mut self, limit: usize) -> Self {
        self.max_object_size = limit;
        self
    }
}

/// S3 answers a HEAD on a missing key with a bodiless 404, which the SDK
/// reports either as `NotFound` or as an unmodeled error; both count.
fn is_not_found(err: &SdkError<HeadObjectError, HttpResponse>) -> bool {
    err.as_service_error()
        .is_some_and(HeadObjectError::is_not_found)
        || err
            .raw_response()
            .is_some_and(|resp| resp.status().as_u16() == 404)
}

#[async_trait]
impl Storage for S3Storage {
    async fn exists(&self, filename: &str) -> Result<ExistenceMetadata> {
        let resp = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(filename)
            .send()
            .await;

        match resp {
            Ok(out) => Ok(ExistenceMetadata {
                accept_ranges: out.accept_ranges().map(str::to_owned),
                content_length: out.content_length().and_then(|len| u64::try_from(len).ok()),
                etag: out.e_tag().map(str::to_owned),
                last_modified: out
                    .last_modified()
                    .and_then(|t| t.fmt(DateTimeFormat::HttpDate).ok()),
            }),
            Err(err) if is_not_found(&err) => {
                tracing::debug!("s3://{}/{filename} not found", self.bucket);
                Err(StorageError::not_found().into())
            }
            Err(err) => Err(aws_sdk_s3::Error::from(err).into()),
        }
    }

    fn read(&self, filename: &str) -> ContentStream {
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(filename);
        stream::once(async move {
            let out = request.send().await.map_err(aws_sdk_s3::Error::from)?;
            Ok::<_, Error>(ReaderStream::new(out.body.into_async_read()).map_err(Error::from))
        })
        .try_flatten()
        .boxed()
    }

    /// Buffers the whole source in memory and sends it as one PutObject,
    /// so objects are bounded by `max_object_size` (by default the 5 GiB
    /// single-PUT limit). A source that fails or grows past the cap never
    /// reaches the store.
    async fn write(&self, filename: &str, mut stream: ContentStream) -> Result<WriteReceipt> {
        let mut body = BytesMut::new();
        while let Some(chunk) = stream.try_next().await? {
            if body.len() + chunk.len() > self.max_object_size {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "s3://{}/{filename} exceeds the {} byte single-put limit",
                        self.bucket, self.max_object_size
                    ),
                )
                .into());
            }
            body.extend_from_slice(&chunk);
        }
        let size = body.len();

        let out = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(filename)
            .body(ByteStream::from(body.freeze()))
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;
        tracing::debug!("put s3://{}/{filename} ({size} bytes)", self.bucket);

        Ok(WriteReceipt {
            e_tag: out.e_tag().map(str::to_owned),
            version_id: out.version_id().map(str::to_owned),
        })
    }
}
