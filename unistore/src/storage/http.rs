//! Remote store reached over plain HTTP: HEAD for existence, GET for reads
//! and POST for writes, all against `<base_url>/<filename>`.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use reqwest::{Body, Client, StatusCode, header::ETAG};

use crate::error::{Error, Result, StorageError};
use crate::metadata::ExistenceMetadata;
use crate::storage::{ContentStream, Storage, WriteReceipt};

#[derive(Clone)]
pub struct HttpStorage {
    client: Client,
    base_url: String,
}

impl HttpStorage {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Builds one client up front; prefer [`HttpStorage::new`] when the
    /// caller already owns a configured client.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::new(Client::new(), base_url)
    }

    fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), filename)
    }
}

#[async_trait]
impl Storage for HttpStorage {
    async fn exists(&self, filename: &str) -> Result<ExistenceMetadata> {
        let url = self.url_for(filename);
        let resp = self.client.head(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            tracing::debug!("HEAD {url} returned 404");
            return Err(StorageError::not_found().into());
        }
        let resp = resp.error_for_status()?;
        Ok(ExistenceMetadata::from_headers(resp.headers()))
    }

    fn read(&self, filename: &str) -> ContentStream {
        let request = self.client.get(self.url_for(filename));
        stream::once(async move {
            let resp = request.send().await?.error_for_status()?;
            Ok::<_, Error>(resp.bytes_stream().map_err(Error::from))
        })
        .try_flatten()
        .boxed()
    }

    async fn write(&self, filename: &str, stream: ContentStream) -> Result<WriteReceipt> {
        let url = self.url_for(filename);
        let resp = self
            .client
            .post(&url)
            .body(Body::wrap_stream(stream))
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!("POST {url} completed with {}", resp.status());

        let e_tag = resp
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        Ok(WriteReceipt {
            e_tag,
            version_id: None,
        })
    }
}
