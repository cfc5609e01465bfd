use std::path::Path;

use anyhow::bail;
use aws_config::{BehaviorVersion, Region};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use unistore::{FilesystemStorage, HttpStorage, S3Storage, Storage};

/// The one backend this process talks to, chosen at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum BackendConfig {
    Http {
        base_url: String,
    },
    S3 {
        bucket: String,
        endpoint_url: Option<String>,
        region: Option<String>,
        #[serde(default)]
        force_path_style: bool,
    },
    Filesystem {
        root: String,
    },
}

impl BackendConfig {
    /// Reports every problem at once rather than stopping at the first.
    pub(crate) async fn validate(&self) -> anyhow::Result<()> {
        let mut validation_errors = Vec::new();

        match self {
            Self::Http { base_url } => match Url::parse(base_url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => validation_errors.push(format!(
                    "UNISTORE_BASE_URL `{base_url}` has unsupported scheme `{}`",
                    url.scheme()
                )),
                Err(e) => validation_errors.push(format!(
                    "UNISTORE_BASE_URL `{base_url}` is not a valid url: {e}"
                )),
            },
            Self::S3 {
                bucket,
                endpoint_url,
                ..
            } => {
                if bucket.is_empty() {
                    validation_errors.push("UNISTORE_BUCKET must not be empty".to_string());
                }
                if let Some(endpoint) = endpoint_url {
                    if let Err(e) = Url::parse(endpoint) {
                        validation_errors.push(format!(
                            "UNISTORE_ENDPOINT_URL `{endpoint}` is not a valid url: {e}"
                        ));
                    }
                }
            }
            Self::Filesystem { root } => match tokio::fs::metadata(Path::new(root)).await {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => validation_errors.push(format!(
                    "UNISTORE_ROOT `{root}` exists but is not a directory"
                )),
                Err(_) => validation_errors.push(format!("UNISTORE_ROOT `{root}` does not exist.")),
            },
        }

        if !validation_errors.is_empty() {
            bail!("{}", validation_errors.join("\n"));
        }
        Ok(())
    }

    /// Builds the backend. Clients are created here, once, and handed to the
    /// adapters.
    pub(crate) async fn connect(&self) -> Box<dyn Storage> {
        match self {
            Self::Http { base_url } => Box::new(HttpStorage::with_base_url(base_url.clone())),
            Self::S3 {
                bucket,
                endpoint_url,
                region,
                force_path_style,
            } => {
                let client =
                    s3_client(endpoint_url.as_deref(), region.as_deref(), *force_path_style).await;
                Box::new(S3Storage::new(client, bucket.clone()))
            }
            Self::Filesystem { root } => Box::new(FilesystemStorage::new(root.clone())),
        }
    }
}

async fn s3_client(
    endpoint_url: Option<&str>,
    region: Option<&str>,
    force_path_style: bool,
) -> aws_sdk_s3::Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_owned()));
    }
    if let Some(endpoint) = endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    let shared = loader.load().await;
    let conf = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(force_path_style)
        .build();
    aws_sdk_s3::Client::from_conf(conf)
}
