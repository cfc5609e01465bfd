use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::BackendConfig;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub(crate) struct Args {
    /// Storage backend type
    #[arg(
        short,
        long,
        env = "UNISTORE_BACKEND",
        value_enum,
        default_value_t = BackendKind::Filesystem
    )]
    pub(crate) backend: BackendKind,

    /// Filesystem root directory
    #[arg(long, env = "UNISTORE_ROOT", default_value = ".")]
    pub(crate) root: String,

    /// Base url of the HTTP store
    #[arg(long, env = "UNISTORE_BASE_URL")]
    pub(crate) base_url: Option<String>,

    /// S3 bucket name
    #[arg(long, env = "UNISTORE_BUCKET")]
    pub(crate) bucket: Option<String>,

    /// S3 endpoint, for S3-compatible stores
    #[arg(long, env = "UNISTORE_ENDPOINT_URL")]
    pub(crate) endpoint_url: Option<String>,

    /// S3 region
    #[arg(long, env = "UNISTORE_REGION")]
    pub(crate) region: Option<String>,

    /// Address buckets as `<endpoint>/<bucket>` instead of by virtual host
    #[arg(long, env = "UNISTORE_FORCE_PATH_STYLE")]
    pub(crate) force_path_style: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BackendKind {
    Filesystem,
    Http,
    S3,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Print the object's metadata as JSON
    Exists { filename: String },
    /// Stream the object to stdout or a file
    Read {
        filename: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Store stdin or a file as the object
    Write {
        filename: String,
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

impl Args {
    pub(crate) fn backend_config(&self) -> anyhow::Result<BackendConfig> {
        Ok(match self.backend {
            BackendKind::Filesystem => BackendConfig::Filesystem {
                root: self.root.clone(),
            },
            BackendKind::Http => BackendConfig::Http {
                base_url: self
                    .base_url
                    .clone()
                    .context("--base-url (UNISTORE_BASE_URL) is required for the http backend")?,
            },
            BackendKind::S3 => BackendConfig::S3 {
                bucket: self
                    .bucket
                    .clone()
                    .context("--bucket (UNISTORE_BUCKET) is required for the s3 backend")?,
                endpoint_url: self.endpoint_url.clone(),
                region: self.region.clone(),
                force_path_style: self.force_path_style,
            },
        })
    }
}
