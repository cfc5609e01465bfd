use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The one failure shape every backend normalizes to.
///
/// Only "object not found" is normalized; everything else travels through
/// [`Error`] in the collaborator's own type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "type", rename = "storageError")]
#[error("storage error {status}: {error_code}")]
pub struct StorageError {
    pub status: u16,
    #[serde(rename = "errorCode")]
    pub error_code: String,
}

impl StorageError {
    pub const NOT_FOUND_CODE: &'static str = "notFound";

    pub fn new(status: u16, error_code: impl Into<String>) -> Self {
        Self {
            status,
            error_code: error_code.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(404, Self::NOT_FOUND_CODE)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404 && self.error_code == Self::NOT_FOUND_CODE
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] StorageError),

    // Pass-through failures, carried unmodified.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("object store error: {0}")]
    ObjectStore(Box<aws_sdk_s3::Error>),
}

impl Error {
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.storage_error().is_some_and(StorageError::is_not_found)
    }
}

impl From<aws_sdk_s3::Error> for Error {
    fn from(err: aws_sdk_s3::Error) -> Self {
        Self::ObjectStore(Box::new(err))
    }
}
