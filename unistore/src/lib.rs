//! Uniform exists/read/write access to interchangeable object stores.
//!
//! Three backends implement [`Storage`]: [`HttpStorage`], [`S3Storage`] and
//! [`FilesystemStorage`]. An absent object is reported the same way by all of
//! them ([`StorageError::not_found`]); every other failure is passed through
//! in the collaborator's own error type.

pub mod error;
pub mod metadata;
pub mod storage;

pub use error::{Error, Result, StorageError};
pub use metadata::ExistenceMetadata;
pub use storage::{
    ContentStream, FilesystemStorage, HttpStorage, S3Storage, Storage, WriteReceipt,
};
