// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while publishing. Everything else travels as `anyhow::Error`.
#[derive(Error, Debug)]
pub enum PublishError {
    /// A single file whose location matches no configured source.
    #[error("path {} did not match OpenAddresses configuration", .0.display())]
    SourceUnresolved(PathBuf),

    /// The object store rejected or failed the upload. Not retried.
    #[error("uploading to {remote} failed")]
    UploadFailed {
        remote: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid object store URI: {0}")]
    InvalidRemote(String),
}
