// src/store/mod.rs
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::error::PublishError;

mod s3;

pub use s3::S3Store;

/// Content type for newline-delimited GeoJSON objects.
pub const GEOJSON_CONTENT_TYPE: &str = "application/geo+json";

/// Upload primitive the publisher talks to.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Put the file at `local` under `remote` (a full `scheme://bucket/key` URI),
    /// readable by anyone when `public_read` is set.
    async fn upload(&self, local: &Path, remote: &str, public_read: bool) -> Result<()>;
}

/// Split `s3://bucket/key/to/file` into bucket and key.
pub fn parse_s3_uri(uri: &str) -> Result<(String, String), PublishError> {
    let rest = uri
        .strip_prefix("s3://")
        .ok_or_else(|| PublishError::InvalidRemote(format!("{uri} (must start with s3://)")))?;

    match rest.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
            Ok((bucket.to_string(), key.to_string()))
        }
        _ => Err(PublishError::InvalidRemote(format!(
            "{uri} (expected s3://bucket/key)"
        ))),
    }
}
