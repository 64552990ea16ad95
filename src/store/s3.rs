use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{primitives::ByteStream, types::ObjectCannedAcl, Client};
use std::path::Path;
use tracing::{debug, info};

use super::{parse_s3_uri, ObjectStore, GEOJSON_CONTENT_TYPE};

/// S3 uploader. Credentials and region come from the usual AWS environment.
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn from_env() -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&sdk_config))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn upload(&self, local: &Path, remote: &str, public_read: bool) -> Result<()> {
        let (bucket, key) = parse_s3_uri(remote)?;
        debug!(bucket = %bucket, key = %key, public_read, "put_object");

        let body = ByteStream::from_path(local)
            .await
            .with_context(|| format!("reading {}", local.display()))?;

        self.client
            .put_object()
            .bucket(&bucket)
            .key(&key)
            .content_type(GEOJSON_CONTENT_TYPE)
            .set_acl(public_read.then_some(ObjectCannedAcl::PublicRead))
            .body(body)
            .send()
            .await
            .with_context(|| format!("put_object s3://{}/{}", bucket, key))?;

        info!(object = %remote, "uploaded to S3");
        Ok(())
    }
}
