// src/publish/mod.rs
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::{
    config::SourceConfig,
    error::PublishError,
    resolve::{remote_path, resolve, SourceIdentity},
    store::ObjectStore,
    transform::{convert_file, TransformStats},
};

mod scratch;

pub use scratch::ScratchFile;

pub const DEFAULT_BASE_REMOTE_PATH: &str = "s3://libpostal/inputs/openaddresses";

/// Outcome of one converted and uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub local: PathBuf,
    pub remote: String,
    pub stats: TransformStats,
}

/// Converts configured OpenAddresses CSVs to GeoJSON lines and uploads them, one at a time.
pub struct Publisher<S> {
    store: S,
    config: SourceConfig,
}

impl<S: ObjectStore> Publisher<S> {
    pub fn new(store: S, config: SourceConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Directory: publish every configured source below it. File: resolve it and publish it alone.
    pub async fn publish(&self, path: &Path, base_remote: &str) -> Result<Vec<PublishReport>> {
        if path.is_dir() {
            return self.publish_tree(path, base_remote).await;
        }

        let identity = resolve(&self.config, path);
        let remote = remote_path(base_remote, &identity)
            .ok_or_else(|| PublishError::SourceUnresolved(path.to_path_buf()))?;

        let report = self.publish_file(path, &remote, &identity.label()).await?;
        Ok(vec![report])
    }

    /// Publish each source declared in the configuration, in declaration order.
    /// The filesystem is not scanned; a configured file that is missing fails the run.
    #[instrument(level = "info", skip(self), fields(base_dir = %base_dir.display()))]
    pub async fn publish_tree(
        &self,
        base_dir: &Path,
        base_remote: &str,
    ) -> Result<Vec<PublishReport>> {
        let sources = self.config.sources();
        info!(count = sources.len(), "publishing configured sources");

        let mut reports = Vec::with_capacity(sources.len());
        for source in sources {
            let mut local = base_dir.to_path_buf();
            local.extend(source.dirs());
            local.push(format!("{}.csv", source.source));

            let identity = SourceIdentity::from(source);
            let remote = remote_path(base_remote, &identity)
                .ok_or_else(|| anyhow!("no remote path for {:?}", source))?;

            reports.push(self.publish_file(&local, &remote, &identity.label()).await?);
        }

        info!(published = reports.len(), "tree done");
        Ok(reports)
    }

    /// Convert `local` next to itself, upload the result publicly readable, then remove it.
    #[instrument(level = "info", skip(self), fields(local = %local.display()))]
    pub async fn publish_file(
        &self,
        local: &Path,
        remote: &str,
        source: &str,
    ) -> Result<PublishReport> {
        let scratch = ScratchFile::for_input(local)?;
        info!(output = %scratch.path().display(), "converting");

        // CSV parsing is blocking work
        let stats = tokio::task::spawn_blocking({
            let input = local.to_path_buf();
            let output = scratch.path().to_path_buf();
            let source = source.to_string();
            move || convert_file(&input, &output, &source)
        })
        .await??;

        info!(remote, "uploading");
        self.store
            .upload(scratch.path(), remote, true)
            .await
            .map_err(|source| PublishError::UploadFailed {
                remote: remote.to_string(),
                source,
            })?;
        info!(remote, features = stats.features, "done uploading");

        Ok(PublishReport {
            local: local.to_path_buf(),
            remote: remote.to_string(),
            stats,
        })
    }
}
