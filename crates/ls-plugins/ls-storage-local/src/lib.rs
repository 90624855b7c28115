//! # ls-storage-local
//! linkspace/crates/ls-plugins/ls-storage-local/src/lib.rs
//! Local filesystem implementation of `MediaStore`.
//! Objects live at `<root>/<bucket>/<key>` and are never overwritten.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context};
use async_trait::async_trait;
use bytes::Bytes;
use ls_core::traits::MediaStore;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub struct LocalMediaStore {
    /// Root directory for all buckets (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "http://localhost:8080/uploads")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        Self {
            root_path: root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Resolves `bucket/key` under the root, refusing anything that could
    /// escape it.
    fn object_path(&self, bucket: &str, key: &str) -> anyhow::Result<PathBuf> {
        let mut path = self.root_path.clone();
        for part in [bucket, key] {
            let relative = Path::new(part);
            if part.is_empty()
                || !relative
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)))
            {
                bail!("invalid object path segment: {part:?}");
            }
            path.push(relative);
        }
        Ok(path)
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> anyhow::Result<()> {
        let target_path = self.object_path(bucket, key)?;
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target_path)
            .await
            .with_context(|| format!("object {bucket}/{key} already exists or is not writable"))?;
        file.write_all(&data).await?;
        file.flush().await?;

        debug!(%bucket, %key, bytes = data.len(), %content_type, "object stored");
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.url_prefix, bucket, key)
    }
}
