//! Object storage API: `MediaStore` over `/storage/v1`.

use async_trait::async_trait;
use bytes::Bytes;
use ls_core::traits::MediaStore;
use tracing::debug;

use crate::{ensure_success, RestBackend};

#[async_trait]
impl MediaStore for RestBackend {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> anyhow::Result<()> {
        let size = data.len();
        let request = self
            .http
            .post(self.object_url(&["storage", "v1", "object"], bucket, key))
            .header("Content-Type", content_type)
            .body(data);
        ensure_success(self.authorized(request)?.send().await?).await?;
        debug!(%bucket, %key, bytes = size, "object uploaded");
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.object_url(&["storage", "v1", "object", "public"], bucket, key)
            .into()
    }
}
