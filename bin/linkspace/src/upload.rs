//! Loading picked image files from disk.

use std::path::Path;

use anyhow::{bail, Context};
use ls_core::ImageUpload;
use mime_guess::mime;

/// Reads an image for upload. Files that do not look like images, or are
/// larger than `max_bytes`, are rejected before any bytes are read.
pub async fn read_image(path: &Path, max_bytes: usize) -> anyhow::Result<ImageUpload> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("not a file path: {}", path.display()))?;

    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    if content_type.type_() != mime::IMAGE {
        bail!("{file_name} is not an image ({content_type})");
    }

    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;
    if !metadata.is_file() {
        bail!("{} is not a file", path.display());
    }
    if metadata.len() > max_bytes as u64 {
        bail!("image too large");
    }

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(ImageUpload::new(file_name, bytes))
}
