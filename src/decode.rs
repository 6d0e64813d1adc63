//! Asynchronous image decoding
//!
//! Each decode is one explicit task with a single success or failure outcome.
//! The pixel work runs on tokio's blocking pool so that hosts driving the
//! tools from an async context never stall their executor.

use crate::error::{Result, StudioError};
use crate::geometry::PixelSize;
use crate::types::ImageAsset;
use image::DynamicImage;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Decode an encoded asset into pixels synchronously
///
/// # Errors
/// - `Decode` when the payload is empty or the codec rejects it
pub fn decode_now(asset: &ImageAsset) -> Result<DynamicImage> {
    if asset.is_empty() {
        return Err(StudioError::decode("image payload is empty"));
    }
    image::load_from_memory(asset.as_bytes()).map_err(|e| {
        StudioError::decode(format!(
            "failed to decode {} ({} bytes): {}",
            asset.mime_type(),
            asset.len(),
            e
        ))
    })
}

/// Decode an asset on the blocking pool
///
/// # Errors
/// - `Decode` when the codec rejects the payload
/// - `Internal` when the blocking task panics or is aborted
pub async fn decode_asset(asset: &ImageAsset) -> Result<DynamicImage> {
    let owned = asset.clone();
    let image = tokio::task::spawn_blocking(move || decode_now(&owned))
        .await
        .map_err(|e| StudioError::internal(format!("decode task failed: {}", e)))??;

    debug!(
        mime = asset.mime_type(),
        width = image.width(),
        height = image.height(),
        "Decoded image asset"
    );
    Ok(image)
}

/// Decode an asset, giving up early when `token` is cancelled
///
/// The blocking work itself is not interrupted; its result is discarded.
///
/// # Errors
/// - `Cancelled` when the token fires before the decode finishes
/// - Everything [`decode_asset`] can return
pub async fn decode_cancellable(
    asset: &ImageAsset,
    token: &CancellationToken,
) -> Result<DynamicImage> {
    tokio::select! {
        biased;
        () = token.cancelled() => Err(StudioError::cancelled("image decode")),
        result = decode_asset(asset) => result,
    }
}

/// Natural pixel dimensions of an asset
///
/// # Errors
/// - Everything [`decode_asset`] can return
pub async fn natural_size(asset: &ImageAsset) -> Result<PixelSize> {
    let image = decode_asset(asset).await?;
    Ok(PixelSize::new(image.width(), image.height()))
}
