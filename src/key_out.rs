//! Background key-out: near-white pixels become fully transparent
//!
//! Sketches and generated designs usually arrive on white paper. Keying out
//! the paper lets the multiply blend in the compositor show skin through the
//! design. The operation is best-effort: if the input cannot be decoded or the
//! result cannot be encoded, the caller gets the original image back.

use crate::decode::decode_asset;
use crate::error::{Result, StudioError};
use crate::services::ImageIOService;
use crate::types::ImageAsset;
use image::{DynamicImage, RgbaImage};
use tracing::{debug, instrument, warn};

/// Channel value above which a pixel counts as background
pub const DEFAULT_THRESHOLD: u8 = 220;

/// Whether a pixel's colour lies strictly above `threshold` on all of R, G and B
#[inline]
#[must_use]
pub fn is_background(pixel: &image::Rgba<u8>, threshold: u8) -> bool {
    pixel[0] > threshold && pixel[1] > threshold && pixel[2] > threshold
}

/// Key out a raster in place, returning how many pixels were made transparent
///
/// Pixels that already had alpha 0 and match are counted again; the operation
/// is idempotent either way.
pub fn key_out_pixels(image: &mut RgbaImage, threshold: u8) -> usize {
    let mut keyed = 0;
    for pixel in image.pixels_mut() {
        if is_background(pixel, threshold) {
            pixel[3] = 0;
            keyed += 1;
        }
    }
    keyed
}

/// Key out a decoded image into a new RGBA raster of identical dimensions
#[must_use]
pub fn key_out_image(image: &DynamicImage, threshold: u8) -> RgbaImage {
    let mut rgba = image.to_rgba8();
    key_out_pixels(&mut rgba, threshold);
    rgba
}

/// Remove a white background from an encoded image
///
/// Always resolves: on decode or encode failure the input is returned
/// unchanged and the failure is logged.
#[instrument(skip(asset), fields(mime = asset.mime_type(), bytes = asset.len()))]
pub async fn remove_background(asset: &ImageAsset, threshold: u8) -> ImageAsset {
    match try_remove_background(asset, threshold).await {
        Ok(keyed) => keyed,
        Err(e) => {
            warn!(error = %e, "Background key-out failed, using original image");
            asset.clone()
        },
    }
}

/// Fallible key-out used by [`remove_background`]
///
/// # Errors
/// - `Decode` when the input cannot be decoded
/// - `Encode` when the keyed raster cannot be written as PNG
pub async fn try_remove_background(asset: &ImageAsset, threshold: u8) -> Result<ImageAsset> {
    let image = decode_asset(asset).await?;

    let (keyed_asset, keyed, total) = tokio::task::spawn_blocking(move || {
        let mut rgba = image.to_rgba8();
        let keyed = key_out_pixels(&mut rgba, threshold);
        let total = rgba.width() as usize * rgba.height() as usize;
        ImageIOService::encode_png(rgba).map(|asset| (asset, keyed, total))
    })
    .await
    .map_err(|e| StudioError::internal(format!("key-out task failed: {}", e)))??;

    debug!(keyed, total, threshold, "Keyed out background pixels");
    Ok(keyed_asset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        img.put_pixel(1, 0, Rgba([200, 200, 200, 255]));
        img.put_pixel(2, 0, Rgba([221, 221, 221, 255]));
        img.put_pixel(0, 1, Rgba([220, 220, 220, 255]));
        img.put_pixel(1, 1, Rgba([250, 250, 10, 255]));
        img.put_pixel(2, 1, Rgba([230, 240, 250, 128]));
        img
    }

    #[test]
    fn test_key_out_correctness() {
        let keyed = key_out_image(&DynamicImage::ImageRgba8(sample()), DEFAULT_THRESHOLD);
        assert_eq!(keyed.get_pixel(0, 0)[3], 0);
        assert_eq!(*keyed.get_pixel(1, 0), Rgba([200, 200, 200, 255]));
        assert_eq!(keyed.get_pixel(2, 0)[3], 0);
        // Threshold itself stays opaque
        assert_eq!(keyed.get_pixel(0, 1)[3], 255);
        // One channel below threshold keeps the pixel
        assert_eq!(keyed.get_pixel(1, 1)[3], 255);
        // Existing alpha is not special-cased
        assert_eq!(*keyed.get_pixel(2, 1), Rgba([230, 240, 250, 0]));
    }

    #[test]
    fn test_key_out_preserves_colour_channels() {
        let keyed = key_out_image(&DynamicImage::ImageRgba8(sample()), DEFAULT_THRESHOLD);
        assert_eq!(keyed.dimensions(), (3, 2));
        let p = keyed.get_pixel(0, 0);
        assert_eq!([p[0], p[1], p[2]], [255, 255, 255]);
    }

    #[test]
    fn test_key_out_idempotent() {
        let mut once = sample();
        let first = key_out_pixels(&mut once, DEFAULT_THRESHOLD);
        let mut twice = once.clone();
        let second = key_out_pixels(&mut twice, DEFAULT_THRESHOLD);
        assert_eq!(once, twice);
        assert_eq!(first, 3);
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_remove_background_encodes_png() {
        let input = ImageIOService::encode_image(
            &DynamicImage::ImageRgba8(sample()),
            crate::config::OutputFormat::Png,
            100,
        )
        .unwrap();
        let output = remove_background(&input, DEFAULT_THRESHOLD).await;
        assert_eq!(output.mime_type(), "image/png");

        let decoded = image::load_from_memory(output.as_bytes()).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
        assert_eq!(decoded.get_pixel(1, 0)[3], 255);
    }

    #[tokio::test]
    async fn test_remove_background_returns_original_on_decode_failure() {
        let broken = ImageAsset::new("image/png", b"definitely not a png".to_vec());
        let output = remove_background(&broken, DEFAULT_THRESHOLD).await;
        assert_eq!(output, broken);
        assert!(try_remove_background(&broken, DEFAULT_THRESHOLD).await.is_err());
    }
}
