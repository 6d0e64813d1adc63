//! Image asset I/O service
//!
//! File and stream access plus raster encoding live here so the tools only
//! ever see `ImageAsset`s and pixel buffers.

use crate::{
    config::OutputFormat,
    error::{Result, StudioError},
    services::OutputFormatHandler,
    types::ImageAsset,
};
use image::{DynamicImage, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Service for reading, writing and encoding image assets
pub struct ImageIOService;

impl ImageIOService {
    /// Load an encoded image file as an asset
    ///
    /// The MIME type is sniffed from the file contents, not the extension.
    ///
    /// # Examples
    /// ```rust,no_run
    /// use inkflow_studio::services::ImageIOService;
    ///
    /// let photo = ImageIOService::load_asset("body.jpg")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_asset<P: AsRef<Path>>(path: P) -> Result<ImageAsset> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(StudioError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        let data = std::fs::read(path_ref)
            .map_err(|e| StudioError::file_io_error("read image data", path_ref, &e))?;

        let asset = ImageAsset::from_bytes(data).map_err(|e| {
            StudioError::invalid_input(format!("'{}': {}", path_ref.display(), e))
        })?;
        log::debug!(
            "Loaded {} ({}, {} bytes)",
            path_ref.display(),
            asset.mime_type(),
            asset.len()
        );
        Ok(asset)
    }

    /// Write an asset's encoded bytes to disk, creating parent directories
    pub fn save_asset<P: AsRef<Path>>(asset: &ImageAsset, path: P) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StudioError::file_io_error("create output directory", parent, &e)
                })?;
            }
        }

        std::fs::write(path_ref, asset.as_bytes())
            .map_err(|e| StudioError::file_io_error("write image file", path_ref, &e))?;
        log::debug!(
            "Saved {} ({}, {} bytes)",
            path_ref.display(),
            asset.mime_type(),
            asset.len()
        );
        Ok(())
    }

    /// Encode a raster into an asset of the given format
    ///
    /// `quality` only applies to JPEG. WebP is written lossless.
    pub fn encode_image(
        image: &DynamicImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<ImageAsset> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        match format {
            OutputFormat::Png => image
                .write_to(&mut cursor, image::ImageFormat::Png)
                .map_err(|e| StudioError::encode(format!("Failed to encode PNG: {}", e)))?,
            OutputFormat::Jpeg => {
                let rgb_image = image.to_rgb8();
                let mut jpeg_encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
                jpeg_encoder
                    .encode_image(&rgb_image)
                    .map_err(|e| StudioError::encode(format!("Failed to encode JPEG: {}", e)))?;
            },
            OutputFormat::WebP => image
                .write_to(&mut cursor, image::ImageFormat::WebP)
                .map_err(|e| StudioError::encode(format!("Failed to encode WebP: {}", e)))?,
        }

        Ok(ImageAsset::new(
            OutputFormatHandler::mime_type(format),
            buffer,
        ))
    }

    /// Encode an RGBA raster as PNG, the format every tool emits by default
    pub fn encode_png(image: RgbaImage) -> Result<ImageAsset> {
        Self::encode_image(&DynamicImage::ImageRgba8(image), OutputFormat::Png, 100)
    }

    /// Check if a file path has a supported image extension
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| {
                matches!(
                    ext.as_str(),
                    "jpg" | "jpeg" | "png" | "webp" | "tiff" | "tif" | "bmp"
                )
            })
    }

    /// Load an asset from an async reader
    pub async fn load_from_reader<R: tokio::io::AsyncRead + Unpin>(
        mut reader: R,
    ) -> Result<ImageAsset> {
        use tokio::io::AsyncReadExt;

        let mut buffer = Vec::new();
        AsyncReadExt::read_to_end(&mut reader, &mut buffer)
            .await
            .map_err(|e| StudioError::invalid_input(format!("Failed to read from stream: {}", e)))?;

        ImageAsset::from_bytes(buffer)
    }

    /// Write an asset to an async writer, returning the number of bytes written
    pub async fn save_to_writer<W: tokio::io::AsyncWrite + Unpin>(
        asset: &ImageAsset,
        mut writer: W,
    ) -> Result<u64> {
        use tokio::io::AsyncWriteExt;

        AsyncWriteExt::write_all(&mut writer, asset.as_bytes()).await?;
        AsyncWriteExt::flush(&mut writer).await?;

        Ok(asset.len() as u64)
    }
}
