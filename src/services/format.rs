//! Output format handling service
//!
//! Keeps format-specific decisions (pixel layout, MIME types, extensions) out
//! of the tools themselves.

use crate::config::OutputFormat;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::path::Path;

/// Service for handling output format conversions
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Convert an RGBA raster into the pixel layout the format stores
    ///
    /// JPEG drops the alpha channel; every other format keeps RGBA.
    ///
    /// # Examples
    /// ```rust
    /// use inkflow_studio::{config::OutputFormat, services::OutputFormatHandler};
    /// use image::RgbaImage;
    ///
    /// let converted = OutputFormatHandler::convert_format(RgbaImage::new(4, 4), OutputFormat::Jpeg);
    /// assert!(converted.as_rgb8().is_some());
    /// ```
    #[must_use]
    pub fn convert_format(rgba_image: RgbaImage, format: OutputFormat) -> DynamicImage {
        match format {
            OutputFormat::Png | OutputFormat::WebP => DynamicImage::ImageRgba8(rgba_image),
            OutputFormat::Jpeg => {
                DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba_image).to_rgb8())
            },
        }
    }

    /// File extension (without the dot)
    #[must_use]
    pub fn get_extension(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
        }
    }

    #[must_use]
    pub fn mime_type(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
        }
    }

    #[must_use]
    pub fn image_format(format: OutputFormat) -> ImageFormat {
        match format {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::WebP => ImageFormat::WebP,
        }
    }

    /// Infer the output format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<OutputFormat> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "webp" => Some(OutputFormat::WebP),
            _ => None,
        }
    }

    /// Check if a format supports transparency (alpha channel)
    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        match format {
            OutputFormat::Png | OutputFormat::WebP => true,
            OutputFormat::Jpeg => false,
        }
    }

    /// Warn when a keyed-out result is about to lose its transparency
    pub fn validate_for_key_out(format: OutputFormat) {
        if !Self::supports_transparency(format) {
            log::warn!(
                "Output format {:?} does not support transparency. Keyed-out designs will be flattened onto black.",
                format
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_convert_format_png_keeps_alpha() {
        let rgba_image = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 0]));
        let converted = OutputFormatHandler::convert_format(rgba_image, OutputFormat::Png);
        let rgba = converted.as_rgba8().unwrap();
        assert_eq!(rgba.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_convert_format_jpeg() {
        let rgba_image = RgbaImage::from_pixel(2, 3, Rgba([255, 0, 0, 128]));
        let converted = OutputFormatHandler::convert_format(rgba_image, OutputFormat::Jpeg);
        assert_eq!((converted.width(), converted.height()), (2, 3));
        match converted {
            DynamicImage::ImageRgb8(_) => {},
            _ => panic!("Expected RGB8 image for JPEG format"),
        }
    }

    #[test]
    fn test_extension_and_mime() {
        assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Jpeg), "jpg");
        assert_eq!(OutputFormatHandler::mime_type(OutputFormat::WebP), "image/webp");
        assert_eq!(
            OutputFormatHandler::image_format(OutputFormat::Png),
            ImageFormat::Png
        );
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            OutputFormatHandler::from_path("out/design.JPEG"),
            Some(OutputFormat::Jpeg)
        );
        assert_eq!(
            OutputFormatHandler::from_path("design.webp"),
            Some(OutputFormat::WebP)
        );
        assert_eq!(OutputFormatHandler::from_path("design.gif"), None);
        assert_eq!(OutputFormatHandler::from_path("design"), None);
    }

    #[test]
    fn test_supports_transparency() {
        assert!(OutputFormatHandler::supports_transparency(OutputFormat::Png));
        assert!(OutputFormatHandler::supports_transparency(OutputFormat::WebP));
        assert!(!OutputFormatHandler::supports_transparency(OutputFormat::Jpeg));
    }
}
