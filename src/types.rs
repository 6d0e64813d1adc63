//! Core data types shared by every tool: encoded image assets and tool outcomes

use crate::error::{Result, StudioError};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A self-describing encoded raster image (format + payload)
///
/// Assets are what crosses every boundary in the crate: tool inputs, tool
/// outputs and generative service calls. Raw pixel buffers never leave the
/// module that decoded them. Serialises as a `data:` URI.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    mime_type: String,
    data: Vec<u8>,
}

impl ImageAsset {
    /// Wrap encoded bytes with an explicit MIME type
    pub fn new<S: Into<String>>(mime_type: S, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Wrap encoded bytes, sniffing the MIME type from the payload signature
    ///
    /// # Errors
    /// - `InvalidInput` when the bytes are not a recognised image format
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let format = image::guess_format(&data).map_err(|e| {
            StudioError::invalid_input(format!("Unrecognised image payload: {}", e))
        })?;
        Ok(Self::new(format.to_mime_type(), data))
    }

    /// Parse a `data:<mime>;base64,<payload>` URI
    ///
    /// # Errors
    /// - `InvalidInput` for a missing `data:` prefix, missing comma separator,
    ///   non-base64 encoding or an undecodable base64 payload
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| StudioError::invalid_input("Image data must be a data: URI"))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| StudioError::invalid_input("Invalid image data: missing ',' separator"))?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| {
                StudioError::invalid_input("Invalid image data: only base64 data URIs are supported")
            })?;

        if mime_type.is_empty() {
            return Err(StudioError::invalid_input("Invalid image data: missing MIME type"));
        }

        let data = STANDARD.decode(payload.trim()).map_err(|e| {
            StudioError::invalid_input(format!("Invalid image data: bad base64 payload: {}", e))
        })?;

        Ok(Self::new(mime_type, data))
    }

    /// Render the asset as a `data:` URI
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_payload())
    }

    /// Base64 payload without the `data:` header
    #[must_use]
    pub fn base64_payload(&self) -> String {
        STANDARD.encode(&self.data)
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Image format detected from the payload signature
    #[must_use]
    pub fn format(&self) -> Option<ImageFormat> {
        image::guess_format(&self.data).ok()
    }

    /// Check that the payload looks like an encoded image without decoding it
    ///
    /// # Errors
    /// - `InvalidInput` for empty payloads or unknown signatures
    pub fn ensure_encoded_image(&self) -> Result<()> {
        if self.data.is_empty() {
            return Err(StudioError::invalid_input("Invalid image data: empty payload"));
        }
        if !self.mime_type.starts_with("image/") {
            return Err(StudioError::invalid_input(format!(
                "Invalid image data: MIME type '{}' is not an image",
                self.mime_type
            )));
        }
        if self.format().is_none() {
            return Err(StudioError::invalid_input(
                "Invalid image data: payload is not a recognised image format",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAsset")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Serialize for ImageAsset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_uri())
    }
}

impl<'de> Deserialize<'de> for ImageAsset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let uri = String::deserialize(deserializer)?;
        Self::from_data_uri(&uri).map_err(serde::de::Error::custom)
    }
}

/// How an interactive tool session ended
///
/// Every tool reports exactly one of these to its caller. Decode failures are
/// an explicit variant so hosts can show a fallback instead of waiting forever.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The tool produced an output image
    Completed(ImageAsset),
    /// The user dismissed the tool
    Cancelled,
    /// An input image could not be decoded
    DecodeFailed { reason: String },
}

impl ToolOutcome {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The produced asset, if the tool completed
    #[must_use]
    pub fn into_asset(self) -> Option<ImageAsset> {
        match self {
            Self::Completed(asset) => Some(asset),
            Self::Cancelled | Self::DecodeFailed { .. } => None,
        }
    }

    /// Message a host can show when the tool did not complete
    #[must_use]
    pub fn fallback_message(&self) -> Option<&'static str> {
        match self {
            Self::Completed(_) => None,
            Self::Cancelled => Some("Editing cancelled."),
            Self::DecodeFailed { .. } => {
                Some("We couldn't read that image. Please try a different photo.")
            },
        }
    }
}
