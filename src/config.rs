//! Configuration types for studio operations

use crate::error::{Result, StudioError};
use crate::key_out::DEFAULT_THRESHOLD;
use crate::placement::OPACITY_RANGE;
use crate::utils::validation::NumericValidator;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output image format options for tool results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    Png,
    /// JPEG (no transparency, alpha dropped)
    Jpeg,
    /// WebP with alpha channel transparency (lossless)
    WebP,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpeg"),
            Self::WebP => write!(f, "webp"),
        }
    }
}

/// Settings for the placement compositor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Reference width of the overlay in container pixels at scale 1.0
    pub base_width: f64,

    /// Overlay opacity when the compositor becomes ready
    pub initial_opacity: f64,

    /// Key-out threshold applied to the foreground before placement
    pub key_out_threshold: u8,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            base_width: 200.0,
            initial_opacity: 0.85,
            key_out_threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Settings for the external generative design service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the generative language API
    pub base_url: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Model used for design generation, enhancement and simulation
    pub image_model: String,

    /// Model used for text refinement
    pub text_model: String,

    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "API_KEY".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

/// Configuration for the studio engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Output format for tool results (crop, key-out, composite)
    pub output_format: OutputFormat,

    /// JPEG quality (0-100, only used for JPEG output)
    pub jpeg_quality: u8,

    /// Placement compositor settings
    pub placement: PlacementConfig,

    /// Generative service settings
    pub generation: GenerationConfig,

    /// Enable debug mode (additional logging)
    pub debug: bool,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            jpeg_quality: 90,
            placement: PlacementConfig::default(),
            generation: GenerationConfig::default(),
            debug: false,
        }
    }
}

impl StudioConfig {
    #[must_use]
    pub fn builder() -> StudioConfigBuilder {
        StudioConfigBuilder::default()
    }

    /// Default location of the JSON config file (`<config dir>/inkflow/config.json`)
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("inkflow").join("config.json"))
    }

    /// Load and validate a JSON config file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref)
            .map_err(|e| StudioError::file_io_error("read config file", path_ref, &e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            StudioError::invalid_config(format!(
                "Failed to parse config file '{}': {}",
                path_ref.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        NumericValidator::validate_range(self.jpeg_quality, 0, 100, "JPEG quality")?;
        NumericValidator::validate_length(self.placement.base_width, "placement base width")?;
        NumericValidator::validate_range(
            self.placement.initial_opacity,
            OPACITY_RANGE.min,
            OPACITY_RANGE.max,
            "initial opacity",
        )?;

        if self.generation.base_url.trim().is_empty() {
            return Err(StudioError::invalid_config(
                "Generation base URL must not be empty",
            ));
        }

        NumericValidator::validate_positive(
            self.generation.request_timeout_secs,
            "request timeout (seconds)",
        )?;
        NumericValidator::validate_positive(
            self.generation.connect_timeout_secs,
            "connect timeout (seconds)",
        )?;

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct StudioConfigBuilder {
    config: StudioConfig,
}

impl StudioConfigBuilder {
    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.min(100);
        self
    }

    #[must_use]
    pub fn key_out_threshold(mut self, threshold: u8) -> Self {
        self.config.placement.key_out_threshold = threshold;
        self
    }

    #[must_use]
    pub fn base_width(mut self, width: f64) -> Self {
        self.config.placement.base_width = width;
        self
    }

    #[must_use]
    pub fn initial_opacity(mut self, opacity: f64) -> Self {
        self.config.placement.initial_opacity =
            opacity.clamp(OPACITY_RANGE.min, OPACITY_RANGE.max);
        self
    }

    #[must_use]
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    #[must_use]
    pub fn api_key_env<S: Into<String>>(mut self, name: S) -> Self {
        self.config.generation.api_key_env = name.into();
        self
    }

    #[must_use]
    pub fn base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.generation.base_url = url.into();
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn build(self) -> Result<StudioConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}
