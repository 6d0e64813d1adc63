//! Error types for studio operations

use thiserror::Error;

/// Result type alias for studio operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Error types for image tools, the booking wizard and the design service
#[derive(Error, Debug)]
pub enum StudioError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image codec errors surfaced directly by the `image` crate
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// An encoded asset could not be decoded into pixels
    #[error("Decode error: {0}")]
    Decode(String),

    /// A raster could not be encoded into an asset
    #[error("Encode error: {0}")]
    Encode(String),

    /// Caller-supplied data was rejected before any work was done
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Crop confirmed with a zero-width or zero-height selection
    #[error("Crop selection is empty ({width} x {height})")]
    EmptySelection { width: f64, height: f64 },

    /// Operation requires a tool that is still processing its inputs
    #[error("Not ready: {0}")]
    NotReady(String),

    /// The external generative service failed or returned no image
    #[error("Generation error: {0}")]
    Generation(String),

    /// An in-flight operation was cancelled by its caller
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudioError {
    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new encode error
    pub fn encode<S: Into<String>>(msg: S) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new not-ready error
    pub fn not_ready<S: Into<String>>(msg: S) -> Self {
        Self::NotReady(msg.into())
    }

    /// Create a new generation error
    pub fn generation<S: Into<String>>(msg: S) -> Self {
        Self::Generation(msg.into())
    }

    /// Create a new cancellation error
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Create generation error naming the service operation that failed
    pub fn generation_error_with_operation(operation: &str, model: &str, error: &str) -> Self {
        Self::Generation(format!(
            "{} failed using model '{}': {}",
            operation, model, error
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = StudioError::invalid_config("test config error");
        assert!(matches!(err, StudioError::InvalidConfig(_)));

        let err = StudioError::invalid_input("not an image");
        assert!(matches!(err, StudioError::InvalidInput(_)));

        let err = StudioError::generation("no image generated");
        assert!(matches!(err, StudioError::Generation(_)));
    }

    #[test]
    fn test_error_display() {
        let err = StudioError::invalid_config("Invalid base width");
        assert_eq!(err.to_string(), "Invalid configuration: Invalid base width");

        let err = StudioError::EmptySelection {
            width: 0.0,
            height: 12.0,
        };
        assert_eq!(err.to_string(), "Crop selection is empty (0 x 12)");
    }

    #[test]
    fn test_enhanced_error_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = StudioError::file_io_error("read design", Path::new("/tmp/design.png"), &io_error);
        let error_string = err.to_string();
        assert!(error_string.contains("read design"));
        assert!(error_string.contains("/tmp/design.png"));

        let err = StudioError::config_value_error("key-out threshold", 300, "0-255", Some(220));
        let error_string = err.to_string();
        assert!(error_string.contains("key-out threshold"));
        assert!(error_string.contains("300"));
        assert!(error_string.contains("Recommended: 220"));

        let err = StudioError::generation_error_with_operation(
            "Design generation",
            "gemini-2.5-flash-image",
            "quota exceeded",
        );
        let error_string = err.to_string();
        assert!(error_string.contains("Design generation"));
        assert!(error_string.contains("gemini-2.5-flash-image"));
        assert!(error_string.contains("quota exceeded"));
    }
}
