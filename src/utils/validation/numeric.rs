//! Numeric validation utilities
//!
//! Range and finiteness checks for host-supplied geometry and slider values.

use crate::error::{Result, StudioError};
use crate::geometry::Size;

/// Validator for numeric inputs
pub struct NumericValidator;

impl NumericValidator {
    /// Validate a display or viewport size: both sides finite and positive
    pub fn validate_display_size(size: Size, name: &str) -> Result<Size> {
        if !size.width.is_finite() || !size.height.is_finite() {
            return Err(StudioError::invalid_input(format!(
                "{} must be finite, got {} x {}",
                name, size.width, size.height
            )));
        }
        if size.is_empty() {
            return Err(StudioError::invalid_input(format!(
                "{} must be positive, got {} x {}",
                name, size.width, size.height
            )));
        }
        Ok(size)
    }

    /// Validate an inclusive range; NaN is rejected
    pub fn validate_range<T>(value: T, min: T, max: T, name: &str) -> Result<T>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if !(value >= min && value <= max) {
            return Err(StudioError::config_value_error(
                name,
                value,
                &format!("{}-{}", min, max),
                None,
            ));
        }
        Ok(value)
    }

    /// Validate that a value is greater than zero
    pub fn validate_positive<T>(value: T, name: &str) -> Result<T>
    where
        T: PartialOrd + std::fmt::Display + Copy + Default,
    {
        // NaN compares as None and is rejected
        if value.partial_cmp(&T::default()) != Some(std::cmp::Ordering::Greater) {
            return Err(StudioError::config_value_error(name, value, "> 0", None));
        }
        Ok(value)
    }

    /// Validate a finite, positive length such as a width in pixels
    pub fn validate_length(value: f64, name: &str) -> Result<f64> {
        if !value.is_finite() {
            return Err(StudioError::config_value_error(name, value, "finite, > 0", None));
        }
        Self::validate_positive(value, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_display_size() {
        assert!(NumericValidator::validate_display_size(Size::new(10.0, 5.0), "display").is_ok());
        let err =
            NumericValidator::validate_display_size(Size::new(0.0, 5.0), "display").unwrap_err();
        assert!(err.to_string().contains("display must be positive"));
        assert!(
            NumericValidator::validate_display_size(Size::new(f64::INFINITY, 5.0), "display")
                .is_err()
        );
    }

    #[test]
    fn test_validate_range() {
        assert_eq!(NumericValidator::validate_range(5, 0, 10, "test").unwrap(), 5);
        assert!(NumericValidator::validate_range(1.0, 0.3, 1.0, "opacity").is_ok());
        let err = NumericValidator::validate_range(0.1, 0.3, 1.0, "opacity").unwrap_err();
        assert!(matches!(err, StudioError::InvalidConfig(_)));
        assert!(err.to_string().contains("opacity: 0.1 (valid range: 0.3-1)"));
        assert!(NumericValidator::validate_range(f64::NAN, 0.3, 1.0, "opacity").is_err());
    }

    #[test]
    fn test_validate_positive() {
        assert!(NumericValidator::validate_positive(200.0, "base width").is_ok());
        assert!(NumericValidator::validate_positive(0.0, "base width").is_err());
        assert!(NumericValidator::validate_positive(f64::NAN, "base width").is_err());
        assert!(NumericValidator::validate_positive(-3, "count").is_err());
        assert_eq!(NumericValidator::validate_positive(1u64, "timeout").unwrap(), 1);
    }

    #[test]
    fn test_validate_length() {
        assert!(NumericValidator::validate_length(200.0, "base width").is_ok());
        assert!(NumericValidator::validate_length(f64::INFINITY, "base width").is_err());
        assert!(NumericValidator::validate_length(-1.0, "base width").is_err());
    }
}
