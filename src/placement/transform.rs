//! Screen-space overlay transform and its slider ranges

use crate::geometry::Point;
use serde::{Deserialize, Serialize};

/// A bounded, stepped slider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

pub const SCALE_RANGE: SliderRange = SliderRange {
    min: 0.2,
    max: 3.0,
    step: 0.1,
};

/// Upper bound is exclusive after wrapping: 360 turns into 0
pub const ROTATION_RANGE: SliderRange = SliderRange {
    min: 0.0,
    max: 360.0,
    step: 1.0,
};

pub const OPACITY_RANGE: SliderRange = SliderRange {
    min: 0.3,
    max: 1.0,
    step: 0.05,
};

impl SliderRange {
    /// Clamp into range and snap to the nearest step from `min`
    #[must_use]
    pub fn snap(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.min;
        }
        let clamped = value.clamp(self.min, self.max);
        let steps = ((clamped - self.min) / self.step).round();
        let snapped = (self.min + steps * self.step).clamp(self.min, self.max);
        // Strip accumulated float noise (0.30000000000000004 and friends)
        (snapped * 1e6).round() / 1e6
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Where the overlay sits in container space
///
/// `position` is the top-left of a reference overlay whose width at scale 1.0
/// is the compositor's base width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementTransform {
    pub position: Point,
    pub scale: f64,
    /// Whole degrees, `0..360`
    pub rotation_degrees: u16,
    pub opacity: f64,
}

impl Default for PlacementTransform {
    fn default() -> Self {
        Self {
            position: Point::default(),
            scale: 1.0,
            rotation_degrees: 0,
            opacity: 0.85,
        }
    }
}

impl PlacementTransform {
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = SCALE_RANGE.snap(scale);
        self
    }

    /// Rounds to a whole degree and wraps into `0..360`
    #[must_use]
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation_degrees = normalize_rotation(degrees);
        self
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = OPACITY_RANGE.snap(opacity);
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn rotation_radians(&self) -> f64 {
        f64::from(self.rotation_degrees).to_radians()
    }

    /// Size slider label, e.g. `"1.5x"`
    #[must_use]
    pub fn scale_label(&self) -> String {
        format!("{:.1}x", self.scale)
    }

    /// Rotation slider label, e.g. `"45°"`
    #[must_use]
    pub fn rotation_label(&self) -> String {
        format!("{}°", self.rotation_degrees)
    }

    /// Opacity slider label, e.g. `"85%"`
    #[must_use]
    pub fn opacity_label(&self) -> String {
        format!("{:.0}%", self.opacity * 100.0)
    }
}

fn normalize_rotation(degrees: f64) -> u16 {
    if !degrees.is_finite() {
        return 0;
    }
    degrees.round().rem_euclid(360.0) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let t = PlacementTransform::default();
        assert_eq!(t.scale, 1.0);
        assert_eq!(t.rotation_degrees, 0);
        assert_eq!(t.opacity, 0.85);
    }

    #[test]
    fn test_scale_snaps_and_clamps() {
        assert_eq!(SCALE_RANGE.snap(1.04), 1.0);
        assert_eq!(SCALE_RANGE.snap(1.46), 1.5);
        assert_eq!(SCALE_RANGE.snap(0.0), 0.2);
        assert_eq!(SCALE_RANGE.snap(9.0), 3.0);
        assert_eq!(SCALE_RANGE.snap(f64::NAN), 0.2);
        assert_eq!(SCALE_RANGE.snap(0.3), 0.3);
    }

    #[test]
    fn test_opacity_snaps_and_clamps() {
        assert_eq!(OPACITY_RANGE.snap(0.87), 0.85);
        assert_eq!(OPACITY_RANGE.snap(0.1), 0.3);
        assert_eq!(OPACITY_RANGE.snap(1.2), 1.0);
        assert!(OPACITY_RANGE.contains(OPACITY_RANGE.snap(0.66)));
    }

    #[test]
    fn test_rotation_wraps() {
        let t = PlacementTransform::default();
        assert_eq!(t.with_rotation(45.4).rotation_degrees, 45);
        assert_eq!(t.with_rotation(360.0).rotation_degrees, 0);
        assert_eq!(t.with_rotation(-90.0).rotation_degrees, 270);
        assert_eq!(t.with_rotation(725.0).rotation_degrees, 5);
        assert_eq!(t.with_rotation(f64::INFINITY).rotation_degrees, 0);
    }

    #[test]
    fn test_labels() {
        let t = PlacementTransform::default()
            .with_scale(1.5)
            .with_rotation(45.0)
            .with_opacity(0.85);
        assert_eq!(t.scale_label(), "1.5x");
        assert_eq!(t.rotation_label(), "45°");
        assert_eq!(t.opacity_label(), "85%");
    }
}
