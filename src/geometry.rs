//! Coordinate spaces: display (container) space versus natural (pixel) space.
//!
//! Hosts report pointer positions and element sizes in display space. Pixel
//! work happens in natural space. Everything that crosses between the two
//! goes through this module.

use serde::{Deserialize, Serialize};

/// A point in display or natural space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp into `[0, size.width] x [0, size.height]`
    #[must_use]
    pub fn clamp_to(self, size: Size) -> Self {
        Self {
            x: self.x.clamp(0.0, size.width.max(0.0)),
            y: self.y.clamp(0.0, size.height.max(0.0)),
        }
    }
}

/// A logical size in display space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }

    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Intrinsic pixel dimensions of a decoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    #[must_use]
    pub fn as_size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

impl From<(u32, u32)> for PixelSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding box of two corner points
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// True when the rectangle lies inside `[0, size.width] x [0, size.height]`
    #[must_use]
    pub fn fits_within(&self, size: Size) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.right() <= size.width
            && self.bottom() <= size.height
    }

    /// Scale each axis independently
    #[must_use]
    pub fn scale(&self, scale_x: f64, scale_y: f64) -> Self {
        Self {
            x: self.x * scale_x,
            y: self.y * scale_y,
            width: self.width * scale_x,
            height: self.height * scale_y,
        }
    }
}

/// Per-axis factor mapping display space onto natural space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayScale {
    pub x: f64,
    pub y: f64,
}

impl DisplayScale {
    /// `natural / display` on each axis
    #[must_use]
    pub fn between(natural: PixelSize, display: Size) -> Self {
        Self {
            x: f64::from(natural.width) / display.width,
            y: f64::from(natural.height) / display.height,
        }
    }

    #[must_use]
    pub fn to_natural(&self, rect: Rect) -> Rect {
        rect.scale(self.x, self.y)
    }
}

/// Where an image lands inside a container under `object-fit: contain`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainFit {
    pub render_width: f64,
    pub render_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Natural pixels per rendered display pixel (uniform on both axes)
    pub scale_factor: f64,
}

impl ContainFit {
    /// Fit an image of `natural` size inside a container of `display` size
    ///
    /// A container wider than the image ratio letterboxes horizontally
    /// (bars left and right), otherwise vertically (bars top and bottom).
    #[must_use]
    pub fn compute(display: Size, natural: PixelSize) -> Self {
        let display_ratio = display.aspect_ratio();
        let natural_ratio = natural.aspect_ratio();

        let (render_width, render_height, offset_x, offset_y) = if display_ratio > natural_ratio {
            let render_height = display.height;
            let render_width = render_height * natural_ratio;
            (
                render_width,
                render_height,
                (display.width - render_width) / 2.0,
                0.0,
            )
        } else {
            let render_width = display.width;
            let render_height = render_width / natural_ratio;
            (
                render_width,
                render_height,
                0.0,
                (display.height - render_height) / 2.0,
            )
        };

        Self {
            render_width,
            render_height,
            offset_x,
            offset_y,
            scale_factor: f64::from(natural.width) / render_width,
        }
    }

    /// Map a container-space point onto natural image pixels
    #[must_use]
    pub fn to_natural(&self, point: Point) -> Point {
        Point {
            x: (point.x - self.offset_x) * self.scale_factor,
            y: (point.y - self.offset_y) * self.scale_factor,
        }
    }

    /// Map a container-space length onto natural image pixels
    #[must_use]
    pub fn length_to_natural(&self, length: f64) -> f64 {
        length * self.scale_factor
    }
}
