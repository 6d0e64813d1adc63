//! Owned raster drawing context
//!
//! A small stand-in for a 2D canvas: one RGBA surface, an affine transform,
//! a global alpha and a blend mode. Only the operations the compositor needs
//! are implemented. Drawing is inverse-mapped: every destination pixel inside
//! the transformed image bounds is traced back into the source and sampled
//! bilinearly.

use crate::geometry::{Point, Rect};
use image::{Rgba, RgbaImage};

/// Separable blend modes following W3C Compositing Level 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Plain alpha compositing
    #[default]
    SourceOver,
    /// `B(Cb, Cs) = Cb * Cs`, composited source-over
    Multiply,
}

impl BlendMode {
    #[inline]
    fn blend_channel(self, backdrop: f64, source: f64) -> f64 {
        match self {
            Self::SourceOver => source,
            Self::Multiply => backdrop * source,
        }
    }
}

/// 2D affine transform `[a c e; b d f; 0 0 1]`, column-vector convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    #[must_use]
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// Clockwise rotation on a y-down surface
    #[must_use]
    pub fn rotation(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    #[must_use]
    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// `self * other`: `other` is applied first
    #[must_use]
    pub fn then_apply(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Append a translation in the current user space
    #[must_use]
    pub fn translate(&self, tx: f64, ty: f64) -> Self {
        self.then_apply(&Self::translation(tx, ty))
    }

    /// Append a rotation in the current user space
    #[must_use]
    pub fn rotate(&self, radians: f64) -> Self {
        self.then_apply(&Self::rotation(radians))
    }

    /// Append a scale in the current user space
    #[must_use]
    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        self.then_apply(&Self::scaling(sx, sy))
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, `None` when singular
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < 1e-12 {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    #[must_use]
    pub fn apply(&self, point: Point) -> Point {
        Point {
            x: self.a * point.x + self.c * point.y + self.e,
            y: self.b * point.x + self.d * point.y + self.f,
        }
    }
}

/// Drawing state applied to each `draw_image` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    pub transform: Affine,
    /// Multiplies source alpha, `0.0..=1.0`
    pub global_alpha: f64,
    pub blend: BlendMode,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            global_alpha: 1.0,
            blend: BlendMode::SourceOver,
        }
    }
}

/// An owned RGBA drawing surface
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    /// Transparent surface of the given size
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    /// Surface initialised with an existing raster, copied unmodified
    #[must_use]
    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[must_use]
    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Draw `src` stretched over `dest` (user space) under `state`
    ///
    /// Returns the number of destination pixels touched. A singular transform
    /// or an empty destination draws nothing.
    pub fn draw_image(&mut self, src: &RgbaImage, dest: Rect, state: &DrawState) -> usize {
        if dest.is_empty() || src.width() == 0 || src.height() == 0 {
            return 0;
        }
        let alpha = state.global_alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return 0;
        }

        // image pixel space -> user space -> device space
        let src_w = f64::from(src.width());
        let src_h = f64::from(src.height());
        let placement = Affine::translation(dest.x, dest.y)
            .scale(dest.width / src_w, dest.height / src_h);
        let forward = state.transform.then_apply(&placement);
        let Some(inverse) = forward.invert() else {
            return 0;
        };

        let Some((x_start, y_start, x_end, y_end)) = self.device_bounds(&forward, src_w, src_h)
        else {
            return 0;
        };

        let mut touched = 0;
        for py in y_start..y_end {
            for px in x_start..x_end {
                let centre = Point::new(f64::from(px) + 0.5, f64::from(py) + 0.5);
                let uv = inverse.apply(centre);
                if uv.x < 0.0 || uv.y < 0.0 || uv.x >= src_w || uv.y >= src_h {
                    continue;
                }
                let sample = bilinear_sample(src, uv.x - 0.5, uv.y - 0.5);
                let backdrop = self.pixels.get_pixel_mut(px, py);
                *backdrop = composite(*backdrop, sample, alpha, state.blend);
                touched += 1;
            }
        }
        touched
    }

    /// Device-space pixel range covering the transformed source rectangle
    fn device_bounds(&self, forward: &Affine, src_w: f64, src_h: f64) -> Option<(u32, u32, u32, u32)> {
        let corners = [
            forward.apply(Point::new(0.0, 0.0)),
            forward.apply(Point::new(src_w, 0.0)),
            forward.apply(Point::new(0.0, src_h)),
            forward.apply(Point::new(src_w, src_h)),
        ];
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for corner in corners {
            min_x = min_x.min(corner.x);
            min_y = min_y.min(corner.y);
            max_x = max_x.max(corner.x);
            max_y = max_y.max(corner.y);
        }

        let width = f64::from(self.width());
        let height = f64::from(self.height());
        let x_start = min_x.floor().clamp(0.0, width);
        let y_start = min_y.floor().clamp(0.0, height);
        let x_end = max_x.ceil().clamp(0.0, width);
        let y_end = max_y.ceil().clamp(0.0, height);
        if x_start >= x_end || y_start >= y_end {
            return None;
        }
        Some((x_start as u32, y_start as u32, x_end as u32, y_end as u32))
    }
}

/// Bilinear sample with clamp-to-edge addressing, in pixel-centre coordinates
fn bilinear_sample(img: &RgbaImage, x: f64, y: f64) -> [f64; 4] {
    let max_x = f64::from(img.width() - 1);
    let max_y = f64::from(img.height() - 1);
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let x1 = (x0 + 1.0).min(max_x);
    let y1 = (y0 + 1.0).min(max_y);

    let fetch = |sx: f64, sy: f64| -> [f64; 4] {
        let p = img.get_pixel(sx as u32, sy as u32);
        [
            f64::from(p[0]),
            f64::from(p[1]),
            f64::from(p[2]),
            f64::from(p[3]),
        ]
    };

    let tl = fetch(x0, y0);
    let tr = fetch(x1, y0);
    let bl = fetch(x0, y1);
    let br = fetch(x1, y1);

    let lerp = |a: f64, b: f64, t: f64| a + (b - a) * t;
    let mut out = [0.0; 4];
    for (c, value) in out.iter_mut().enumerate() {
        let top = lerp(tl[c], tr[c], fx);
        let bottom = lerp(bl[c], br[c], fx);
        *value = lerp(top, bottom, fy);
    }
    out
}

/// Blend then source-over one sample onto a backdrop pixel (straight alpha)
fn composite(backdrop: Rgba<u8>, source: [f64; 4], global_alpha: f64, mode: BlendMode) -> Rgba<u8> {
    let ab = f64::from(backdrop[3]) / 255.0;
    let as_ = source[3] / 255.0 * global_alpha;
    let ao = as_ + ab * (1.0 - as_);
    if ao <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for c in 0..3 {
        let cb = f64::from(backdrop[c]) / 255.0;
        let cs = source[c] / 255.0;
        let mixed = (1.0 - ab) * cs + ab * mode.blend_channel(cb, cs);
        let co = (as_ * mixed + ab * cb * (1.0 - as_)) / ao;
        out[c] = (co * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (ao * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}
