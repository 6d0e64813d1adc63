//! Flattening: map a screen-space placement onto the background's native
//! pixels and draw the overlay with a multiply blend.

use super::transform::PlacementTransform;
use crate::canvas::{Affine, BlendMode, Canvas, DrawState};
use crate::geometry::{ContainFit, PixelSize, Point, Rect, Size};
use image::RgbaImage;

/// The overlay placement expressed in background natural pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativePlacement {
    /// How the background sat inside the viewport
    pub fit: ContainFit,
    /// Top-left of the unrotated overlay
    pub origin: Point,
    pub width: f64,
    pub height: f64,
    pub rotation_radians: f64,
    pub opacity: f64,
}

impl NativePlacement {
    /// Rotation pivot: the centre of the unrotated overlay
    #[must_use]
    pub fn centre(&self) -> Point {
        Point::new(
            self.origin.x + self.width / 2.0,
            self.origin.y + self.height / 2.0,
        )
    }

    /// Draw state positioning a centred overlay rectangle
    #[must_use]
    pub fn draw_state(&self) -> DrawState {
        let centre = self.centre();
        DrawState {
            transform: Affine::IDENTITY
                .translate(centre.x, centre.y)
                .rotate(self.rotation_radians),
            global_alpha: self.opacity,
            blend: BlendMode::Multiply,
        }
    }

    /// Overlay rectangle in the rotated, centred user space
    #[must_use]
    pub fn local_rect(&self) -> Rect {
        Rect::new(
            -self.width / 2.0,
            -self.height / 2.0,
            self.width,
            self.height,
        )
    }
}

/// Map a container-space placement onto the background's natural pixels
#[must_use]
pub fn map_placement(
    viewport: Size,
    background: PixelSize,
    foreground: PixelSize,
    transform: &PlacementTransform,
    base_width: f64,
) -> NativePlacement {
    let fit = ContainFit::compute(viewport, background);
    let origin = fit.to_natural(transform.position);
    let width = fit.length_to_natural(base_width * transform.scale);
    let height = width * f64::from(foreground.height) / f64::from(foreground.width);

    NativePlacement {
        fit,
        origin,
        width,
        height,
        rotation_radians: transform.rotation_radians(),
        opacity: transform.opacity,
    }
}

/// Flatten the overlay onto a copy of the background at native resolution
#[must_use]
pub fn compose_placement(
    background: RgbaImage,
    foreground: &RgbaImage,
    viewport: Size,
    transform: &PlacementTransform,
    base_width: f64,
) -> RgbaImage {
    let placement = map_placement(
        viewport,
        PixelSize::from(background.dimensions()),
        PixelSize::from(foreground.dimensions()),
        transform,
        base_width,
    );

    let mut canvas = Canvas::from_image(background);
    let touched = canvas.draw_image(foreground, placement.local_rect(), &placement.draw_state());
    tracing::debug!(
        touched,
        width = placement.width,
        height = placement.height,
        "Flattened overlay onto background"
    );
    canvas.into_image()
}
