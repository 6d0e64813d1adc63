//! Rectangular cropper
//!
//! The host shows the source image at some display size and forwards pointer
//! events in display-space coordinates. The cropper tracks a drag-selected
//! rectangle that always stays inside the displayed image, and on confirm
//! extracts the matching region at the image's natural resolution.
//!
//! ```text
//! Idle --pointer_down--> Dragging --pointer_move*--> Dragging --pointer_up/leave--> Idle
//! ```

use crate::decode::decode_asset;
use crate::error::{Result, StudioError};
use crate::geometry::{DisplayScale, PixelSize, Point, Rect, Size};
use crate::services::ImageIOService;
use crate::types::{ImageAsset, ToolOutcome};
use crate::utils::validation::NumericValidator;
use image::{DynamicImage, RgbaImage};
use tracing::{debug, info, instrument, warn};

/// Display-space crop selection
pub type CropRect = Rect;

/// Fraction of the display covered by the initial selection
const DEFAULT_SELECTION_FRACTION: f64 = 0.8;

/// Which pointer produced a `pointer_down`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    Touch,
    Pen,
}

impl PointerButton {
    /// Mouse drags need the primary button; touch and pen contacts always count
    #[must_use]
    pub fn starts_selection(self) -> bool {
        matches!(self, Self::Primary | Self::Touch | Self::Pen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { anchor: Point },
}

/// The four display-space rectangles outside the selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimmedRegions {
    /// Full width, above the selection
    pub top: Rect,
    /// Full width, below the selection
    pub bottom: Rect,
    /// Left of the selection, selection height
    pub left: Rect,
    /// Right of the selection, selection height
    pub right: Rect,
}

impl DimmedRegions {
    #[must_use]
    pub fn as_array(&self) -> [Rect; 4] {
        [self.top, self.bottom, self.left, self.right]
    }
}

/// A straight guide line in display space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    pub start: Point,
    pub end: Point,
}

/// Interactive crop session over one source image
#[derive(Debug, Clone)]
pub struct Cropper {
    source: ImageAsset,
    display: Size,
    selection: CropRect,
    drag: DragState,
}

impl Cropper {
    /// Start a crop session with the centred 80% of the display pre-selected
    ///
    /// # Errors
    /// - `InvalidInput` when the display size is empty or not finite
    pub fn new(source: ImageAsset, display: Size) -> Result<Self> {
        let display = NumericValidator::validate_display_size(display, "Display size")?;

        let width = display.width * DEFAULT_SELECTION_FRACTION;
        let height = display.height * DEFAULT_SELECTION_FRACTION;
        let selection = Rect::new(
            (display.width - width) / 2.0,
            (display.height - height) / 2.0,
            width,
            height,
        );

        Ok(Self {
            source,
            display,
            selection,
            drag: DragState::Idle,
        })
    }

    #[must_use]
    pub fn source(&self) -> &ImageAsset {
        &self.source
    }

    #[must_use]
    pub fn display_size(&self) -> Size {
        self.display
    }

    #[must_use]
    pub fn selection(&self) -> CropRect {
        self.selection
    }

    #[must_use]
    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Replace the selection outright, clamped into the display bounds
    pub fn set_selection(&mut self, rect: Rect) {
        let x = rect.x.clamp(0.0, self.display.width);
        let y = rect.y.clamp(0.0, self.display.height);
        self.selection = Rect::new(
            x,
            y,
            rect.width.clamp(0.0, self.display.width - x),
            rect.height.clamp(0.0, self.display.height - y),
        );
    }

    /// Begin a new selection at `point`
    ///
    /// Returns `false` (and changes nothing) for non-primary mouse buttons or
    /// presses outside the display bounds.
    pub fn pointer_down(&mut self, point: Point, button: PointerButton) -> bool {
        if !button.starts_selection() || !self.display.contains(point) {
            return false;
        }
        self.drag = DragState::Dragging { anchor: point };
        self.selection = Rect::new(point.x, point.y, 0.0, 0.0);
        true
    }

    /// Extend the selection towards `point` while dragging
    ///
    /// The pointer is clamped to the display before the bounding box with the
    /// anchor is taken, so the selection never leaves the image.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        let DragState::Dragging { anchor } = self.drag else {
            return false;
        };
        let current = point.clamp_to(self.display);
        self.selection = Rect::from_corners(anchor, current);
        true
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Leaving the surface ends the drag like a release
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// Live size readout, e.g. `"320 x 240"`
    #[must_use]
    pub fn dimension_label(&self) -> String {
        format!(
            "{} x {}",
            self.selection.width.round(),
            self.selection.height.round()
        )
    }

    #[must_use]
    pub fn dimmed_regions(&self) -> DimmedRegions {
        let s = self.selection;
        let d = self.display;
        DimmedRegions {
            top: Rect::new(0.0, 0.0, d.width, s.y),
            bottom: Rect::new(0.0, s.bottom(), d.width, d.height - s.bottom()),
            left: Rect::new(0.0, s.y, s.x, s.height),
            right: Rect::new(s.right(), s.y, d.width - s.right(), s.height),
        }
    }

    /// Rule-of-thirds guides: two vertical lines then two horizontal lines
    #[must_use]
    pub fn thirds_guides(&self) -> [GuideLine; 4] {
        let s = self.selection;
        let vertical = |fraction: f64| {
            let x = s.x + s.width * fraction;
            GuideLine {
                start: Point::new(x, s.y),
                end: Point::new(x, s.bottom()),
            }
        };
        let horizontal = |fraction: f64| {
            let y = s.y + s.height * fraction;
            GuideLine {
                start: Point::new(s.x, y),
                end: Point::new(s.right(), y),
            }
        };
        [
            vertical(1.0 / 3.0),
            vertical(2.0 / 3.0),
            horizontal(1.0 / 3.0),
            horizontal(2.0 / 3.0),
        ]
    }

    #[must_use]
    pub fn can_confirm(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Extract the selection at natural resolution and emit it as PNG
    ///
    /// # Errors
    /// - `EmptySelection` when the selection has zero width or height
    /// - `Encode` when the cropped raster cannot be encoded
    #[instrument(skip(self), fields(selection = %self.dimension_label()))]
    pub async fn confirm(&self) -> Result<ToolOutcome> {
        if !self.can_confirm() {
            return Err(StudioError::EmptySelection {
                width: self.selection.width,
                height: self.selection.height,
            });
        }

        let image = match decode_asset(&self.source).await {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "Crop source could not be decoded");
                return Ok(ToolOutcome::DecodeFailed {
                    reason: e.to_string(),
                });
            },
        };

        let selection = self.selection;
        let display = self.display;
        let asset = tokio::task::spawn_blocking(move || {
            let cropped = crop_natural(&image, selection, display)?;
            ImageIOService::encode_png(cropped)
        })
        .await
        .map_err(|e| StudioError::internal(format!("crop task failed: {}", e)))??;

        info!(bytes = asset.len(), "Crop confirmed");
        Ok(ToolOutcome::Completed(asset))
    }

    /// Forward the unmodified source
    #[must_use]
    pub fn use_original(self) -> ToolOutcome {
        debug!("Crop skipped, using original image");
        ToolOutcome::Completed(self.source)
    }

    #[must_use]
    pub fn cancel(self) -> ToolOutcome {
        debug!("Crop cancelled");
        ToolOutcome::Cancelled
    }
}

/// Crop a decoded image by a display-space selection
///
/// The selection is scaled per axis by `natural / display`. The origin is
/// floored and the size truncated to whole pixels, then clamped to the image.
///
/// # Errors
/// - `EmptySelection` when the scaled region has no whole pixels
pub fn crop_natural(image: &DynamicImage, selection: CropRect, display: Size) -> Result<RgbaImage> {
    let natural = PixelSize::new(image.width(), image.height());
    let region = DisplayScale::between(natural, display).to_natural(selection);

    let max_w = f64::from(natural.width);
    let max_h = f64::from(natural.height);
    let left = region.x.floor().clamp(0.0, max_w);
    let top = region.y.floor().clamp(0.0, max_h);
    let width = whole_pixels(region.width).min(max_w - left) as u32;
    let height = whole_pixels(region.height).min(max_h - top) as u32;
    if width == 0 || height == 0 {
        return Err(StudioError::EmptySelection {
            width: region.width,
            height: region.height,
        });
    }

    debug!(
        x = left,
        y = top,
        width,
        height,
        "Cropping at natural resolution"
    );
    Ok(image::imageops::crop_imm(image, left as u32, top as u32, width, height).to_image())
}

/// Truncate a scaled length to whole pixels, ignoring float noise just below
/// an integer (`2.9999999999` is 3)
fn whole_pixels(length: f64) -> f64 {
    (length + 1e-9).floor().max(0.0)
}
