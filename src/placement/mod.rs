//! Placement compositor
//!
//! Lets the user drag, scale, rotate and fade a design over a body photo in
//! container space, then flattens the two into one image at the photo's
//! native resolution with a multiply blend so skin texture shows through.
//!
//! A compositor owns exactly one background and one raw foreground. It starts
//! in [`CompositorState::Processing`] while the foreground is keyed out and
//! accepts no gestures until [`PlacementCompositor::prepare`] has succeeded.

mod flatten;
mod transform;

pub use flatten::{compose_placement, map_placement, NativePlacement};
pub use transform::{
    PlacementTransform, SliderRange, OPACITY_RANGE, ROTATION_RANGE, SCALE_RANGE,
};

use crate::config::PlacementConfig;
use crate::decode::decode_asset;
use crate::error::{Result, StudioError};
use crate::geometry::{PixelSize, Point, Rect, Size};
use crate::key_out::remove_background;
use crate::services::ImageIOService;
use crate::types::{ImageAsset, ToolOutcome};
use crate::utils::validation::NumericValidator;
use instant::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Pointer movement forwarded by the host
#[derive(Debug, Clone, PartialEq)]
pub enum PointerGesture {
    /// Mouse move; `buttons` is the pressed-button bitmask (1 = primary only)
    MouseMove { position: Point, buttons: u8 },
    /// Touch move with every active contact point
    TouchMove { touches: Vec<Point> },
}

impl PointerGesture {
    /// The pointer driving a drag, if this gesture is one
    #[must_use]
    pub fn drag_point(&self) -> Option<Point> {
        match self {
            Self::MouseMove { position, buttons } if *buttons == 1 => Some(*position),
            Self::TouchMove { touches } if touches.len() == 1 => touches.first().copied(),
            Self::MouseMove { .. } | Self::TouchMove { .. } => None,
        }
    }
}

/// Lifecycle of a compositor
#[derive(Debug, Clone, PartialEq)]
pub enum CompositorState {
    /// The foreground is being keyed out; gestures are ignored
    Processing,
    /// The keyed foreground is available and the overlay can be moved
    Ready {
        keyed_foreground: ImageAsset,
        foreground_size: PixelSize,
    },
}

/// A refused or failed [`PlacementCompositor::confirm`]
///
/// When confirm is refused because the design is still processing, the
/// session is handed back through [`ConfirmError::into_compositor`].
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ConfirmError {
    error: StudioError,
    compositor: Option<Box<PlacementCompositor>>,
}

impl ConfirmError {
    fn failed(error: StudioError) -> Self {
        Self {
            error,
            compositor: None,
        }
    }

    #[must_use]
    pub fn error(&self) -> &StudioError {
        &self.error
    }

    #[must_use]
    pub fn into_error(self) -> StudioError {
        self.error
    }

    /// The untouched session, present only when confirm was refused
    #[must_use]
    pub fn into_compositor(self) -> Option<PlacementCompositor> {
        self.compositor.map(|c| *c)
    }
}

impl From<ConfirmError> for StudioError {
    fn from(err: ConfirmError) -> Self {
        err.error
    }
}

/// Interactive placement session
#[derive(Debug)]
pub struct PlacementCompositor {
    background: ImageAsset,
    foreground: ImageAsset,
    viewport: Size,
    config: PlacementConfig,
    state: CompositorState,
    transform: PlacementTransform,
}

impl PlacementCompositor {
    /// Create a compositor in the `Processing` state
    ///
    /// # Errors
    /// - `InvalidInput` when the viewport is empty or not finite
    pub fn new(
        background: ImageAsset,
        foreground: ImageAsset,
        viewport: Size,
        config: PlacementConfig,
    ) -> Result<Self> {
        let viewport = NumericValidator::validate_display_size(viewport, "Viewport")?;

        let transform = PlacementTransform::default().with_opacity(config.initial_opacity);
        Ok(Self {
            background,
            foreground,
            viewport,
            config,
            state: CompositorState::Processing,
            transform,
        })
    }

    #[must_use]
    pub fn state(&self) -> &CompositorState {
        &self.state
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, CompositorState::Ready { .. })
    }

    #[must_use]
    pub fn transform(&self) -> &PlacementTransform {
        &self.transform
    }

    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Key out the foreground and enter `Ready` with the overlay centred
    ///
    /// # Errors
    /// - `Decode` when the keyed foreground cannot be decoded; the compositor
    ///   stays in `Processing`
    #[instrument(skip(self), fields(viewport = ?self.viewport))]
    pub async fn prepare(&mut self) -> Result<()> {
        let (keyed, size) = self.load_foreground().await?;
        self.enter_ready(keyed, size);
        Ok(())
    }

    /// [`prepare`](Self::prepare), abandoned when `token` is cancelled
    ///
    /// # Errors
    /// - `Cancelled` when the token fires first; the compositor stays in
    ///   `Processing`
    pub async fn prepare_cancellable(&mut self, token: &CancellationToken) -> Result<()> {
        let loaded = tokio::select! {
            biased;
            () = token.cancelled() => Err(StudioError::cancelled("placement preparation")),
            result = self.load_foreground() => result,
        };
        let (keyed, size) = loaded?;
        self.enter_ready(keyed, size);
        Ok(())
    }

    async fn load_foreground(&self) -> Result<(ImageAsset, PixelSize)> {
        let keyed = remove_background(&self.foreground, self.config.key_out_threshold).await;
        let decoded = decode_asset(&keyed).await?;
        Ok((keyed, PixelSize::new(decoded.width(), decoded.height())))
    }

    fn enter_ready(&mut self, keyed_foreground: ImageAsset, foreground_size: PixelSize) {
        let base_width = self.config.base_width;
        let base_height = base_width * f64::from(foreground_size.height)
            / f64::from(foreground_size.width);

        self.transform = PlacementTransform::default()
            .with_opacity(self.config.initial_opacity)
            .with_position(Point::new(
                self.viewport.width / 2.0 - base_width / 2.0,
                self.viewport.height / 2.0 - base_height / 2.0,
            ));
        self.state = CompositorState::Ready {
            keyed_foreground,
            foreground_size,
        };
        info!(
            width = foreground_size.width,
            height = foreground_size.height,
            "Placement ready"
        );
    }

    /// Apply a drag gesture; returns whether the overlay moved
    ///
    /// Mouse drags need exactly the primary button held, touch drags exactly
    /// one contact. The pointer maps to the overlay's top-left offset by half
    /// the scaled base width on both axes.
    pub fn handle_pointer(&mut self, gesture: &PointerGesture) -> bool {
        if !self.is_ready() {
            return false;
        }
        let Some(point) = gesture.drag_point() else {
            return false;
        };
        let half = self.config.base_width / 2.0 * self.transform.scale;
        self.transform.position = Point::new(point.x - half, point.y - half);
        true
    }

    pub fn set_scale(&mut self, scale: f64) -> bool {
        self.adjust(|t| t.with_scale(scale))
    }

    pub fn set_rotation(&mut self, degrees: f64) -> bool {
        self.adjust(|t| t.with_rotation(degrees))
    }

    pub fn set_opacity(&mut self, opacity: f64) -> bool {
        self.adjust(|t| t.with_opacity(opacity))
    }

    fn adjust(&mut self, apply: impl FnOnce(PlacementTransform) -> PlacementTransform) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.transform = apply(self.transform);
        true
    }

    /// Replace the whole transform (values re-clamped); ignored while processing
    pub fn set_transform(&mut self, transform: PlacementTransform) -> bool {
        self.adjust(|_| {
            transform
                .with_scale(transform.scale)
                .with_rotation(f64::from(transform.rotation_degrees))
                .with_opacity(transform.opacity)
        })
    }

    /// Overlay bounds in container space, before rotation
    #[must_use]
    pub fn overlay_bounds(&self) -> Option<Rect> {
        let CompositorState::Ready {
            foreground_size, ..
        } = &self.state
        else {
            return None;
        };
        let width = self.config.base_width * self.transform.scale;
        let height =
            width * f64::from(foreground_size.height) / f64::from(foreground_size.width);
        Some(Rect::new(
            self.transform.position.x,
            self.transform.position.y,
            width,
            height,
        ))
    }

    /// Flatten the placement at the background's native resolution
    ///
    /// Consumes the compositor once it is `Ready`. Decode failures of either
    /// image are reported as [`ToolOutcome::DecodeFailed`].
    ///
    /// # Errors
    /// - `NotReady` while the foreground is still processing; the error
    ///   carries the compositor back so it can be prepared and confirmed again
    /// - `Encode` when the composite cannot be encoded
    #[instrument(skip(self), fields(transform = ?self.transform))]
    pub async fn confirm(self) -> std::result::Result<ToolOutcome, ConfirmError> {
        let CompositorState::Ready {
            keyed_foreground, ..
        } = &self.state
        else {
            debug!("Confirm refused while the design is processing");
            return Err(ConfirmError {
                error: StudioError::not_ready("placement is still removing the design background"),
                compositor: Some(Box::new(self)),
            });
        };

        let started = Instant::now();
        let background = match decode_asset(&self.background).await {
            Ok(image) => image.to_rgba8(),
            Err(e) => {
                warn!(error = %e, "Background photo could not be decoded");
                return Ok(ToolOutcome::DecodeFailed {
                    reason: e.to_string(),
                });
            },
        };
        let foreground = match decode_asset(keyed_foreground).await {
            Ok(image) => image.to_rgba8(),
            Err(e) => {
                warn!(error = %e, "Keyed design could not be decoded");
                return Ok(ToolOutcome::DecodeFailed {
                    reason: e.to_string(),
                });
            },
        };

        let viewport = self.viewport;
        let transform = self.transform;
        let base_width = self.config.base_width;
        let asset = tokio::task::spawn_blocking(move || {
            let composed =
                compose_placement(background, &foreground, viewport, &transform, base_width);
            ImageIOService::encode_png(composed)
        })
        .await
        .map_err(|e| {
            ConfirmError::failed(StudioError::internal(format!("composite task failed: {}", e)))
        })?
        .map_err(ConfirmError::failed)?;

        info!(
            bytes = asset.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Composite confirmed"
        );
        Ok(ToolOutcome::Completed(asset))
    }

    #[must_use]
    pub fn cancel(self) -> ToolOutcome {
        debug!("Placement cancelled");
        ToolOutcome::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(width: u32, height: u32, colour: [u8; 4]) -> ImageAsset {
        ImageIOService::encode_png(RgbaImage::from_pixel(width, height, Rgba(colour))).unwrap()
    }

    fn compositor(fg_w: u32, fg_h: u32) -> PlacementCompositor {
        PlacementCompositor::new(
            solid(100, 100, [200, 100, 50, 255]),
            solid(fg_w, fg_h, [128, 128, 128, 255]),
            Size::new(500.0, 400.0),
            PlacementConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_processing_rejects_gestures() {
        let mut c = compositor(50, 50);
        assert_eq!(c.state(), &CompositorState::Processing);
        let before = *c.transform();

        assert!(!c.handle_pointer(&PointerGesture::MouseMove {
            position: Point::new(10.0, 10.0),
            buttons: 1,
        }));
        assert!(!c.set_scale(2.0));
        assert!(!c.set_rotation(90.0));
        assert!(!c.set_opacity(0.5));
        assert_eq!(*c.transform(), before);
        assert!(c.overlay_bounds().is_none());

        let err = c.confirm().await.unwrap_err();
        assert!(matches!(err.error(), StudioError::NotReady(_)));
    }

    #[tokio::test]
    async fn test_early_confirm_hands_session_back() {
        let c = compositor(40, 20);
        let err = c.confirm().await.unwrap_err();
        assert!(matches!(err.error(), StudioError::NotReady(_)));
        let mut c = err.into_compositor().unwrap();
        assert_eq!(c.state(), &CompositorState::Processing);

        c.prepare().await.unwrap();
        let asset = c.confirm().await.unwrap().into_asset().unwrap();
        let composite = crate::decode::decode_now(&asset).unwrap();
        assert_eq!((composite.width(), composite.height()), (100, 100));
    }

    #[tokio::test]
    async fn test_prepare_centres_overlay() {
        let mut c = compositor(100, 50);
        c.prepare().await.unwrap();
        assert!(c.is_ready());

        let t = c.transform();
        assert_eq!(t.scale, 1.0);
        assert_eq!(t.rotation_degrees, 0);
        assert_eq!(t.opacity, 0.85);
        // bw = 200, bh = 100
        assert_eq!(t.position, Point::new(150.0, 150.0));
        assert_eq!(c.overlay_bounds(), Some(Rect::new(150.0, 150.0, 200.0, 100.0)));
    }

    #[tokio::test]
    async fn test_prepare_failure_stays_processing() {
        let mut c = PlacementCompositor::new(
            solid(10, 10, [0, 0, 0, 255]),
            ImageAsset::new("image/png", b"not a png".to_vec()),
            Size::new(100.0, 100.0),
            PlacementConfig::default(),
        )
        .unwrap();
        assert!(c.prepare().await.is_err());
        assert_eq!(c.state(), &CompositorState::Processing);
    }

    #[tokio::test]
    async fn test_prepare_cancelled() {
        let mut c = compositor(10, 10);
        let token = CancellationToken::new();
        token.cancel();
        let err = c.prepare_cancellable(&token).await.unwrap_err();
        assert!(matches!(err, StudioError::Cancelled(_)));
        assert!(!c.is_ready());

        c.prepare_cancellable(&CancellationToken::new()).await.unwrap();
        assert!(c.is_ready());
    }

    #[tokio::test]
    async fn test_drag_gestures() {
        let mut c = compositor(10, 10);
        c.prepare().await.unwrap();
        c.set_scale(1.5);

        assert!(c.handle_pointer(&PointerGesture::MouseMove {
            position: Point::new(300.0, 200.0),
            buttons: 1,
        }));
        assert_eq!(c.transform().position, Point::new(150.0, 50.0));

        // Secondary or chorded buttons do not drag
        let before = c.transform().position;
        assert!(!c.handle_pointer(&PointerGesture::MouseMove {
            position: Point::new(0.0, 0.0),
            buttons: 0,
        }));
        assert!(!c.handle_pointer(&PointerGesture::MouseMove {
            position: Point::new(0.0, 0.0),
            buttons: 3,
        }));
        // Multi-touch is a pinch, not a drag
        assert!(!c.handle_pointer(&PointerGesture::TouchMove {
            touches: vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
        }));
        assert_eq!(c.transform().position, before);

        assert!(c.handle_pointer(&PointerGesture::TouchMove {
            touches: vec![Point::new(150.0, 150.0)],
        }));
        assert_eq!(c.transform().position, Point::new(0.0, 0.0));
    }

    #[tokio::test]
    async fn test_sliders_clamp_when_ready() {
        let mut c = compositor(10, 10);
        c.prepare().await.unwrap();
        assert!(c.set_scale(5.0));
        assert!(c.set_rotation(370.0));
        assert!(c.set_opacity(0.0));
        let t = c.transform();
        assert_eq!(t.scale, 3.0);
        assert_eq!(t.rotation_degrees, 10);
        assert_eq!(t.opacity, 0.3);
        assert_eq!(t.scale_label(), "3.0x");
    }

    #[tokio::test]
    async fn test_confirm_emits_background_sized_png() {
        let mut c = compositor(40, 20);
        c.prepare().await.unwrap();
        let asset = c.confirm().await.unwrap().into_asset().unwrap();
        let decoded = image::load_from_memory(asset.as_bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 100));
    }

    #[tokio::test]
    async fn test_confirm_background_decode_failure() {
        let mut c = PlacementCompositor::new(
            ImageAsset::new("image/jpeg", b"truncated".to_vec()),
            solid(10, 10, [0, 0, 0, 255]),
            Size::new(100.0, 100.0),
            PlacementConfig::default(),
        )
        .unwrap();
        c.prepare().await.unwrap();
        let outcome = c.confirm().await.unwrap();
        assert!(matches!(outcome, ToolOutcome::DecodeFailed { .. }));
    }

    #[test]
    fn test_cancel() {
        assert_eq!(compositor(1, 1).cancel(), ToolOutcome::Cancelled);
    }

    #[test]
    fn test_invalid_viewport() {
        let result = PlacementCompositor::new(
            solid(1, 1, [0, 0, 0, 255]),
            solid(1, 1, [0, 0, 0, 255]),
            Size::new(0.0, 0.0),
            PlacementConfig::default(),
        );
        assert!(result.is_err());
    }
}
