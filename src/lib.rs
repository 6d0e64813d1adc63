#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # InkFlow Studio
//!
//! Engine behind a tattoo studio booking wizard: a guided six-step flow that
//! collects client details, an appointment, a tattoo design and a realistic
//! "try-on" preview before confirming the booking.
//!
//! ## Features
//!
//! - **Background Key-Out**: near-white pixels of a design become transparent
//! - **Rectangular Cropper**: drag a selection in display space, crop at native resolution
//! - **Placement Compositor**: position, scale, rotate and fade a design over a body photo,
//!   then flatten it with multiply blending at the photo's native resolution
//! - **History**: linear undo/redo over booking snapshots
//! - **Booking Wizard**: step gating, price estimates, contact validation
//! - **Design Service**: Gemini-backed design generation, enhancement and simulation,
//!   with an offline mock
//! - **CLI Integration**: optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use inkflow_studio::{
//!     ImageIOService, PlacementCompositor, PlacementConfig, Size, ToolOutcome,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let body = ImageIOService::load_asset("arm.jpg")?;
//! let design = ImageIOService::load_asset("rose.png")?;
//!
//! let mut compositor = PlacementCompositor::new(
//!     body,
//!     design,
//!     Size::new(500.0, 500.0),
//!     PlacementConfig::default(),
//! )?;
//! compositor.prepare().await?;
//! compositor.set_scale(1.5);
//! compositor.set_rotation(45.0);
//!
//! if let ToolOutcome::Completed(composite) = compositor.confirm().await? {
//!     ImageIOService::save_asset(&composite, "preview.png")?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): Command-line interface and tracing subscriber setup
//! - `webp-support` (default): WebP image format support
//! - `tracing-json`: JSON log output for the CLI

pub mod booking;
pub mod canvas;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod cropper;
pub mod decode;
pub mod error;
pub mod generation;
pub mod geometry;
pub mod history;
pub mod key_out;
pub mod placement;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;
pub mod wizard;

use tokio::io::AsyncRead;

// Public API exports
pub use booking::{
    estimate_price, upcoming_dates, BookingData, Complexity, PriceEstimate, Step, TattooSize,
    TattooStyle,
};
pub use canvas::{Affine, BlendMode, Canvas, DrawState};
pub use config::{GenerationConfig, OutputFormat, PlacementConfig, StudioConfig};
pub use cropper::{CropRect, Cropper, PointerButton};
pub use error::{Result, StudioError};
pub use generation::{DesignService, GeminiClient, MockDesignService};
pub use geometry::{ContainFit, PixelSize, Point, Rect, Size};
pub use history::History;
pub use key_out::{remove_background, DEFAULT_THRESHOLD};
pub use placement::{
    compose_placement, CompositorState, ConfirmError, PlacementCompositor, PlacementTransform,
    PointerGesture,
};
pub use services::{ImageIOService, OutputFormatHandler};
pub use types::{ImageAsset, ToolOutcome};
pub use utils::{ContactValidator, NumericValidator};
pub use wizard::{ConfirmedBooking, ContactErrors, WizardController};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};

/// Key out the near-white background of an image read from an async stream
///
/// Reads the whole stream, then behaves like [`remove_background`]: a payload
/// that cannot be decoded comes back unchanged.
///
/// # Examples
///
/// ```rust,no_run
/// use inkflow_studio::{key_out_from_reader, DEFAULT_THRESHOLD};
/// use tokio::fs::File;
///
/// # async fn example() -> anyhow::Result<()> {
/// let file = File::open("sketch.jpg").await?;
/// let keyed = key_out_from_reader(file, DEFAULT_THRESHOLD).await?;
/// assert_eq!(keyed.mime_type(), "image/png");
/// # Ok(())
/// # }
/// ```
pub async fn key_out_from_reader<R: AsyncRead + Unpin>(
    reader: R,
    threshold: u8,
) -> Result<ImageAsset> {
    let asset = ImageIOService::load_from_reader(reader).await?;
    Ok(remove_background(&asset, threshold).await)
}
