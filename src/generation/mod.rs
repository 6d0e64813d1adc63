//! Generative design service seam
//!
//! The wizard talks to the outside world only through [`DesignService`]. The
//! production implementation is [`GeminiClient`]; [`MockDesignService`] stands
//! in for tests and offline CLI runs.

mod gemini;
mod mock;
pub mod prompts;

pub use gemini::{GeminiClient, API_KEY_HEADER};
pub use mock::{MockDesignService, ServiceCall};

use crate::booking::{Complexity, TattooStyle};
use crate::error::Result;
use crate::types::ImageAsset;
use async_trait::async_trait;

/// External image and text generation used by the booking wizard
#[async_trait]
pub trait DesignService: Send + Sync {
    /// Produce a stencil-style design on a white background
    ///
    /// # Errors
    /// - `Generation` when the service is unreachable, fails or returns no image
    async fn generate_design(
        &self,
        prompt: &str,
        style: TattooStyle,
        complexity: Complexity,
    ) -> Result<ImageAsset>;

    /// Redraw a user-supplied reference image as a clean design
    ///
    /// # Errors
    /// - `InvalidInput` when `reference` is not an encoded image; nothing is sent
    /// - `Generation` when the service fails or returns no image
    async fn enhance_design(
        &self,
        reference: &ImageAsset,
        description: &str,
        style: TattooStyle,
    ) -> Result<ImageAsset>;

    /// Blend a flattened placement composite into a realistic healed tattoo
    ///
    /// The composite is forwarded as-is; the service must not move the design.
    ///
    /// # Errors
    /// - `Generation` when the service fails or returns no image
    async fn simulate_on_body(&self, composite: &ImageAsset, design_prompt: &str)
        -> Result<ImageAsset>;

    /// Rewrite a free-text idea into a tighter image prompt
    ///
    /// Best effort: any failure yields `raw` unchanged.
    async fn refine_text(&self, raw: &str) -> String;

    /// Short name used in logs
    fn name(&self) -> &str;
}
