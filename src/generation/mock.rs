//! Offline [`DesignService`] for tests and `--offline` CLI runs

use super::DesignService;
use crate::booking::{Complexity, TattooStyle};
use crate::error::{Result, StudioError};
use crate::services::ImageIOService;
use crate::types::ImageAsset;
use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use std::sync::{Arc, Mutex};

/// Side length of the placeholder design
const PLACEHOLDER_SIZE: u32 = 256;

/// A recorded call into the mock service
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    GenerateDesign {
        prompt: String,
        style: TattooStyle,
        complexity: Complexity,
    },
    EnhanceDesign {
        description: String,
        style: TattooStyle,
    },
    SimulateOnBody {
        design_prompt: String,
    },
    RefineText {
        raw: String,
    },
}

/// Mock design service
///
/// Generation and enhancement return a placeholder stencil (or a canned
/// design), simulation echoes the composite back, and refinement prefixes the
/// raw text. Failure flags make each image call fail with `Generation`.
#[derive(Debug, Clone, Default)]
pub struct MockDesignService {
    /// Call history for verification in tests
    call_history: Arc<Mutex<Vec<ServiceCall>>>,
    /// Image returned instead of the placeholder
    canned_design: Option<ImageAsset>,
    /// Whether image calls should fail
    should_fail_generation: bool,
    /// Whether text refinement should fail (falls back to the raw text)
    should_fail_refine: bool,
}

impl MockDesignService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock whose image calls all fail
    #[must_use]
    pub fn new_failing() -> Self {
        Self {
            should_fail_generation: true,
            ..Self::default()
        }
    }

    /// Return `design` from generation and enhancement
    #[must_use]
    pub fn with_design(mut self, design: ImageAsset) -> Self {
        self.canned_design = Some(design);
        self
    }

    #[must_use]
    pub fn with_failing_refine(mut self) -> Self {
        self.should_fail_refine = true;
        self
    }

    /// Toggle image call failures on a shared mock
    pub fn set_failing(&mut self, failing: bool) {
        self.should_fail_generation = failing;
    }

    /// Get the call history for verification in tests
    #[must_use]
    pub fn get_call_history(&self) -> Vec<ServiceCall> {
        self.call_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// Clear the call history
    pub fn clear_call_history(&self) {
        if let Ok(mut history) = self.call_history.lock() {
            history.clear();
        }
    }

    fn record_call(&self, call: ServiceCall) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(call);
        }
    }

    fn fail_if_requested(&self, operation: &str) -> Result<()> {
        if self.should_fail_generation {
            return Err(StudioError::generation_error_with_operation(
                operation,
                "mock",
                "simulated service failure",
            ));
        }
        Ok(())
    }

    fn design(&self, style: TattooStyle) -> Result<ImageAsset> {
        match &self.canned_design {
            Some(design) => Ok(design.clone()),
            None => ImageIOService::encode_png(placeholder_stencil(style)),
        }
    }
}

/// Black ring on white; ring thickness varies with style so results differ
fn placeholder_stencil(style: TattooStyle) -> RgbaImage {
    let index = TattooStyle::ALL
        .iter()
        .position(|s| *s == style)
        .unwrap_or(0) as f64;
    let centre = f64::from(PLACEHOLDER_SIZE) / 2.0;
    let outer = centre * 0.75;
    let inner = outer - 8.0 - 4.0 * index;

    RgbaImage::from_fn(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, |x, y| {
        let dx = f64::from(x) + 0.5 - centre;
        let dy = f64::from(y) + 0.5 - centre;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance <= outer && distance >= inner {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}

#[async_trait]
impl DesignService for MockDesignService {
    async fn generate_design(
        &self,
        prompt: &str,
        style: TattooStyle,
        complexity: Complexity,
    ) -> Result<ImageAsset> {
        self.record_call(ServiceCall::GenerateDesign {
            prompt: prompt.to_string(),
            style,
            complexity,
        });
        self.fail_if_requested("Design generation")?;
        self.design(style)
    }

    async fn enhance_design(
        &self,
        reference: &ImageAsset,
        description: &str,
        style: TattooStyle,
    ) -> Result<ImageAsset> {
        reference.ensure_encoded_image()?;
        self.record_call(ServiceCall::EnhanceDesign {
            description: description.to_string(),
            style,
        });
        self.fail_if_requested("Design enhancement")?;
        self.design(style)
    }

    async fn simulate_on_body(
        &self,
        composite: &ImageAsset,
        design_prompt: &str,
    ) -> Result<ImageAsset> {
        self.record_call(ServiceCall::SimulateOnBody {
            design_prompt: design_prompt.to_string(),
        });
        self.fail_if_requested("Body simulation")?;
        Ok(composite.clone())
    }

    async fn refine_text(&self, raw: &str) -> String {
        self.record_call(ServiceCall::RefineText {
            raw: raw.to_string(),
        });
        if self.should_fail_refine {
            return raw.to_string();
        }
        format!("Refined: {}", raw.trim())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_now;

    #[tokio::test]
    async fn test_generate_returns_placeholder_png() {
        let mock = MockDesignService::new();
        let design = mock
            .generate_design("wolf", TattooStyle::Realism, Complexity::Detailed)
            .await
            .unwrap();
        assert_eq!(design.mime_type(), "image/png");
        let decoded = decode_now(&design).unwrap();
        assert_eq!(decoded.width(), PLACEHOLDER_SIZE);

        assert_eq!(
            mock.get_call_history(),
            vec![ServiceCall::GenerateDesign {
                prompt: "wolf".to_string(),
                style: TattooStyle::Realism,
                complexity: Complexity::Detailed,
            }]
        );
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockDesignService::new_failing();
        let err = mock
            .generate_design("wolf", TattooStyle::Realism, Complexity::Simple)
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Generation(_)));
        // The call is still recorded
        assert_eq!(mock.get_call_history().len(), 1);
    }

    #[tokio::test]
    async fn test_enhance_validates_reference_first() {
        let mock = MockDesignService::new();
        let err = mock
            .enhance_design(
                &ImageAsset::new("image/png", Vec::new()),
                "clean",
                TattooStyle::Lettering,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::InvalidInput(_)));
        assert!(mock.get_call_history().is_empty());
    }

    #[tokio::test]
    async fn test_simulate_echoes_composite() {
        let mock = MockDesignService::new();
        let composite = ImageAsset::new("image/png", vec![9, 9, 9]);
        let result = mock.simulate_on_body(&composite, "rose").await.unwrap();
        assert_eq!(result, composite);
    }

    #[tokio::test]
    async fn test_refine_fallback() {
        let mock = MockDesignService::new().with_failing_refine();
        assert_eq!(mock.refine_text("a rose").await, "a rose");
        mock.clear_call_history();
        assert!(mock.get_call_history().is_empty());

        let mock = MockDesignService::new();
        assert_eq!(mock.refine_text(" a rose ").await, "Refined: a rose");
    }

    #[test]
    fn test_placeholder_differs_by_style() {
        assert_ne!(
            placeholder_stencil(TattooStyle::Realism),
            placeholder_stencil(TattooStyle::Blackwork)
        );
    }
}
