//! Booking wizard controller
//!
//! Owns the booking data behind an undo/redo [`History`], the current
//! [`Step`] and a [`DesignService`]. Every action either succeeds and records
//! its change, or fails and leaves the data exactly as it was.

use crate::booking::{
    is_valid_time_slot, BookingData, Complexity, Step, TattooStyle, DEFAULT_ENHANCE_DESCRIPTION,
};
use crate::config::PlacementConfig;
use crate::error::{Result, StudioError};
use crate::generation::DesignService;
use crate::geometry::Size;
use crate::history::History;
use crate::placement::PlacementCompositor;
use crate::types::ImageAsset;
use crate::utils::ContactValidator;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Style used when the client has not picked one
pub const DEFAULT_STYLE: TattooStyle = TattooStyle::Realism;

/// Complexity used when the client has not picked one
pub const DEFAULT_COMPLEXITY: Complexity = Complexity::Detailed;

/// Inline validation messages for the contact form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactErrors {
    pub email: Option<&'static str>,
    pub phone: Option<&'static str>,
}

impl ContactErrors {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.email.is_none() && self.phone.is_none()
    }
}

/// A completed booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedBooking {
    pub reference: String,
    pub confirmed_at: DateTime<Utc>,
    pub data: BookingData,
}

/// Drives the six booking steps
pub struct WizardController<S> {
    service: S,
    history: History<BookingData>,
    step: Step,
}

impl<S: DesignService> WizardController<S> {
    pub fn new(service: S) -> Self {
        Self::with_data(service, BookingData::default())
    }

    /// Resume from previously saved booking data
    pub fn with_data(service: S, data: BookingData) -> Self {
        Self {
            service,
            history: History::new(data),
            step: Step::Personal,
        }
    }

    pub fn data(&self) -> &BookingData {
        self.history.current()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Whether the current step has everything it needs
    pub fn can_continue(&self) -> bool {
        let data = self.data();
        match self.step {
            Step::Personal => data.has_contact_details(),
            Step::DateTime => data.has_schedule(),
            Step::Payment | Step::Summary => true,
            Step::Design => data.design_asset().is_some(),
            Step::Simulation => data.ai_simulation.is_some(),
        }
    }

    /// Advance one step; refused while the current step is incomplete
    pub fn go_next(&mut self) -> bool {
        if !self.can_continue() {
            debug!(step = %self.step, "Step incomplete, staying put");
            return false;
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                true
            },
            None => false,
        }
    }

    pub fn go_back(&mut self) -> bool {
        match self.step.prev() {
            Some(prev) => {
                self.step = prev;
                true
            },
            None => false,
        }
    }

    /// Apply `edit` to the booking data
    ///
    /// With `snapshot` the edit becomes a new undo step; without it the current
    /// snapshot is edited in place. The price estimate is recomputed either way.
    pub fn update<F>(&mut self, edit: F, snapshot: bool)
    where
        F: FnOnce(&mut BookingData),
    {
        let mut next = self.data().clone();
        edit(&mut next);
        next.refresh_price();
        if snapshot {
            self.history.push(next);
        } else {
            self.history.replace_current(next);
        }
    }

    pub fn contact_errors(&self) -> ContactErrors {
        let data = self.data();
        ContactErrors {
            email: ContactValidator::email_error(&data.email),
            phone: ContactValidator::phone_error(&data.phone),
        }
    }

    /// Pick a date; clears the chosen time slot
    pub fn select_date(&mut self, date: NaiveDate) {
        self.update(|data| data.select_date(date), false);
    }

    /// # Errors
    /// - `NotReady` before a date has been picked
    /// - `InvalidInput` for a slot not offered by the studio
    pub fn select_time_slot(&mut self, slot: &str) -> Result<()> {
        if self.data().date.is_none() {
            return Err(StudioError::not_ready("pick a date before a time slot"));
        }
        if !is_valid_time_slot(slot) {
            return Err(StudioError::invalid_input(format!(
                "'{}' is not an available time slot",
                slot
            )));
        }
        let slot = slot.to_string();
        self.update(|data| data.time_slot = Some(slot), false);
        Ok(())
    }

    /// Store a confirmed crop as the reference image
    ///
    /// # Errors
    /// - `InvalidInput` when `asset` is not an encoded image
    pub fn attach_reference(&mut self, asset: ImageAsset) -> Result<()> {
        asset.ensure_encoded_image()?;
        self.update(|data| data.reference_image = Some(asset), true);
        Ok(())
    }

    /// Store a confirmed crop as the body photo
    ///
    /// # Errors
    /// - `InvalidInput` when `asset` is not an encoded image
    pub fn attach_body_photo(&mut self, asset: ImageAsset) -> Result<()> {
        asset.ensure_encoded_image()?;
        self.update(|data| data.body_photo = Some(asset), true);
        Ok(())
    }

    /// Forget both the generated design and the reference image
    pub fn clear_design(&mut self) {
        self.update(
            |data| {
                data.ai_generated_design = None;
                data.reference_image = None;
            },
            false,
        );
    }

    pub fn clear_simulation(&mut self) {
        self.update(|data| data.ai_simulation = None, false);
    }

    /// Refine the description, then generate a design from it
    ///
    /// The stored description stays as the client typed it.
    ///
    /// # Errors
    /// - `InvalidInput` when the description is empty
    /// - whatever the design service returns; the data is left untouched
    #[instrument(skip(self), fields(service = self.service.name()))]
    pub async fn generate_design(&mut self) -> Result<()> {
        let data = self.data();
        if data.description.trim().is_empty() {
            return Err(StudioError::invalid_input(
                "Describe the tattoo idea before generating a design",
            ));
        }
        let style = data.style.unwrap_or(DEFAULT_STYLE);
        let complexity = data.complexity.unwrap_or(DEFAULT_COMPLEXITY);
        let description = data.description.clone();

        let refined = self.service.refine_text(&description).await;
        let design = self
            .service
            .generate_design(&refined, style, complexity)
            .await?;

        info!(%style, %complexity, bytes = design.len(), "Design generated");
        self.update(|data| data.ai_generated_design = Some(design), true);
        Ok(())
    }

    /// Redraw the reference image as a clean design
    ///
    /// # Errors
    /// - `NotReady` when no reference image is attached
    /// - whatever the design service returns; the data is left untouched
    #[instrument(skip(self), fields(service = self.service.name()))]
    pub async fn enhance_reference(&mut self) -> Result<()> {
        let data = self.data();
        let reference = data
            .reference_image
            .clone()
            .ok_or_else(|| StudioError::not_ready("Attach a reference image to enhance"))?;
        let description = if data.description.trim().is_empty() {
            DEFAULT_ENHANCE_DESCRIPTION.to_string()
        } else {
            data.description.clone()
        };
        let style = data.style.unwrap_or(DEFAULT_STYLE);

        let design = self
            .service
            .enhance_design(&reference, &description, style)
            .await?;

        info!(%style, bytes = design.len(), "Reference enhanced");
        self.update(|data| data.ai_generated_design = Some(design), true);
        Ok(())
    }

    /// Open a placement session for the body photo and current design
    ///
    /// # Errors
    /// - `NotReady` when the body photo or design is missing
    /// - `InvalidInput` for an unusable viewport
    pub fn placement_compositor(
        &self,
        viewport: Size,
        config: PlacementConfig,
    ) -> Result<PlacementCompositor> {
        let data = self.data();
        let body = data
            .body_photo
            .clone()
            .ok_or_else(|| StudioError::not_ready("Upload a body photo first"))?;
        let design = data
            .design_asset()
            .cloned()
            .ok_or_else(|| StudioError::not_ready("Create or upload a design first"))?;
        PlacementCompositor::new(body, design, viewport, config)
    }

    /// Send a flattened placement composite for realistic rendering
    ///
    /// # Errors
    /// - whatever the design service returns; the data is left untouched
    #[instrument(skip(self, composite), fields(service = self.service.name()))]
    pub async fn simulate(&mut self, composite: &ImageAsset) -> Result<()> {
        let prompt = self.data().description.clone();
        let simulation = self.service.simulate_on_body(composite, &prompt).await?;

        info!(bytes = simulation.len(), "Simulation received");
        self.update(|data| data.ai_simulation = Some(simulation), true);
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Confirm the booking
    ///
    /// # Errors
    /// - `NotReady` unless the wizard is on the summary step
    pub fn complete(&self) -> Result<ConfirmedBooking> {
        if self.step != Step::Summary {
            return Err(StudioError::not_ready(format!(
                "Booking can only be confirmed from the summary (currently on {})",
                self.step
            )));
        }
        let booking = ConfirmedBooking {
            reference: booking_reference(),
            confirmed_at: Utc::now(),
            data: self.data().clone(),
        };
        info!(reference = %booking.reference, "Booking confirmed");
        Ok(booking)
    }
}

/// Short upper-case booking code such as `INK-3F9A1C2E`
fn booking_reference() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("INK-{}", &id[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::TattooSize;
    use crate::generation::{MockDesignService, ServiceCall};

    fn png() -> ImageAsset {
        crate::services::ImageIOService::encode_png(image::RgbaImage::new(4, 4)).unwrap()
    }

    fn wizard() -> WizardController<MockDesignService> {
        WizardController::new(MockDesignService::new())
    }

    #[test]
    fn test_personal_step_gating() {
        let mut w = wizard();
        assert!(!w.go_next());
        assert_eq!(w.step(), Step::Personal);

        w.update(
            |d| {
                d.full_name = "Ada".into();
                d.email = "ada@example.com".into();
                d.phone = "555 123 4567".into();
            },
            false,
        );
        assert!(w.go_next());
        assert_eq!(w.step(), Step::DateTime);
        assert!(w.go_back());
        assert!(!w.go_back());
    }

    #[test]
    fn test_date_selection_clears_slot() {
        let mut w = wizard();
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        w.select_date(date);
        w.select_time_slot("10:00 AM").unwrap();
        assert!(w.data().has_schedule());

        w.select_date(date.succ_opt().unwrap());
        assert_eq!(w.data().time_slot, None);
        assert!(w.select_time_slot("03:30 AM").is_err());
        // Non-snapshot edits do not create undo steps
        assert!(!w.can_undo());
    }

    #[test]
    fn test_time_slot_needs_a_date() {
        let mut w = wizard();
        let err = w.select_time_slot("10:00 AM").unwrap_err();
        assert!(matches!(err, StudioError::NotReady(_)));
        assert_eq!(w.data().time_slot, None);

        w.select_date(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        w.select_time_slot("10:00 AM").unwrap();
        assert_eq!(w.data().time_slot.as_deref(), Some("10:00 AM"));
    }

    #[test]
    fn test_update_refreshes_price() {
        let mut w = wizard();
        w.update(
            |d| {
                d.size = Some(TattooSize::Small);
                d.style = Some(TattooStyle::Minimalist);
            },
            false,
        );
        assert_eq!(w.data().estimated_price.unwrap().to_string(), "$100 - $130");
    }

    #[tokio::test]
    async fn test_generate_refines_first_and_uses_defaults() {
        let mut w = wizard();
        w.update(|d| d.description = "koi fish".into(), false);
        w.generate_design().await.unwrap();

        assert!(w.data().ai_generated_design.is_some());
        assert_eq!(w.data().description, "koi fish");
        assert_eq!(
            w.service().get_call_history(),
            vec![
                ServiceCall::RefineText {
                    raw: "koi fish".into()
                },
                ServiceCall::GenerateDesign {
                    prompt: "Refined: koi fish".into(),
                    style: TattooStyle::Realism,
                    complexity: Complexity::Detailed,
                },
            ]
        );
        assert!(w.undo());
        assert!(w.data().ai_generated_design.is_none());
    }

    #[tokio::test]
    async fn test_generate_requires_description() {
        let mut w = wizard();
        let err = w.generate_design().await.unwrap_err();
        assert!(matches!(err, StudioError::InvalidInput(_)));
        assert!(w.service().get_call_history().is_empty());
    }

    #[tokio::test]
    async fn test_service_failure_leaves_state_intact() {
        let mut w = WizardController::new(MockDesignService::new_failing());
        w.update(|d| d.description = "dragon".into(), true);
        let before = w.data().clone();

        assert!(w.generate_design().await.is_err());
        assert_eq!(w.data(), &before);
        assert!(w.simulate(&png()).await.is_err());
        assert_eq!(w.data(), &before);
        assert!(!w.can_redo());
    }

    #[tokio::test]
    async fn test_enhance_uses_default_description() {
        let mut w = wizard();
        assert!(matches!(
            w.enhance_reference().await.unwrap_err(),
            StudioError::NotReady(_)
        ));

        w.attach_reference(png()).unwrap();
        w.enhance_reference().await.unwrap();
        assert_eq!(
            w.service().get_call_history(),
            vec![ServiceCall::EnhanceDesign {
                description: DEFAULT_ENHANCE_DESCRIPTION.into(),
                style: DEFAULT_STYLE,
            }]
        );
    }

    #[test]
    fn test_attach_rejects_non_images() {
        let mut w = wizard();
        let err = w
            .attach_body_photo(ImageAsset::new("image/png", b"nope".to_vec()))
            .unwrap_err();
        assert!(matches!(err, StudioError::InvalidInput(_)));
        assert!(w.data().body_photo.is_none());
    }

    #[test]
    fn test_contact_errors() {
        let mut w = wizard();
        assert!(w.contact_errors().is_clean());
        w.update(
            |d| {
                d.email = "nope".into();
                d.phone = "123".into();
            },
            false,
        );
        let errors = w.contact_errors();
        assert!(errors.email.is_some());
        assert!(errors.phone.is_some());
    }

    #[test]
    fn test_placement_requires_inputs() {
        let mut w = wizard();
        let viewport = Size::new(400.0, 400.0);
        assert!(matches!(
            w.placement_compositor(viewport, PlacementConfig::default())
                .unwrap_err(),
            StudioError::NotReady(_)
        ));
        w.attach_body_photo(png()).unwrap();
        w.attach_reference(png()).unwrap();
        assert!(w
            .placement_compositor(viewport, PlacementConfig::default())
            .is_ok());
    }

    #[test]
    fn test_complete_only_from_summary() {
        let w = wizard();
        assert!(matches!(w.complete().unwrap_err(), StudioError::NotReady(_)));

        let mut w = WizardController::with_data(MockDesignService::new(), BookingData::default());
        w.step = Step::Summary;
        let booking = w.complete().unwrap();
        assert!(booking.reference.starts_with("INK-"));
        assert_eq!(booking.reference.len(), 12);
    }
}
