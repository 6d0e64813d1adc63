//! Booking model: wizard steps, design options, schedule and price estimate

use crate::error::StudioError;
use crate::types::ImageAsset;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of consecutive days offered for booking, starting today
pub const BOOKING_WINDOW_DAYS: u64 = 14;

pub const TIME_SLOTS: [&str; 7] = [
    "10:00 AM", "11:30 AM", "01:00 PM", "02:30 PM", "04:00 PM", "05:30 PM", "07:00 PM",
];

pub const BODY_PLACEMENTS: [&str; 13] = [
    "Forearm",
    "Upper Arm",
    "Chest",
    "Back",
    "Thigh",
    "Calf",
    "Neck",
    "Wrist",
    "Ankle",
    "Shoulder",
    "Sternum",
    "Elbow",
    "Knee",
];

/// Description used when enhancing a reference without one
pub const DEFAULT_ENHANCE_DESCRIPTION: &str = "Clean up this sketch";

/// Wizard steps in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    Personal,
    DateTime,
    Payment,
    Design,
    Simulation,
    Summary,
}

impl Step {
    pub const ALL: [Self; 6] = [
        Self::Personal,
        Self::DateTime,
        Self::Payment,
        Self::Design,
        Self::Simulation,
        Self::Summary,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Personal => 0,
            Self::DateTime => 1,
            Self::Payment => 2,
            Self::Design => 3,
            Self::Simulation => 4,
            Self::Summary => 5,
        }
    }

    /// Short label for the progress bar
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Personal => "Info",
            Self::DateTime => "Date",
            Self::Payment => "Pay",
            Self::Design => "Design",
            Self::Simulation => "Sim",
            Self::Summary => "Done",
        }
    }

    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    #[must_use]
    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    /// Progress through the wizard, `(index + 1) / steps * 100`
    #[must_use]
    pub fn progress_percent(self) -> f64 {
        (self.index() + 1) as f64 / Self::ALL.len() as f64 * 100.0
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Declare a simple named option enum with `name()`, `ALL`, `Display` and
/// case-insensitive `FromStr`
macro_rules! named_options {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = StudioError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|option| option.name().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        let names: Vec<&str> = Self::ALL.iter().map(|o| o.name()).collect();
                        StudioError::invalid_input(format!(
                            "Unknown {} '{}' (expected one of: {})",
                            stringify!($name),
                            wanted,
                            names.join(", ")
                        ))
                    })
            }
        }
    };
}

named_options!(
    /// Artistic style of the design
    TattooStyle {
        Realism => "Realism",
        Traditional => "Traditional",
        Minimalist => "Minimalist",
        Geometric => "Geometric",
        Watercolor => "Watercolor",
        Lettering => "Lettering",
        Blackwork => "Blackwork",
    }
);

named_options!(
    /// Level of detail requested from the artist
    Complexity {
        Simple => "Simple",
        Medium => "Medium",
        Detailed => "Detailed",
    }
);

named_options!(
    TattooSize {
        Small => "Small",
        Medium => "Medium",
        Large => "Large",
    }
);

impl TattooSize {
    /// Starting price in dollars
    #[must_use]
    pub fn base_price(self) -> u32 {
        match self {
            Self::Small => 100,
            Self::Medium => 250,
            Self::Large => 500,
        }
    }
}

/// Quoted price range in whole dollars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEstimate {
    pub low: u32,
    pub high: u32,
}

impl fmt::Display for PriceEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${} - ${}", self.low, self.high)
    }
}

/// Estimate a price range; needs both a size and a style
///
/// Base price by size, x1.5 for detailed work, x1.2 for realism. The upper
/// bound is 30% above the base, rounded half up.
#[must_use]
pub fn estimate_price(
    size: Option<TattooSize>,
    style: Option<TattooStyle>,
    complexity: Option<Complexity>,
) -> Option<PriceEstimate> {
    let size = size?;
    let style = style?;

    // Every multiplier divides the base prices exactly
    let mut base = size.base_price();
    if complexity == Some(Complexity::Detailed) {
        base = base * 3 / 2;
    }
    if style == TattooStyle::Realism {
        base = base * 6 / 5;
    }

    Some(PriceEstimate {
        low: base,
        high: (base * 13 + 5) / 10,
    })
}

/// The `count` consecutive dates starting at `today`
#[must_use]
pub fn upcoming_dates(today: NaiveDate, count: u64) -> Vec<NaiveDate> {
    (0..count)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .collect()
}

#[must_use]
pub fn is_valid_time_slot(slot: &str) -> bool {
    TIME_SLOTS.contains(&slot)
}

/// Everything collected by the booking wizard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingData {
    // Design
    pub placement: String,
    pub description: String,
    pub style: Option<TattooStyle>,
    pub complexity: Option<Complexity>,
    pub size: Option<TattooSize>,
    pub estimated_price: Option<PriceEstimate>,
    pub reference_image: Option<ImageAsset>,
    pub ai_generated_design: Option<ImageAsset>,
    pub ai_simulation: Option<ImageAsset>,
    pub body_photo: Option<ImageAsset>,

    // Schedule
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,

    // Contact
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

impl BookingData {
    /// Pick a date; any previously chosen time slot is cleared
    pub fn select_date(&mut self, date: NaiveDate) {
        self.date = Some(date);
        self.time_slot = None;
    }

    /// Recompute the estimate from size, style and complexity
    ///
    /// Leaves a previous estimate in place while size or style is missing.
    pub fn refresh_price(&mut self) {
        if let Some(estimate) = estimate_price(self.size, self.style, self.complexity) {
            self.estimated_price = Some(estimate);
        }
    }

    /// The design that goes on the body: the AI design if any, else the reference
    #[must_use]
    pub fn design_asset(&self) -> Option<&ImageAsset> {
        self.ai_generated_design
            .as_ref()
            .or(self.reference_image.as_ref())
    }

    #[must_use]
    pub fn has_contact_details(&self) -> bool {
        !self.full_name.trim().is_empty()
            && !self.email.trim().is_empty()
            && !self.phone.trim().is_empty()
    }

    #[must_use]
    pub fn has_schedule(&self) -> bool {
        self.date.is_some() && self.time_slot.is_some()
    }
}
