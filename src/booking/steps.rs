//! Wizard Steps
//!
//! The five pages of the booking wizard and the fields each one owns.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::booking::record::{FieldValue, StepRecord};

// == Step Id ==
/// One page of the booking wizard, numbered 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum StepId {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
}

impl StepId {
    pub const ALL: [StepId; 5] = [
        StepId::One,
        StepId::Two,
        StepId::Three,
        StepId::Four,
        StepId::Five,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(StepId::One),
            2 => Some(StepId::Two),
            3 => Some(StepId::Three),
            4 => Some(StepId::Four),
            5 => Some(StepId::Five),
            _ => None,
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    /// Key of this step's record inside a session namespace.
    pub fn store_key(self) -> &'static str {
        match self {
            StepId::One => "booking-step-one",
            StepId::Two => "booking-step-two",
            StepId::Three => "booking-step-three",
            StepId::Four => "booking-step-four",
            StepId::Five => "booking-step-five",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            StepId::One => "Artist & schedule",
            StepId::Two => "Contact details",
            StepId::Three => "Tattoo details",
            StepId::Four => "Health & consent",
            StepId::Five => "Review & deposit",
        }
    }

    /// Steps holding personal data, cleared eagerly when a client leaves.
    pub fn is_sensitive(self) -> bool {
        matches!(self, StepId::Two | StepId::Four)
    }

    /// Text fields of the step, in display order.
    pub fn text_fields(self) -> &'static [&'static str] {
        match self {
            StepId::One => &["artist", "location", "date", "time"],
            StepId::Two => &[
                "first_name",
                "last_name",
                "email",
                "confirm_email",
                "phone",
                "birth_date",
                "contact_method",
            ],
            StepId::Three => &[
                "placement",
                "size",
                "style",
                "description",
                "color_preference",
            ],
            StepId::Four => &["medical_conditions", "allergies"],
            StepId::Five => &["deposit_method"],
        }
    }

    /// Checkbox fields of the step.
    pub fn flag_fields(self) -> &'static [&'static str] {
        match self {
            StepId::Four => &["health_consent", "aftercare_consent"],
            StepId::Five => &["accept_terms", "accept_cancellation_policy"],
            _ => &[],
        }
    }

    /// Record shown for a step with nothing saved: empty text, unchecked boxes.
    pub fn default_record(self) -> StepRecord {
        let text = self
            .text_fields()
            .iter()
            .map(|f| (f.to_string(), FieldValue::Text(String::new())));
        let flags = self
            .flag_fields()
            .iter()
            .map(|f| (f.to_string(), FieldValue::Bool(false)));
        text.chain(flags).collect()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl From<StepId> for u8 {
    fn from(step: StepId) -> Self {
        step.number()
    }
}

impl TryFrom<u8> for StepId {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        StepId::from_number(n).ok_or_else(|| format!("step must be between 1 and 5, got {}", n))
    }
}
