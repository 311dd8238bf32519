//! Booking Module
//!
//! Multi-step booking drafts kept in the expiring store: one adapter per
//! wizard step, a wizard sequencing them, and submission with retry.

mod adapter;
mod record;
mod steps;
mod submit;
mod validation;
mod wizard;

pub use adapter::StepAdapter;
pub use record::{is_checked, is_filled, merge, record_of, text, FieldValue, StepRecord};
pub use steps::StepId;
pub use submit::{
    submit_with_retry, BookingRequest, BookingSubmitter, Confirmation, RetryPolicy,
    SimulatedSubmitter,
};
pub use validation::{
    age_on, is_adult, is_valid, parse_date, parse_slot_time, validate, FieldMessage, StepReport,
    MINIMUM_AGE,
};
pub use wizard::{BookingWizard, SessionSummary, StepStatus, WizardSettings, CURRENT_STEP_KEY};
