//! Step Validation
//!
//! Pure checks over a step record. Nothing here touches the store: a step is
//! valid when no required field is missing and no filled-in field is wrong.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::booking::record::{is_checked, is_filled, text, FieldValue, StepRecord};
use crate::booking::steps::StepId;

/// Minimum age to book a session.
pub const MINIMUM_AGE: i32 = 18;

const DATE_FORMAT: &str = "%Y-%m-%d";
const MIN_PHONE_DIGITS: usize = 7;
const MIN_DESCRIPTION_CHARS: usize = 10;
const CONTACT_METHODS: [&str; 3] = ["email", "phone", "text"];
const DEPOSIT_METHODS: [&str; 3] = ["card", "paypal", "in_studio"];

// == Field Message ==
/// Inline message attached to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMessage {
    pub field: &'static str,
    pub message: String,
}

impl FieldMessage {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

// == Step Report ==
/// Outcome of validating one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Required fields that are still blank
    pub missing: Vec<&'static str>,
    /// Problems with fields that are filled in
    pub messages: Vec<FieldMessage>,
}

impl StepReport {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.messages.is_empty()
    }

    /// Required text fields: blank is missing, any other non-text value is
    /// flagged so it cannot stand in for text.
    fn require(&mut self, record: &StepRecord, fields: &[&'static str]) {
        for &field in fields {
            if !is_filled(record, field) {
                self.missing.push(field);
            } else if text(record, field).is_none() {
                self.flag(field, "Enter this field as text");
            }
        }
    }

    fn require_checked(&mut self, record: &StepRecord, fields: &[&'static str]) {
        self.missing
            .extend(fields.iter().filter(|f| !is_checked(record, f)).copied());
    }

    fn flag(&mut self, field: &'static str, message: impl Into<String>) {
        self.messages.push(FieldMessage::new(field, message));
    }
}

// == Validate ==
/// Validates `record` as the given step, with `today` as the reference date.
pub fn validate(step: StepId, record: &StepRecord, today: NaiveDate) -> StepReport {
    let mut report = StepReport::default();
    match step {
        StepId::One => validate_schedule(record, today, &mut report),
        StepId::Two => validate_contact(record, today, &mut report),
        StepId::Three => validate_tattoo(record, &mut report),
        StepId::Four => validate_consent(record, &mut report),
        StepId::Five => validate_deposit(record, &mut report),
    }
    report
}

pub fn is_valid(step: StepId, record: &StepRecord, today: NaiveDate) -> bool {
    validate(step, record, today).is_valid()
}

fn validate_schedule(record: &StepRecord, today: NaiveDate, report: &mut StepReport) {
    report.require(record, &["artist", "location", "date", "time"]);

    if let Some(raw) = text(record, "date") {
        match parse_date(raw) {
            Some(date) if date <= today => report.flag("date", "Choose a date after today"),
            Some(_) => {}
            None => report.flag("date", "Enter the date as YYYY-MM-DD"),
        }
    }

    if let Some(raw) = text(record, "time") {
        if parse_slot_time(raw).is_none() {
            report.flag("time", "Pick a time slot such as 2:00 PM");
        }
    }
}

fn validate_contact(record: &StepRecord, today: NaiveDate, report: &mut StepReport) {
    report.require(
        record,
        &[
            "first_name",
            "last_name",
            "email",
            "confirm_email",
            "phone",
            "birth_date",
            "contact_method",
        ],
    );

    let email = text(record, "email");
    if let Some(email) = email {
        if !is_plausible_email(email) {
            report.flag("email", "Enter a valid email address");
        }
    }

    // Mismatch only blocks once both fields are filled in
    if let (Some(_), Some(_)) = (email, text(record, "confirm_email")) {
        if raw_text(record, "email") != raw_text(record, "confirm_email") {
            report.flag("confirm_email", "Email addresses do not match");
        }
    }

    if let Some(phone) = text(record, "phone") {
        if !is_plausible_phone(phone) {
            report.flag("phone", "Enter a phone number with at least 7 digits");
        }
    }

    if let Some(raw) = text(record, "birth_date") {
        match parse_date(raw) {
            Some(birth) if birth > today => report.flag("birth_date", "Birth date is in the future"),
            Some(birth) if !is_adult(birth, today) => report.flag(
                "birth_date",
                format!("You must be at least {} years old to book", MINIMUM_AGE),
            ),
            Some(_) => {}
            None => report.flag("birth_date", "Enter the date as YYYY-MM-DD"),
        }
    }

    if let Some(method) = text(record, "contact_method") {
        if !CONTACT_METHODS.contains(&method) {
            report.flag("contact_method", "Choose email, phone or text");
        }
    }
}

fn validate_tattoo(record: &StepRecord, report: &mut StepReport) {
    report.require(record, &["placement", "size", "style", "description"]);

    if let Some(description) = text(record, "description") {
        if description.chars().count() < MIN_DESCRIPTION_CHARS {
            report.flag(
                "description",
                format!("Describe your idea in at least {} characters", MIN_DESCRIPTION_CHARS),
            );
        }
    }
}

fn validate_consent(record: &StepRecord, report: &mut StepReport) {
    report.require_checked(record, &["health_consent", "aftercare_consent"]);
}

fn validate_deposit(record: &StepRecord, report: &mut StepReport) {
    report.require(record, &["deposit_method"]);
    report.require_checked(record, &["accept_terms", "accept_cancellation_policy"]);

    if let Some(method) = text(record, "deposit_method") {
        if !DEPOSIT_METHODS.contains(&method) {
            report.flag("deposit_method", "Choose card, paypal or in_studio");
        }
    }
}

// == Helpers ==
/// Untrimmed text of a field, for exact comparisons.
fn raw_text<'a>(record: &'a StepRecord, field: &str) -> Option<&'a str> {
    record.get(field).and_then(FieldValue::as_text)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Whole years between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// True from the 18th birthday onwards.
pub fn is_adult(birth: NaiveDate, today: NaiveDate) -> bool {
    age_on(birth, today) >= MINIMUM_AGE
}

/// Parses a slot label like `2:00 PM` into minutes after midnight.
pub fn parse_slot_time(raw: &str) -> Option<u32> {
    let (clock, meridiem) = raw.trim().split_once(' ')?;
    let (hour, minute) = clock.split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;

    if !(1..=12).contains(&hour) || minute >= 60 || minute_digits(clock) != 2 {
        return None;
    }

    let hour = match meridiem.trim().to_ascii_uppercase().as_str() {
        "AM" => hour % 12,
        "PM" => hour % 12 + 12,
        _ => return None,
    };
    Some(hour * 60 + minute)
}

fn minute_digits(clock: &str) -> usize {
    clock.rsplit(':').next().map(str::len).unwrap_or(0)
}

fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn is_plausible_phone(phone: &str) -> bool {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.'));
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    allowed && digits >= MIN_PHONE_DIGITS
}
