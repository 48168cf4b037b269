//! Checks that run before every write.
//!
//! Nothing here touches storage. Each function takes the proposed values (and, for edits, the
//! stored record) and returns either the complete field set to persist or a [`ValidationError`]
//! listing every violated constraint.

use std::fmt;

use serde_json::Value;
use time::{Date, OffsetDateTime, macros::format_description};

use crate::models::{Gender, NewPatient, Patient, PatientId, PatientStatus, PatientUpdate};

/// Highest accepted age in years.
pub const MAX_AGE: i32 = 150;

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("age must be between 0 and {max}, got {0}", max = MAX_AGE)]
    AgeOutOfRange(i64),

    #[error("malformed age {0}, expected a whole number")]
    MalformedAge(String),

    #[error("unknown gender '{0}'")]
    UnknownGender(String),

    #[error("unknown status '{0}', expected 'admitted' or 'discharged'")]
    UnknownStatus(String),

    #[error("malformed {field} '{value}', expected YYYY-MM-DD")]
    MalformedDate { field: &'static str, value: String },

    #[error("discharge date {discharge} is earlier than admission date {admission}")]
    DischargeBeforeAdmission { admission: Date, discharge: Date },

    #[error("a discharge date requires status 'discharged'")]
    DischargeDateWhileAdmitted,

    #[error("patient is already discharged")]
    AlreadyDischarged,

    #[error("a discharged patient cannot be re-admitted, create a new record instead")]
    Readmission,

    #[error("no fields to update")]
    NoChanges,
}

/// One or more violated constraints of a single write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns `true` if `violation` is among the reported violations.
    pub fn contains(&self, violation: &Violation) -> bool {
        self.violations.contains(violation)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid patient record")?;

        for (idx, violation) in self.violations.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            write!(f, "{sep}{violation}")?;
        }

        Ok(())
    }
}

impl From<Violation> for ValidationError {
    fn from(violation: Violation) -> Self {
        Self::new(vec![violation])
    }
}

/// The complete, validated field set of a record, ready to be written.
///
/// Identifier and audit timestamps are owned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientDraft {
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub contact: String,
    pub address: Option<String>,
    pub condition: String,
    pub room: Option<String>,
    pub status: PatientStatus,
    pub admission_date: Date,
    pub discharge_date: Option<Date>,
}

impl PatientDraft {
    /// Attaches the store-owned fields.
    pub fn into_patient(
        self,
        id: PatientId,
        created_at: OffsetDateTime,
        updated_at: OffsetDateTime,
    ) -> Patient {
        Patient {
            id,
            name: self.name,
            age: self.age,
            gender: self.gender,
            contact: self.contact,
            address: self.address,
            condition: self.condition,
            room: self.room,
            status: self.status,
            admission_date: self.admission_date,
            discharge_date: self.discharge_date,
            created_at,
            updated_at,
        }
    }
}

impl From<&Patient> for PatientDraft {
    fn from(patient: &Patient) -> Self {
        Self {
            name: patient.name.clone(),
            age: patient.age,
            gender: patient.gender,
            contact: patient.contact.clone(),
            address: patient.address.clone(),
            condition: patient.condition.clone(),
            room: patient.room.clone(),
            status: patient.status,
            admission_date: patient.admission_date,
            discharge_date: patient.discharge_date,
        }
    }
}

/// Parses a `YYYY-MM-DD` date, naming `field` in the violation.
pub fn parse_date(field: &'static str, value: &str) -> Result<Date, Violation> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        Violation::MalformedDate {
            field,
            value: value.to_string(),
        }
    })
}

/// Parses a patient status, ignoring case.
pub fn parse_status(value: &str) -> Result<PatientStatus, Violation> {
    value
        .parse()
        .map_err(|_| Violation::UnknownStatus(value.to_string()))
}

/// Validates the fields of a patient to be admitted.
///
/// The new record is `admitted` without a discharge date; a missing admission date becomes
/// `today`.
pub fn validate_new(input: &NewPatient, today: Date) -> Result<PatientDraft, ValidationError> {
    let mut violations = Vec::new();

    let name = required_text("name", input.name.as_deref(), &mut violations);
    let age = match &input.age {
        Some(age) => keep(parse_age(age), &mut violations),
        None => keep(Err(Violation::MissingField("age")), &mut violations),
    };
    let gender = match non_blank(input.gender.as_deref()) {
        Some(raw) => keep(parse_gender(raw), &mut violations),
        None => keep(Err(Violation::MissingField("gender")), &mut violations),
    };
    let contact = required_text("contact", input.contact.as_deref(), &mut violations);
    let condition = required_text("condition", input.condition.as_deref(), &mut violations);
    let admission_date = match non_blank(input.admission_date.as_deref()) {
        Some(raw) => keep(parse_date("admission_date", raw), &mut violations),
        None => Some(today),
    };

    match (name, age, gender, contact, condition, admission_date) {
        (Some(name), Some(age), Some(gender), Some(contact), Some(condition), Some(admission_date))
            if violations.is_empty() =>
        {
            Ok(PatientDraft {
                name,
                age,
                gender,
                contact,
                address: optional_text(input.address.as_deref()),
                condition,
                room: optional_text(input.room.as_deref()),
                status: PatientStatus::Admitted,
                admission_date,
                discharge_date: None,
            })
        }
        _ => Err(ValidationError::new(violations)),
    }
}

/// Merges `update` over `existing` and validates the result.
///
/// Setting the status to `discharged` without any discharge date uses `today`. Moving a
/// discharged record back to `admitted` is rejected.
pub fn apply_update(
    existing: &Patient,
    update: &PatientUpdate,
    today: Date,
) -> Result<PatientDraft, ValidationError> {
    if update.is_empty() {
        return Err(Violation::NoChanges.into());
    }

    let mut draft = PatientDraft::from(existing);
    let mut violations = Vec::new();

    if let Some(raw) = update.name.as_deref() {
        if let Some(name) = required_text("name", Some(raw), &mut violations) {
            draft.name = name;
        }
    }
    if let Some(age) = &update.age {
        if let Some(age) = keep(parse_age(age), &mut violations) {
            draft.age = age;
        }
    }
    if let Some(raw) = update.gender.as_deref() {
        let parsed = match non_blank(Some(raw)) {
            Some(raw) => parse_gender(raw),
            None => Err(Violation::MissingField("gender")),
        };
        if let Some(gender) = keep(parsed, &mut violations) {
            draft.gender = gender;
        }
    }
    if let Some(raw) = update.contact.as_deref() {
        if let Some(contact) = required_text("contact", Some(raw), &mut violations) {
            draft.contact = contact;
        }
    }
    if let Some(raw) = update.condition.as_deref() {
        if let Some(condition) = required_text("condition", Some(raw), &mut violations) {
            draft.condition = condition;
        }
    }
    if let Some(raw) = update.address.as_deref() {
        draft.address = optional_text(Some(raw));
    }
    if let Some(raw) = update.room.as_deref() {
        draft.room = optional_text(Some(raw));
    }
    if let Some(raw) = update.admission_date.as_deref() {
        if let Some(date) = keep(parse_date("admission_date", raw), &mut violations) {
            draft.admission_date = date;
        }
    }
    if let Some(raw) = update.discharge_date.as_deref() {
        match non_blank(Some(raw)) {
            Some(raw) => {
                if let Some(date) = keep(parse_date("discharge_date", raw), &mut violations) {
                    draft.discharge_date = Some(date);
                }
            }
            None => draft.discharge_date = None,
        }
    }
    if let Some(raw) = update.status.as_deref() {
        match keep(parse_status(raw), &mut violations) {
            Some(PatientStatus::Discharged) => {
                draft.status = PatientStatus::Discharged;
                draft.discharge_date.get_or_insert(today);
            }
            Some(PatientStatus::Admitted) if existing.status == PatientStatus::Discharged => {
                violations.push(Violation::Readmission);
            }
            Some(PatientStatus::Admitted) | None => {}
        }
    }

    check_lifecycle(&draft, &mut violations);

    if violations.is_empty() {
        Ok(draft)
    } else {
        Err(ValidationError::new(violations))
    }
}

/// Moves an admitted record to `discharged` on `date` (or `today`).
pub fn apply_discharge(
    existing: &Patient,
    date: Option<Date>,
    today: Date,
) -> Result<PatientDraft, ValidationError> {
    if existing.status == PatientStatus::Discharged {
        return Err(Violation::AlreadyDischarged.into());
    }

    let mut draft = PatientDraft::from(existing);
    draft.status = PatientStatus::Discharged;
    draft.discharge_date = Some(date.unwrap_or(today));

    let mut violations = Vec::new();
    check_lifecycle(&draft, &mut violations);

    if violations.is_empty() {
        Ok(draft)
    } else {
        Err(ValidationError::new(violations))
    }
}

/// Status is `discharged` iff a discharge date is set, and discharge never precedes admission.
fn check_lifecycle(draft: &PatientDraft, violations: &mut Vec<Violation>) {
    match (draft.status, draft.discharge_date) {
        (PatientStatus::Admitted, Some(_)) => violations.push(Violation::DischargeDateWhileAdmitted),
        (PatientStatus::Discharged, None) => {
            violations.push(Violation::MissingField("discharge_date"));
        }
        (PatientStatus::Discharged, Some(discharge)) if discharge < draft.admission_date => {
            violations.push(Violation::DischargeBeforeAdmission {
                admission: draft.admission_date,
                discharge,
            });
        }
        _ => {}
    }
}

fn keep<T>(result: Result<T, Violation>, violations: &mut Vec<Violation>) -> Option<T> {
    result.map_err(|v| violations.push(v)).ok()
}

/// Accepts a whole number, either as a JSON number or as text holding one.
fn parse_age(value: &Value) -> Result<i32, Violation> {
    let whole = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    let Some(age) = whole else {
        return Err(Violation::MalformedAge(value.to_string()));
    };

    match i32::try_from(age) {
        Ok(age) if (0..=MAX_AGE).contains(&age) => Ok(age),
        _ => Err(Violation::AgeOutOfRange(age)),
    }
}

fn parse_gender(value: &str) -> Result<Gender, Violation> {
    value
        .parse()
        .map_err(|_| Violation::UnknownGender(value.to_string()))
}

fn required_text(
    field: &'static str,
    value: Option<&str>,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    let text = non_blank(value).map(str::to_string);
    if text.is_none() {
        violations.push(Violation::MissingField(field));
    }
    text
}

fn optional_text(value: Option<&str>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
