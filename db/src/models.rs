//! Patient record types.
//!
//! [`Patient`] is the stored record. [`NewPatient`] and [`PatientUpdate`] are the raw write
//! inputs: dates, gender and status arrive as strings so that [`crate::validation`] can report
//! every malformed value of a request at once instead of failing on the first one.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Date, OffsetDateTime};
use utoipa::ToSchema;

use crate::enum_display_str;

/// Identifier assigned by the store on creation. Never reused.
pub type PatientId = i64;

/// A string did not name any variant of the expected enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownVariant(pub String);

/// Admission status of a patient. `Discharged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    Admitted,
    Discharged,
}
enum_display_str!(PatientStatus {
    Admitted => "admitted",
    Discharged => "discharged",
});

/// Administrative gender, following the FHIR value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}
enum_display_str!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
    Unknown => "unknown",
});

/// A stored patient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub contact: String,
    pub address: Option<String>,
    /// Diagnosis or presenting condition.
    pub condition: String,
    /// Ward or room assignment.
    pub room: Option<String>,
    pub status: PatientStatus,
    pub admission_date: Date,
    /// Set exactly when `status` is `discharged`.
    pub discharge_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Fields of a patient to be admitted.
///
/// Every field is optional on the wire; required ones are enforced by
/// [`validate_new`](crate::validation::validate_new).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct NewPatient {
    pub name: Option<String>,
    /// A whole number, or text holding one.
    #[schema(value_type = Option<i32>)]
    pub age: Option<Value>,
    /// One of `male`, `female`, `other`, `unknown`.
    pub gender: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub condition: Option<String>,
    pub room: Option<String>,
    /// `YYYY-MM-DD`, defaults to today.
    pub admission_date: Option<String>,
}

/// A partial update, merged over the stored record.
///
/// Absent fields are left untouched. An empty `address` or `room` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PatientUpdate {
    pub name: Option<String>,
    #[schema(value_type = Option<i32>)]
    pub age: Option<Value>,
    pub gender: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub condition: Option<String>,
    pub room: Option<String>,
    pub admission_date: Option<String>,
    /// `admitted` or `discharged`.
    pub status: Option<String>,
    pub discharge_date: Option<String>,
}

impl PatientUpdate {
    /// Returns `true` if the update would not touch any field.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Ordering of [`PatientStore::list`](crate::PatientStore::list) results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    /// Creation order, oldest first.
    #[default]
    Created,
    /// Creation order, newest first.
    Newest,
    /// Latest admission date first.
    Admission,
}
enum_display_str!(ListOrder {
    Created => "created",
    Newest => "newest",
    Admission => "admission",
});

/// Optional filters for listing patients. The default matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientFilter {
    pub status: Option<PatientStatus>,
    /// Matches the name or the condition (case-insensitive substring), or the identifier when
    /// the term is a number.
    pub search: Option<String>,
    pub name: Option<String>,
    pub condition: Option<String>,
    pub id: Option<PatientId>,
    pub order: ListOrder,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PatientFilter {
    pub fn with_status(status: PatientStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    pub(crate) fn search_term(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }

    pub(crate) fn name_term(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    pub(crate) fn condition_term(&self) -> Option<&str> {
        non_blank(self.condition.as_deref())
    }

    /// Checks a record against every filter except ordering and paging.
    pub fn matches(&self, patient: &Patient) -> bool {
        if self.status.is_some_and(|status| patient.status != status) {
            return false;
        }

        if self.id.is_some_and(|id| patient.id != id) {
            return false;
        }

        if self
            .name_term()
            .is_some_and(|term| !contains_ignore_case(&patient.name, term))
        {
            return false;
        }

        if self
            .condition_term()
            .is_some_and(|term| !contains_ignore_case(&patient.condition, term))
        {
            return false;
        }

        match self.search_term() {
            Some(term) => {
                contains_ignore_case(&patient.name, term)
                    || contains_ignore_case(&patient.condition, term)
                    || term.parse::<PatientId>().is_ok_and(|id| id == patient.id)
            }
            None => true,
        }
    }
}

impl ListOrder {
    /// Sorts records the same way the database backend orders them.
    pub fn sort(self, patients: &mut [Patient]) {
        match self {
            ListOrder::Created => patients.sort_by_key(|p| p.id),
            ListOrder::Newest => patients.sort_by(|a, b| b.id.cmp(&a.id)),
            ListOrder::Admission => patients.sort_by(|a, b| {
                b.admission_date
                    .cmp(&a.admission_date)
                    .then(b.id.cmp(&a.id))
            }),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;

    fn patient(id: PatientId, name: &str, condition: &str) -> Patient {
        Patient {
            id,
            name: name.to_string(),
            age: 40,
            gender: Gender::Female,
            contact: "555-0100".to_string(),
            address: None,
            condition: condition.to_string(),
            room: None,
            status: PatientStatus::Admitted,
            admission_date: date!(2024 - 01 - 10),
            discharge_date: None,
            created_at: datetime!(2024-01-10 09:00 UTC),
            updated_at: datetime!(2024-01-10 09:00 UTC),
        }
    }

    #[test]
    fn enum_strings_match_serde_names() {
        for status in PatientStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::from(status.as_str()));
        }

        for gender in Gender::ALL {
            let json = serde_json::to_value(gender).unwrap();
            assert_eq!(json, serde_json::Value::from(gender.as_str()));
        }
    }

    #[test]
    fn parsing_ignores_case_and_whitespace() {
        assert_eq!(
            " Discharged ".parse::<PatientStatus>(),
            Ok(PatientStatus::Discharged)
        );
        assert_eq!("FEMALE".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!(
            "sleeping".parse::<PatientStatus>(),
            Err(UnknownVariant("sleeping".to_string()))
        );
    }

    #[test]
    fn dates_serialize_as_iso_dates() {
        let json = serde_json::to_value(patient(1, "A. Ng", "pneumonia")).unwrap();

        assert_eq!(json["admission_date"], "2024-01-10");
        assert_eq!(json["discharge_date"], serde_json::Value::Null);
        assert_eq!(json["created_at"], "2024-01-10T09:00:00Z");
        assert_eq!(json["status"], "admitted");
    }

    #[test]
    fn search_matches_name_condition_or_id() {
        let p = patient(12, "Ada Lovelace", "Pneumonia");

        assert!(PatientFilter::with_search("love").matches(&p));
        assert!(PatientFilter::with_search("PNEU").matches(&p));
        assert!(PatientFilter::with_search("12").matches(&p));
        assert!(!PatientFilter::with_search("13").matches(&p));
        assert!(PatientFilter::with_search("   ").matches(&p));
    }

    #[test]
    fn all_filters_must_match() {
        let p = patient(3, "Grace Hopper", "fracture");

        let filter = PatientFilter {
            status: Some(PatientStatus::Admitted),
            name: Some("grace".to_string()),
            condition: Some("flu".to_string()),
            ..PatientFilter::default()
        };
        assert!(!filter.matches(&p));

        let filter = PatientFilter {
            condition: Some("FRAC".to_string()),
            ..filter
        };
        assert!(filter.matches(&p));

        assert!(!PatientFilter::with_status(PatientStatus::Discharged).matches(&p));
    }

    #[test]
    fn admission_order_breaks_ties_by_newest_id() {
        let mut a = patient(1, "a", "x");
        let mut b = patient(2, "b", "x");
        let c = patient(3, "c", "x");
        a.admission_date = date!(2024 - 02 - 01);
        b.admission_date = date!(2024 - 01 - 01);

        let mut patients = vec![b.clone(), c.clone(), a.clone()];
        ListOrder::Admission.sort(&mut patients);

        let ids: Vec<_> = patients.iter().map(|p| p.id).collect();
        assert_eq!(ids, [1, 3, 2]);

        ListOrder::Newest.sort(&mut patients);
        let ids: Vec<_> = patients.iter().map(|p| p.id).collect();
        assert_eq!(ids, [3, 2, 1]);
    }
}
