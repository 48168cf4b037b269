//! Storage, validation and aggregation for hospital patient records.
//!
//! - [`PatientStore`] is the record store, with a PostgreSQL ([`PgPatientStore`]) and an
//!   in-memory ([`MemoryPatientStore`]) backend.
//! - [`validation`] checks every write before it reaches a store.
//! - [`dashboard`] derives statistics from the current store contents.

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod error;
mod macros;
mod models;
mod store;

pub mod dashboard;
pub mod validation;

pub use error::{Error, Result};
pub use models::{
    Gender, ListOrder, NewPatient, Patient, PatientFilter, PatientId, PatientStatus,
    PatientUpdate, UnknownVariant,
};
pub use store::{MemoryPatientStore, PatientStore, PgPatientStore, today};
pub use validation::{ValidationError, Violation};
