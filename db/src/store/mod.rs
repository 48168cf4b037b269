//! The record store: the only owner of persisted patient records.
//!
//! Callers hold an `Arc<dyn PatientStore>` and never see which backend sits behind it.

use async_trait::async_trait;
use time::{Date, OffsetDateTime};

use crate::{
    error::Result,
    models::{NewPatient, Patient, PatientFilter, PatientId, PatientUpdate},
};

mod memory;
mod postgres;

pub use memory::MemoryPatientStore;
pub use postgres::PgPatientStore;

/// Create, read, update and delete access to patient records.
///
/// Writes run the [`validation`](crate::validation) layer before anything is persisted and fail
/// with [`Error::Validation`](crate::Error::Validation). Operations on an unknown identifier fail
/// with [`Error::NotFound`](crate::Error::NotFound).
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()>;

    /// Admits a new patient and returns the stored record with its assigned identifier.
    async fn create(&self, patient: &NewPatient) -> Result<Patient>;

    async fn get(&self, id: PatientId) -> Result<Patient>;

    /// Returns every record matching `filter`, in the order it asks for.
    async fn list(&self, filter: &PatientFilter) -> Result<Vec<Patient>>;

    /// Merges `update` into the stored record.
    async fn update(&self, id: PatientId, update: &PatientUpdate) -> Result<Patient>;

    /// Marks an admitted patient as discharged on `date`, or today when `None`.
    async fn discharge(&self, id: PatientId, date: Option<Date>) -> Result<Patient>;

    /// Permanently removes a record and returns it. Deleting twice fails with `NotFound`.
    async fn delete(&self, id: PatientId) -> Result<Patient>;
}

/// The current date in UTC, used for defaulted admission and discharge dates.
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}
