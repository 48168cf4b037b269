use std::collections::BTreeMap;

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::{
    error::{Error, Result},
    models::{NewPatient, Patient, PatientFilter, PatientId, PatientUpdate},
    store::{PatientStore, today},
    validation::{self, PatientDraft, ValidationError},
};

/// A [`PatientStore`] that keeps records in process memory.
///
/// Used for development and tests. Records are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryPatientStore {
    inner: RwLock<Records>,
}

#[derive(Debug, Default)]
struct Records {
    last_id: PatientId,
    by_id: BTreeMap<PatientId, Patient>,
}

impl MemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify<F>(&self, id: PatientId, edit: F) -> Result<Patient>
    where
        F: FnOnce(&Patient) -> Result<PatientDraft, ValidationError>,
    {
        let mut records = self.inner.write().await;
        let existing = records.by_id.get_mut(&id).ok_or(Error::NotFound(id))?;

        let draft = edit(&*existing)?;
        *existing = draft.into_patient(id, existing.created_at, OffsetDateTime::now_utc());

        Ok(existing.clone())
    }
}

#[async_trait]
impl PatientStore for MemoryPatientStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    #[instrument(skip(self, patient))]
    async fn create(&self, patient: &NewPatient) -> Result<Patient> {
        let draft = validation::validate_new(patient, today())?;

        let mut records = self.inner.write().await;
        records.last_id += 1;
        let id = records.last_id;

        let now = OffsetDateTime::now_utc();
        let patient = draft.into_patient(id, now, now);
        records.by_id.insert(id, patient.clone());

        info!(id, "patient admitted");
        Ok(patient)
    }

    async fn get(&self, id: PatientId) -> Result<Patient> {
        self.inner
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound(id))
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &PatientFilter) -> Result<Vec<Patient>> {
        let mut patients: Vec<Patient> = self
            .inner
            .read()
            .await
            .by_id
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        filter.order.sort(&mut patients);

        let offset = filter
            .offset
            .map_or(0, |o| usize::try_from(o).unwrap_or(usize::MAX));
        let limit = filter
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        Ok(patients.into_iter().skip(offset).take(limit).collect())
    }

    #[instrument(skip(self, update))]
    async fn update(&self, id: PatientId, update: &PatientUpdate) -> Result<Patient> {
        let today = today();
        let patient = self
            .modify(id, |existing| validation::apply_update(existing, update, today))
            .await?;

        info!(id, "patient updated");
        Ok(patient)
    }

    #[instrument(skip(self))]
    async fn discharge(&self, id: PatientId, date: Option<Date>) -> Result<Patient> {
        let today = today();
        let patient = self
            .modify(id, |existing| validation::apply_discharge(existing, date, today))
            .await?;

        info!(id, "patient discharged");
        Ok(patient)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: PatientId) -> Result<Patient> {
        let patient = self
            .inner
            .write()
            .await
            .by_id
            .remove(&id)
            .ok_or(Error::NotFound(id))?;

        info!(id, "patient deleted");
        Ok(patient)
    }
}
