use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, postgres::PgPoolOptions};
use time::{Date, OffsetDateTime};
use tracing::{info, instrument};

use crate::{
    error::{Error, Result},
    models::{ListOrder, NewPatient, Patient, PatientFilter, PatientId, PatientUpdate},
    store::{PatientStore, today},
    validation::{self, PatientDraft, ValidationError},
};

/// Column list shared by every query that returns whole records.
macro_rules! columns {
    () => {
        r#""id", "name", "age", "gender", "contact", "address", "condition", "room", "status", "admission_date", "discharge_date", "created_at", "updated_at""#
    };
}

/// A [`PatientStore`] backed by the `patients` table in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgPatientStore {
    pool: PgPool,
}

/// A row of the `patients` table as it is stored.
#[derive(Debug, FromRow)]
struct PatientRow {
    id: i64,
    name: String,
    age: i32,
    gender: String,
    contact: String,
    address: Option<String>,
    condition: String,
    room: Option<String>,
    status: String,
    admission_date: Date,
    discharge_date: Option<Date>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<PatientRow> for Patient {
    type Error = Error;

    fn try_from(row: PatientRow) -> Result<Self> {
        let corrupt = |what: &str, value: &str| {
            Error::Corrupt(format!("patient {}: invalid {what} '{value}'", row.id))
        };

        let gender = row
            .gender
            .parse()
            .map_err(|_| corrupt("gender", &row.gender))?;
        let status = row
            .status
            .parse()
            .map_err(|_| corrupt("status", &row.status))?;

        Ok(Patient {
            id: row.id,
            name: row.name,
            age: row.age,
            gender,
            contact: row.contact,
            address: row.address,
            condition: row.condition,
            room: row.room,
            status,
            admission_date: row.admission_date,
            discharge_date: row.discharge_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl PgPatientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations from `db/migrations`.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Loads the row with a lock, applies `edit` and writes the result back in one transaction.
    async fn modify<F>(&self, id: PatientId, edit: F) -> Result<Patient>
    where
        F: FnOnce(&Patient) -> Result<PatientDraft, ValidationError> + Send,
    {
        let mut tx = self.pool.begin().await?;

        let existing: Patient = sqlx::query_as::<_, PatientRow>(concat!(
            "SELECT ",
            columns!(),
            r#" FROM "patients" WHERE "id" = $1 FOR UPDATE"#
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::NotFound(id))?
        .try_into()?;

        let draft = edit(&existing)?;

        let row = sqlx::query_as::<_, PatientRow>(concat!(
            r#"
            UPDATE "patients" SET
                "name" = $2,
                "age" = $3,
                "gender" = $4,
                "contact" = $5,
                "address" = $6,
                "condition" = $7,
                "room" = $8,
                "status" = $9,
                "admission_date" = $10,
                "discharge_date" = $11,
                "updated_at" = now()
            WHERE "id" = $1
            RETURNING "#,
            columns!()
        ))
        .bind(id)
        .bind(draft.name)
        .bind(draft.age)
        .bind(draft.gender.as_str())
        .bind(draft.contact)
        .bind(draft.address)
        .bind(draft.condition)
        .bind(draft.room)
        .bind(draft.status.as_str())
        .bind(draft.admission_date)
        .bind(draft.discharge_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }
}

/// Turns a search term into an `ILIKE` pattern matching it anywhere.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &PatientFilter) {
    if let Some(status) = filter.status {
        query.push(r#" AND "status" = "#).push_bind(status.as_str());
    }

    if let Some(id) = filter.id {
        query.push(r#" AND "id" = "#).push_bind(id);
    }

    if let Some(name) = filter.name_term() {
        query
            .push(r#" AND "name" ILIKE "#)
            .push_bind(contains_pattern(name));
    }

    if let Some(condition) = filter.condition_term() {
        query
            .push(r#" AND "condition" ILIKE "#)
            .push_bind(contains_pattern(condition));
    }

    if let Some(term) = filter.search_term() {
        let pattern = contains_pattern(term);
        query
            .push(r#" AND ("name" ILIKE "#)
            .push_bind(pattern.clone())
            .push(r#" OR "condition" ILIKE "#)
            .push_bind(pattern);

        if let Ok(id) = term.parse::<PatientId>() {
            query.push(r#" OR "id" = "#).push_bind(id);
        }

        query.push(")");
    }

    query.push(match filter.order {
        ListOrder::Created => r#" ORDER BY "id" ASC"#,
        ListOrder::Newest => r#" ORDER BY "id" DESC"#,
        ListOrder::Admission => r#" ORDER BY "admission_date" DESC, "id" DESC"#,
    });

    if let Some(limit) = filter.limit {
        query.push(" LIMIT ").push_bind(i64::from(limit));
    }

    if let Some(offset) = filter.offset {
        query.push(" OFFSET ").push_bind(i64::from(offset));
    }
}

#[async_trait]
impl PatientStore for PgPatientStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self, patient))]
    async fn create(&self, patient: &NewPatient) -> Result<Patient> {
        let draft = validation::validate_new(patient, today())?;

        let row = sqlx::query_as::<_, PatientRow>(concat!(
            r#"
            INSERT INTO "patients" (
                "name", "age", "gender", "contact", "address", "condition", "room",
                "status", "admission_date", "discharge_date"
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING "#,
            columns!()
        ))
        .bind(draft.name)
        .bind(draft.age)
        .bind(draft.gender.as_str())
        .bind(draft.contact)
        .bind(draft.address)
        .bind(draft.condition)
        .bind(draft.room)
        .bind(draft.status.as_str())
        .bind(draft.admission_date)
        .bind(draft.discharge_date)
        .fetch_one(&self.pool)
        .await?;

        info!(id = row.id, "patient admitted");
        row.try_into()
    }

    #[instrument(skip(self))]
    async fn get(&self, id: PatientId) -> Result<Patient> {
        sqlx::query_as::<_, PatientRow>(concat!(
            "SELECT ",
            columns!(),
            r#" FROM "patients" WHERE "id" = $1"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NotFound(id))?
        .try_into()
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &PatientFilter) -> Result<Vec<Patient>> {
        let mut query =
            QueryBuilder::new(concat!("SELECT ", columns!(), r#" FROM "patients" WHERE TRUE"#));
        push_filters(&mut query, filter);

        query
            .build_query_as::<PatientRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Patient::try_from)
            .collect()
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
        let patient: Patient = sqlx::query_as::<_, PatientRow>(concat!(
            r#"DELETE FROM "patients" WHERE "id" = $1 RETURNING "#,
            columns!()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NotFound(id))?
        .try_into()?;

        info!(id, "patient deleted");
        Ok(patient)
    }
}
