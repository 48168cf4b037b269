use crate::{
    models::PatientId,
    validation::{ValidationError, Violation},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by the record store and the dashboard.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The proposed field set violates one or more constraints.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No patient with this identifier exists.
    #[error("patient {0} not found")]
    NotFound(PatientId),

    #[error("database error")]
    Storage(
        #[source]
        #[from]
        sqlx::Error,
    ),

    #[error("failed to apply database migrations")]
    Migrate(
        #[source]
        #[from]
        sqlx::migrate::MigrateError,
    ),

    /// A stored row could not be turned back into a [`Patient`](crate::Patient).
    #[error("corrupt patient record: {0}")]
    Corrupt(String),
}

impl From<Violation> for Error {
    fn from(violation: Violation) -> Self {
        Error::Validation(violation.into())
    }
}
