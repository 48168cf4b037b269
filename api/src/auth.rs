//! Role-based access as a capability check on each request.
//!
//! Handlers take a [`Caller`] and call [`Caller::require`] with the capability they need.
//! The role comes from the [`ROLE_HEADER`] header, falling back to the configured default role.

use std::fmt;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::AppError};

/// Request header carrying the caller's role.
pub const ROLE_HEADER: &str = "x-hospital-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
}
db::enum_display_str!(Role {
    Admin => "admin",
    Doctor => "doctor",
    Nurse => "nurse",
});

/// An operation that is granted per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ViewRecords,
    AdmitPatient,
    EditPatient,
    DischargePatient,
    DeletePatient,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::ViewRecords => "view records",
            Capability::AdmitPatient => "admit patients",
            Capability::EditPatient => "edit patients",
            Capability::DischargePatient => "discharge patients",
            Capability::DeletePatient => "delete patients",
        })
    }
}

impl Role {
    pub const fn allows(self, capability: Capability) -> bool {
        match (self, capability) {
            (Role::Admin, _) => true,
            (Role::Doctor, Capability::DeletePatient) => false,
            (Role::Doctor, _) => true,
            (
                Role::Nurse,
                Capability::ViewRecords | Capability::AdmitPatient | Capability::EditPatient,
            ) => true,
            (Role::Nurse, _) => false,
        }
    }
}

/// The role behind the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    role: Role,
}

impl Caller {
    pub const fn new(role: Role) -> Self {
        Self { role }
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    /// Fails with `403` unless the caller's role grants `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.role.allows(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden(self.role, capability))
        }
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let Some(value) = parts.headers.get(ROLE_HEADER) else {
            return state
                .config
                .default_role
                .map(Caller::new)
                .ok_or(AppError::Unauthorized);
        };

        let raw = value
            .to_str()
            .map_err(|_| AppError::BadRequest("role header is not valid text".into()))?;

        raw.parse::<Role>()
            .map(Caller::new)
            .map_err(|_| AppError::BadRequest(format!("unknown role '{raw}'").into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_may_do_everything() {
        for capability in [
            Capability::ViewRecords,
            Capability::AdmitPatient,
            Capability::EditPatient,
            Capability::DischargePatient,
            Capability::DeletePatient,
        ] {
            assert!(Role::Admin.allows(capability));
        }
    }

    #[test]
    fn doctors_and_nurses_are_restricted() {
        assert!(Role::Doctor.allows(Capability::DischargePatient));
        assert!(!Role::Doctor.allows(Capability::DeletePatient));

        assert!(Role::Nurse.allows(Capability::AdmitPatient));
        assert!(Role::Nurse.allows(Capability::EditPatient));
        assert!(!Role::Nurse.allows(Capability::DischargePatient));
        assert!(!Role::Nurse.allows(Capability::DeletePatient));
    }

    #[test]
    fn require_reports_role_and_capability() {
        let err = Caller::new(Role::Nurse)
            .require(Capability::DeletePatient)
            .unwrap_err();

        assert_eq!(err.to_string(), "role 'nurse' may not delete patients");
    }

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!("Doctor".parse::<Role>(), Ok(Role::Doctor));
        assert!("janitor".parse::<Role>().is_err());
    }
}
