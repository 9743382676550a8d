//! Explicit application state for the navigator view.
//!
//! # Responsibility
//! - Own domains, perspectives, the active selection and form draft.
//! - Track in-flight mutations and queued user-facing notices.
//!
//! # Invariants
//! - `AppState::apply` never mutates its receiver; it returns a new state.
//! - The perspective registry always contains `Default`.

pub mod app_state;
pub mod domain_registry;
pub mod notice;
pub mod perspective_registry;

use crate::model::domain::{DomainId, DomainValidationError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mutation categories, one per UI control that triggers a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    AddDomain,
    UpdateDomain,
    DeleteDomain,
    AddPerspective,
    DeletePerspective,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddDomain => "add_domain",
            Self::UpdateDomain => "update_domain",
            Self::DeleteDomain => "delete_domain",
            Self::AddPerspective => "add_perspective",
            Self::DeletePerspective => "delete_perspective",
        }
    }
}

impl Display for MutationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    DomainNotFound(DomainId),
    Validation(DomainValidationError),
    /// The same mutation kind is already in flight.
    Busy(MutationKind),
}

impl Display for StateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainNotFound(id) => write!(f, "domain not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Busy(kind) => write!(f, "{kind} is already in progress"),
        }
    }
}

impl Error for StateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DomainValidationError> for StateError {
    fn from(value: DomainValidationError) -> Self {
        Self::Validation(value)
    }
}
