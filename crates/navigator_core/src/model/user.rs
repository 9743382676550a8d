//! User table record.
//!
//! Mirrors the `user` table of the store. The navigator flow does not read
//! it; it is exposed for account-level tooling.

use crate::model::domain::DomainId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    /// Epoch milliseconds, assigned by the store.
    pub created_at: i64,
    /// Domain this user has defined, if any.
    pub domain_def: Option<DomainId>,
}

/// Partial update for a user row. `Some(None)` clears `domain_def`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub domain_def: Option<Option<DomainId>>,
}
