//! Table-store contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define list/get/insert/update/delete contracts per table.
//! - Isolate SQL details from service orchestration.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Every failure carries a human-readable message via `Display`.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::domain::DomainValidationError;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod domain_repo;
pub mod perspective_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Tables exposed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Domains,
    Perspectives,
    Users,
}

impl Table {
    /// Physical table name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Domains => "domains",
            Self::Perspectives => "perspectives",
            Self::Users => "user",
        }
    }

    /// Singular entity noun used in messages.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Domains => "domain",
            Self::Perspectives => "perspective",
            Self::Users => "user",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository error for table operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(DomainValidationError),
    Db(DbError),
    NotFound { table: Table, id: String },
    Duplicate { table: Table, value: String },
    /// Operation would remove or rename a permanent row.
    Protected { table: Table, value: String },
    UninitializedConnection { expected_version: u32, actual_version: u32 },
    InvalidData(String),
}

impl RepoError {
    pub fn not_found(table: Table, id: impl ToString) -> Self {
        Self::NotFound {
            table,
            id: id.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { table, id } => write!(f, "{} not found: {id}", table.entity()),
            Self::Duplicate { table, value } => {
                write!(f, "{} already exists: {value}", table.entity())
            }
            Self::Protected { table, value } => {
                write!(f, "{} `{value}` cannot be changed", table.entity())
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "table store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DomainValidationError> for RepoError {
    fn from(value: DomainValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Rejects connections that were not opened through `db::open_db*`.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
