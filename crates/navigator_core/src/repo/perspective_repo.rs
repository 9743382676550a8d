//! Perspective table contracts and SQLite implementation.
//!
//! # Invariants
//! - Names are unique (exact match) and non-blank.
//! - The `Default` row can be neither renamed nor deleted.
//! - Listing is ordered by id, so `Default` (seeded first) leads.

use crate::model::perspective::{
    is_default_perspective, normalize_perspective_name, Perspective, PerspectiveId,
};
use crate::model::domain::DomainValidationError;
use crate::repo::{ensure_connection_ready, is_unique_violation, RepoError, RepoResult, Table};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for the `perspectives` table.
pub trait PerspectiveRepository {
    fn list_perspectives(&self) -> RepoResult<Vec<Perspective>>;
    fn get_perspective(&self, id: PerspectiveId) -> RepoResult<Option<Perspective>>;
    fn find_perspective_by_name(&self, name: &str) -> RepoResult<Option<Perspective>>;
    fn insert_perspective(&self, name: &str) -> RepoResult<Perspective>;
    fn update_perspective(&self, id: PerspectiveId, name: &str) -> RepoResult<Perspective>;
    /// Returns whether a row was removed.
    fn delete_perspective(&self, id: PerspectiveId) -> RepoResult<bool>;
}

/// SQLite-backed perspective repository.
pub struct SqlitePerspectiveRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePerspectiveRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PerspectiveRepository for SqlitePerspectiveRepository<'_> {
    fn list_perspectives(&self) -> RepoResult<Vec<Perspective>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, perspective_name FROM perspectives ORDER BY id ASC;")?;
        let rows = stmt.query_map([], parse_perspective_row)?;
        let perspectives = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(perspectives)
    }

    fn get_perspective(&self, id: PerspectiveId) -> RepoResult<Option<Perspective>> {
        let perspective = self
            .conn
            .query_row(
                "SELECT id, perspective_name FROM perspectives WHERE id = ?1;",
                [id],
                parse_perspective_row,
            )
            .optional()?;
        Ok(perspective)
    }

    fn find_perspective_by_name(&self, name: &str) -> RepoResult<Option<Perspective>> {
        let perspective = self
            .conn
            .query_row(
                "SELECT id, perspective_name FROM perspectives WHERE perspective_name = ?1;",
                [name],
                parse_perspective_row,
            )
            .optional()?;
        Ok(perspective)
    }

    fn insert_perspective(&self, name: &str) -> RepoResult<Perspective> {
        let name = normalize_perspective_name(name)
            .ok_or(RepoError::Validation(DomainValidationError::EmptyPerspectiveName))?;

        match self.conn.execute(
            "INSERT INTO perspectives (perspective_name) VALUES (?1);",
            [name.as_str()],
        ) {
            Ok(_) => Ok(Perspective {
                id: self.conn.last_insert_rowid(),
                name,
            }),
            Err(err) if is_unique_violation(&err) => Err(RepoError::Duplicate {
                table: Table::Perspectives,
                value: name,
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn update_perspective(&self, id: PerspectiveId, name: &str) -> RepoResult<Perspective> {
        let name = normalize_perspective_name(name)
            .ok_or(RepoError::Validation(DomainValidationError::EmptyPerspectiveName))?;
        let current = self
            .get_perspective(id)?
            .ok_or_else(|| RepoError::not_found(Table::Perspectives, id))?;
        if current.is_default() && !is_default_perspective(&name) {
            return Err(RepoError::Protected {
                table: Table::Perspectives,
                value: current.name,
            });
        }

        match self.conn.execute(
            "UPDATE perspectives SET perspective_name = ?2 WHERE id = ?1;",
            params![id, name.as_str()],
        ) {
            Ok(_) => Ok(Perspective { id, name }),
            Err(err) if is_unique_violation(&err) => Err(RepoError::Duplicate {
                table: Table::Perspectives,
                value: name,
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn delete_perspective(&self, id: PerspectiveId) -> RepoResult<bool> {
        let Some(current) = self.get_perspective(id)? else {
            return Ok(false);
        };
        if current.is_default() {
            return Err(RepoError::Protected {
                table: Table::Perspectives,
                value: current.name,
            });
        }

        let changed = self
            .conn
            .execute("DELETE FROM perspectives WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

fn parse_perspective_row(row: &Row<'_>) -> rusqlite::Result<Perspective> {
    Ok(Perspective {
        id: row.get("id")?,
        name: row.get("perspective_name")?,
    })
}
