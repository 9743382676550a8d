//! User table contracts and SQLite implementation.

use crate::model::domain::DomainId;
use crate::model::user::{UserId, UserPatch, UserRecord};
use crate::repo::{ensure_connection_ready, is_unique_violation, RepoError, RepoResult, Table};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT id, created_at, domain_def FROM \"user\"";

/// Repository interface for the `user` table.
pub trait UserRepository {
    fn list_users(&self) -> RepoResult<Vec<UserRecord>>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<UserRecord>>;
    /// Inserts a user row; `created_at` is assigned by the store.
    fn insert_user(&self, id: UserId, domain_def: Option<DomainId>) -> RepoResult<UserRecord>;
    fn update_user(&self, id: UserId, patch: &UserPatch) -> RepoResult<UserRecord>;
    /// Returns whether a row was removed.
    fn delete_user(&self, id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn list_users(&self) -> RepoResult<Vec<UserRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<UserRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert_user(&self, id: UserId, domain_def: Option<DomainId>) -> RepoResult<UserRecord> {
        let result = self.conn.execute(
            "INSERT INTO \"user\" (id, domain_def) VALUES (?1, ?2);",
            params![id.to_string(), domain_def.map(|value| value.to_string())],
        );
        match result {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::Duplicate {
                    table: Table::Users,
                    value: id.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        self.get_user(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("inserted user {id} missing on read-back"))
        })
    }

    fn update_user(&self, id: UserId, patch: &UserPatch) -> RepoResult<UserRecord> {
        if let Some(domain_def) = patch.domain_def {
            let changed = self.conn.execute(
                "UPDATE \"user\" SET domain_def = ?2 WHERE id = ?1;",
                params![id.to_string(), domain_def.map(|value| value.to_string())],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found(Table::Users, id));
            }
        }

        self.get_user(id)?
            .ok_or_else(|| RepoError::not_found(Table::Users, id))
    }

    fn delete_user(&self, id: UserId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM \"user\" WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<UserRecord> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "user.id")?;
    let domain_def = row
        .get::<_, Option<String>>("domain_def")?
        .map(|value| parse_uuid(&value, "user.domain_def"))
        .transpose()?;

    Ok(UserRecord {
        id,
        created_at: row.get("created_at")?,
        domain_def,
    })
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
