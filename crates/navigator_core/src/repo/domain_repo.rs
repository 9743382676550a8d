//! Domain table contracts and SQLite implementation.
//!
//! # Invariants
//! - `list_domains` returns rows in insertion order.
//! - Particle maps are stored as one JSON object per row (`particles`).
//! - `delete_domain` on a missing id succeeds and reports `false`.

use crate::model::domain::{Domain, DomainId, DomainPatch, DomainType, PerspectiveMap};
use crate::repo::{ensure_connection_ready, is_unique_violation, RepoError, RepoResult, Table};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const DOMAIN_SELECT_SQL: &str = "SELECT
    id,
    domain_name,
    domain_type,
    description,
    particles
FROM domains";

/// Repository interface for the `domains` table.
pub trait DomainRepository {
    fn list_domains(&self) -> RepoResult<Vec<Domain>>;
    fn get_domain(&self, id: DomainId) -> RepoResult<Option<Domain>>;
    fn insert_domain(&self, domain: &Domain) -> RepoResult<DomainId>;
    /// Applies a partial patch and returns the merged record.
    fn update_domain(&self, id: DomainId, patch: &DomainPatch) -> RepoResult<Domain>;
    /// Replaces every column of an existing row.
    fn replace_domain(&self, domain: &Domain) -> RepoResult<()>;
    /// Returns whether a row was removed.
    fn delete_domain(&self, id: DomainId) -> RepoResult<bool>;
}

/// SQLite-backed domain repository.
pub struct SqliteDomainRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDomainRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn select_one(&self, id: DomainId) -> RepoResult<Option<Domain>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DOMAIN_SELECT_SQL} WHERE id = ?1;"))?;
        let columns = stmt
            .query_row([id.to_string()], read_domain_columns)
            .optional()?;
        columns.map(DomainColumns::into_domain).transpose()
    }

    fn write_columns(&self, domain: &Domain) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE domains
             SET
                domain_name = ?2,
                domain_type = ?3,
                description = ?4,
                particles = ?5
             WHERE id = ?1;",
            params![
                domain.id.to_string(),
                domain.name.as_str(),
                domain_type_to_db(domain.kind),
                domain.description.as_deref(),
                encode_particles(&domain.perspectives)?,
            ],
        )?;
        Ok(changed)
    }
}

impl DomainRepository for SqliteDomainRepository<'_> {
    fn list_domains(&self) -> RepoResult<Vec<Domain>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DOMAIN_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut domains = Vec::new();
        while let Some(row) = rows.next()? {
            domains.push(read_domain_columns(row)?.into_domain()?);
        }
        Ok(domains)
    }

    fn get_domain(&self, id: DomainId) -> RepoResult<Option<Domain>> {
        self.select_one(id)
    }

    fn insert_domain(&self, domain: &Domain) -> RepoResult<DomainId> {
        domain.validate()?;

        let result = self.conn.execute(
            "INSERT INTO domains (
                id,
                domain_name,
                domain_type,
                description,
                particles
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                domain.id.to_string(),
                domain.name.as_str(),
                domain_type_to_db(domain.kind),
                domain.description.as_deref(),
                encode_particles(&domain.perspectives)?,
            ],
        );

        match result {
            Ok(_) => Ok(domain.id),
            Err(err) if is_unique_violation(&err) => Err(RepoError::Duplicate {
                table: Table::Domains,
                value: domain.id.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn update_domain(&self, id: DomainId, patch: &DomainPatch) -> RepoResult<Domain> {
        let tx = self.conn.unchecked_transaction()?;
        let mut domain = self
            .select_one(id)?
            .ok_or_else(|| RepoError::not_found(Table::Domains, id))?;
        domain.apply_patch(patch);
        domain.validate()?;
        self.write_columns(&domain)?;
        tx.commit()?;
        Ok(domain)
    }

    fn replace_domain(&self, domain: &Domain) -> RepoResult<()> {
        domain.validate()?;
        if self.write_columns(domain)? == 0 {
            return Err(RepoError::not_found(Table::Domains, domain.id));
        }
        Ok(())
    }

    fn delete_domain(&self, id: DomainId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM domains WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

struct DomainColumns {
    id: String,
    name: String,
    kind: String,
    description: Option<String>,
    particles: String,
}

impl DomainColumns {
    fn into_domain(self) -> RepoResult<Domain> {
        let id = Uuid::parse_str(&self.id).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{}` in domains.id", self.id))
        })?;
        let kind = parse_domain_type(&self.kind).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid domain type `{}` in domains.domain_type",
                self.kind
            ))
        })?;
        let perspectives: PerspectiveMap =
            serde_json::from_str(&self.particles).map_err(|err| {
                RepoError::InvalidData(format!("invalid particles json for domain {id}: {err}"))
            })?;

        let domain = Domain {
            id,
            name: self.name,
            kind,
            description: self.description,
            perspectives,
        };
        domain.validate()?;
        Ok(domain)
    }
}

fn read_domain_columns(row: &Row<'_>) -> rusqlite::Result<DomainColumns> {
    Ok(DomainColumns {
        id: row.get("id")?,
        name: row.get("domain_name")?,
        kind: row.get("domain_type")?,
        description: row.get("description")?,
        particles: row.get("particles")?,
    })
}

fn encode_particles(perspectives: &PerspectiveMap) -> RepoResult<String> {
    serde_json::to_string(perspectives)
        .map_err(|err| RepoError::InvalidData(format!("particles not serializable: {err}")))
}

fn domain_type_to_db(kind: DomainType) -> &'static str {
    match kind {
        DomainType::Trust => "trust",
        DomainType::Knowledge => "knowledge",
        DomainType::Tools => "tools",
        DomainType::Exchange => "exchange",
    }
}

fn parse_domain_type(value: &str) -> Option<DomainType> {
    match value {
        "trust" => Some(DomainType::Trust),
        "knowledge" => Some(DomainType::Knowledge),
        "tools" => Some(DomainType::Tools),
        "exchange" => Some(DomainType::Exchange),
        _ => None,
    }
}
