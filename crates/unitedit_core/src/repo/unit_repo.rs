//! Unit catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the ordered list of known units.
//! - Serve the unit list as a `UnitCatalogSource`.
//!
//! # Invariants
//! - `position` is the catalog order; `list_units` returns units by position.
//! - `resource` is unique; inserting a known resource fails with `Duplicate`.
//! - Rows that fail `UnitDescription` validation are reported, never skipped.

use crate::catalog::unit_catalog::{CatalogSourceError, UnitCatalogSource};
use crate::db::DbError;
use crate::model::unit::{UnitDescription, UnitId, UnitValidationError};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const UNIT_SELECT_SQL: &str = "SELECT resource, label FROM units";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for unit persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    /// Persisted row does not form a valid unit.
    Validation(UnitValidationError),
    Db(DbError),
    NotFound(UnitId),
    Duplicate(UnitId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid persisted unit: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(resource) => write!(f, "unit not found: {resource}"),
            Self::Duplicate(resource) => write!(f, "unit already exists: {resource}"),
            Self::InvalidData(message) => write!(f, "invalid persisted unit data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Duplicate(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<UnitValidationError> for RepoError {
    fn from(value: UnitValidationError) -> Self {
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

/// Storage contract for the unit catalog.
pub trait UnitRepository {
    /// Appends one unit at the end of the catalog order.
    fn insert_unit(&self, unit: &UnitDescription) -> RepoResult<()>;
    fn get_unit(&self, resource: &str) -> RepoResult<Option<UnitDescription>>;
    /// Exact label match; the first unit in catalog order wins.
    fn find_by_label(&self, label: &str) -> RepoResult<Option<UnitDescription>>;
    fn list_units(&self) -> RepoResult<Vec<UnitDescription>>;
    fn count_units(&self) -> RepoResult<u64>;
    fn delete_unit(&self, resource: &str) -> RepoResult<()>;
    /// Atomically replaces the whole catalog, keeping the given order.
    fn replace_all(&self, units: &[UnitDescription]) -> RepoResult<()>;
}

/// SQLite-backed unit repository.
pub struct SqliteUnitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUnitRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UnitRepository for SqliteUnitRepository<'_> {
    fn insert_unit(&self, unit: &UnitDescription) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO units (resource, label, position)
                 VALUES (?1, ?2, (SELECT COALESCE(MAX(position) + 1, 0) FROM units));",
                params![unit.resource(), unit.label()],
            )
            .map_err(|err| map_insert_error(err, unit.resource()))?;
        Ok(())
    }

    fn get_unit(&self, resource: &str) -> RepoResult<Option<UnitDescription>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{UNIT_SELECT_SQL} WHERE resource = ?1;"))?;
        let row = stmt.query_row([resource], read_unit_columns).optional()?;
        row.map(into_unit).transpose()
    }

    fn find_by_label(&self, label: &str) -> RepoResult<Option<UnitDescription>> {
        let mut stmt = self.conn.prepare(&format!(
            "{UNIT_SELECT_SQL} WHERE label = ?1 ORDER BY position ASC LIMIT 1;"
        ))?;
        let row = stmt.query_row([label], read_unit_columns).optional()?;
        row.map(into_unit).transpose()
    }

    fn list_units(&self) -> RepoResult<Vec<UnitDescription>> {
        let mut stmt = self.conn.prepare(&format!(
            "{UNIT_SELECT_SQL} ORDER BY position ASC, resource ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut units = Vec::new();

        while let Some(row) = rows.next()? {
            units.push(into_unit(read_unit_columns(row)?)?);
        }

        Ok(units)
    }

    fn count_units(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM units;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative unit count `{count}`")))
    }

    fn delete_unit(&self, resource: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM units WHERE resource = ?1;", [resource])?;
        if changed == 0 {
            return Err(RepoError::NotFound(resource.to_string()));
        }
        Ok(())
    }

    fn replace_all(&self, units: &[UnitDescription]) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM units;", [])?;
        for (position, unit) in units.iter().enumerate() {
            tx.execute(
                "INSERT INTO units (resource, label, position) VALUES (?1, ?2, ?3);",
                params![unit.resource(), unit.label(), position as i64],
            )
            .map_err(|err| map_insert_error(err, unit.resource()))?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl UnitCatalogSource for SqliteUnitRepository<'_> {
    fn load_units(&self) -> Result<Vec<UnitDescription>, CatalogSourceError> {
        Ok(self.list_units()?)
    }
}

fn read_unit_columns(row: &Row<'_>) -> rusqlite::Result<(String, String)> {
    Ok((row.get("resource")?, row.get("label")?))
}

fn into_unit((resource, label): (String, String)) -> RepoResult<UnitDescription> {
    Ok(UnitDescription::new(resource, label)?)
}

fn map_insert_error(err: rusqlite::Error, resource: &str) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            return RepoError::Duplicate(resource.to_string());
        }
    }
    err.into()
}
