//! SQLite storage for the unit catalog.
//!
//! # Responsibility
//! - Open and configure SQLite connections holding the `units` table.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Catalog reads/writes happen only on fully migrated connections.
//! - A failed migration names its version and leaves `user_version` untouched.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure of the unit catalog database.
#[derive(Debug)]
pub enum DbError {
    /// Connection or query on the `units` table failed.
    Sqlite(rusqlite::Error),
    /// Schema step `version` could not be applied.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// Catalog file was written by a newer binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Short machine-readable code for `error_code=` log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "catalog_sqlite",
            Self::Migration { .. } => "catalog_migration",
            Self::UnsupportedSchemaVersion { .. } => "catalog_schema_too_new",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "unit catalog database error: {err}"),
            Self::Migration { version, source } => {
                write!(f, "unit catalog migration {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "unit catalog schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
