//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define storage contracts for the unit catalog.
//! - Isolate SQLite query details from catalog and controller code.
//!
//! # Invariants
//! - Repository writes only persist validated `UnitDescription` values.
//! - Repository reads reject invalid persisted rows instead of masking them.

pub mod unit_repo;

pub use unit_repo::{RepoError, RepoResult, SqliteUnitRepository, UnitRepository};
