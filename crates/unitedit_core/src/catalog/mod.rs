//! Unit catalog and autocomplete.
//!
//! # Responsibility
//! - Load the session unit list once and serve read-only lookups.
//! - Derive label-prefix suggestions from free-text input.
//!
//! # See also
//! - `crate::repo::unit_repo` for the SQLite-backed catalog source.

pub mod autocomplete;
pub mod unit_catalog;
