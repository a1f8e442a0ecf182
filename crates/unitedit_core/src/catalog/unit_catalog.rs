//! Session-wide unit catalog.
//!
//! # Responsibility
//! - Load all known units once from a `UnitCatalogSource`.
//! - Provide pure lookups by label and by resource.
//!
//! # Invariants
//! - A loaded catalog is read-only; clones share the same storage.
//! - Load failures degrade to an empty catalog and never propagate.

use crate::catalog::autocomplete::filter_units;
use crate::model::unit::UnitDescription;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Failure reported by a catalog source.
#[derive(Debug)]
pub enum CatalogSourceError {
    /// Source cannot be reached or is not configured.
    Unavailable(String),
    /// Backing storage failed while reading units.
    Storage(RepoError),
}

impl Display for CatalogSourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "unit catalog unavailable: {message}"),
            Self::Storage(err) => write!(f, "unit catalog storage error: {err}"),
        }
    }
}

impl Error for CatalogSourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(_) => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<RepoError> for CatalogSourceError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Provider of the full unit list.
pub trait UnitCatalogSource {
    fn load_units(&self) -> Result<Vec<UnitDescription>, CatalogSourceError>;
}

/// In-memory catalog source.
#[derive(Debug, Clone, Default)]
pub struct StaticUnitSource {
    units: Vec<UnitDescription>,
}

impl StaticUnitSource {
    pub fn new(units: Vec<UnitDescription>) -> Self {
        Self { units }
    }
}

impl UnitCatalogSource for StaticUnitSource {
    fn load_units(&self) -> Result<Vec<UnitDescription>, CatalogSourceError> {
        Ok(self.units.clone())
    }
}

/// Immutable, cheaply clonable list of known units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCatalog {
    units: Arc<[UnitDescription]>,
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self::from_units(Vec::new())
    }
}

impl UnitCatalog {
    /// Loads the catalog from `source`.
    ///
    /// Returns an empty catalog when the source fails.
    pub fn load(source: &dyn UnitCatalogSource) -> Self {
        match source.load_units() {
            Ok(units) => {
                info!(
                    "event=catalog_load module=catalog status=ok units={}",
                    units.len()
                );
                Self::from_units(units)
            }
            Err(err) => {
                warn!(
                    "event=catalog_load module=catalog status=error fallback=empty error={}",
                    err
                );
                Self::empty()
            }
        }
    }

    pub fn from_units(units: Vec<UnitDescription>) -> Self {
        Self {
            units: units.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn units(&self) -> &[UnitDescription] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn find_by_label(&self, label: &str) -> Option<&UnitDescription> {
        find_unit_by_label(&self.units, label)
    }

    pub fn find_by_resource(&self, resource: &str) -> Option<&UnitDescription> {
        find_unit_by_resource(&self.units, resource)
    }

    /// Case-insensitive label prefix search in catalog order.
    pub fn search_prefix(&self, query: &str) -> Vec<UnitDescription> {
        filter_units(query, &self.units)
    }
}

/// Returns the first unit whose label equals `label` exactly.
pub fn find_unit_by_label<'a>(
    units: &'a [UnitDescription],
    label: &str,
) -> Option<&'a UnitDescription> {
    units.iter().find(|unit| unit.label() == label)
}

/// Returns the first unit identified by `resource`.
pub fn find_unit_by_resource<'a>(
    units: &'a [UnitDescription],
    resource: &str,
) -> Option<&'a UnitDescription> {
    units.iter().find(|unit| unit.is(resource))
}

#[cfg(test)]
mod tests {
    use super::{
        find_unit_by_label, CatalogSourceError, StaticUnitSource, UnitCatalog, UnitCatalogSource,
    };
    use crate::model::unit::UnitDescription;

    struct OfflineSource;

    impl UnitCatalogSource for OfflineSource {
        fn load_units(&self) -> Result<Vec<UnitDescription>, CatalogSourceError> {
            Err(CatalogSourceError::Unavailable("backend offline".to_string()))
        }
    }

    fn unit(resource: &str, label: &str) -> UnitDescription {
        UnitDescription::new(resource, label).expect("valid unit")
    }

    #[test]
    fn failing_source_yields_empty_catalog() {
        let catalog = UnitCatalog::load(&OfflineSource);
        assert!(catalog.is_empty());
        assert!(catalog.search_prefix("").is_empty());
        assert!(catalog.find_by_label("second").is_none());
    }

    #[test]
    fn load_preserves_source_order() {
        let source =
            StaticUnitSource::new(vec![unit("u:sec", "second"), unit("u:ms", "millisecond")]);
        let catalog = UnitCatalog::load(&source);
        let labels: Vec<&str> = catalog.units().iter().map(|u| u.label()).collect();
        assert_eq!(labels, vec!["second", "millisecond"]);
    }

    #[test]
    fn label_lookup_is_exact_and_case_sensitive() {
        let units = vec![unit("u:sec", "second")];
        assert!(find_unit_by_label(&units, "second").is_some());
        assert!(find_unit_by_label(&units, "Second").is_none());
        assert!(find_unit_by_label(&units, "sec").is_none());
    }

    #[test]
    fn clones_share_storage() {
        let catalog = UnitCatalog::from_units(vec![unit("u:sec", "second")]);
        let clone = catalog.clone();
        assert!(std::ptr::eq(catalog.units(), clone.units()));
        assert_eq!(
            clone.find_by_resource("u:sec").map(|u| u.label()),
            Some("second")
        );
    }
}
