//! Core logic for unit-aware event property editing.
//! Owns the unit catalog, autocomplete and per-property transformation state.

pub mod catalog;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod resolver;
pub mod service;

pub use catalog::autocomplete::{filter_units, SubscriptionId, UnitAutocomplete};
pub use catalog::unit_catalog::{
    find_unit_by_label, find_unit_by_resource, CatalogSourceError, StaticUnitSource, UnitCatalog,
    UnitCatalogSource,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::property::{EventPropertyPrimitive, PropertyId, DEFAULT_PROPERTY_LABEL};
pub use model::unit::{UnitDescription, UnitId, UnitValidationError};
pub use repo::{RepoError, RepoResult, SqliteUnitRepository, UnitRepository};
pub use resolver::{
    CompatibilityTable, ResolutionReply, ResolutionResponse, ResolutionTicket, ResolverError,
    UnitCompatibilityResolver,
};
pub use service::unit_controller::{
    EditorOptions, PickOutcome, PropertyUnitController, ResolutionOutcome, SelectOutcome,
    ToggleOutcome, UnitEditState, UnitEditView,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
