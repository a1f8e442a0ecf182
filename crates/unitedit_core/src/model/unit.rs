//! Measurement unit value model.
//!
//! # Responsibility
//! - Define the immutable `UnitDescription` value shared by catalog, resolver
//!   and controller.
//! - Validate unit identity and label on construction and deserialization.
//!
//! # Invariants
//! - `resource` is a URI-like identifier (`scheme:rest`, no whitespace).
//! - `label` is never blank.
//! - A `UnitDescription` is never mutated after construction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static UNIT_RESOURCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:\S+$").expect("valid unit resource regex")
});

/// Globally unique unit identifier, e.g. `http://qudt.org/vocab/unit#Second`.
///
/// Kept as a type alias so property fields can carry ids without a catalog.
pub type UnitId = String;

/// Validation errors for unit values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitValidationError {
    /// Resource does not look like `scheme:rest`.
    InvalidResource(String),
    /// Label is empty or whitespace only.
    BlankLabel { resource: String },
}

impl Display for UnitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidResource(value) => {
                write!(f, "unit resource must be a URI-like id, got `{value}`")
            }
            Self::BlankLabel { resource } => {
                write!(f, "unit label must not be blank (resource `{resource}`)")
            }
        }
    }
}

impl Error for UnitValidationError {}

/// One known measurement unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawUnitDescription")]
pub struct UnitDescription {
    resource: UnitId,
    label: String,
}

impl UnitDescription {
    /// Creates a validated unit value.
    ///
    /// # Errors
    /// - `InvalidResource` when `resource` is not URI-like.
    /// - `BlankLabel` when `label` is empty after trimming.
    pub fn new(
        resource: impl Into<UnitId>,
        label: impl Into<String>,
    ) -> Result<Self, UnitValidationError> {
        let unit = Self {
            resource: resource.into(),
            label: label.into(),
        };
        unit.validate()?;
        Ok(unit)
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns whether `resource` identifies this unit.
    pub fn is(&self, resource: &str) -> bool {
        self.resource == resource
    }

    fn validate(&self) -> Result<(), UnitValidationError> {
        if !is_valid_unit_resource(&self.resource) {
            return Err(UnitValidationError::InvalidResource(self.resource.clone()));
        }
        if self.label.trim().is_empty() {
            return Err(UnitValidationError::BlankLabel {
                resource: self.resource.clone(),
            });
        }
        Ok(())
    }
}

impl Display for UnitDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.label, self.resource)
    }
}

/// Returns whether `value` is an acceptable unit resource id.
pub fn is_valid_unit_resource(value: &str) -> bool {
    UNIT_RESOURCE_RE.is_match(value)
}

#[derive(Deserialize)]
struct RawUnitDescription {
    resource: UnitId,
    label: String,
}

impl TryFrom<RawUnitDescription> for UnitDescription {
    type Error = UnitValidationError;

    fn try_from(value: RawUnitDescription) -> Result<Self, Self::Error> {
        Self::new(value.resource, value.label)
    }
}
