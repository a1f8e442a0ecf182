//! Primitive event property model (unit-relevant projection).
//!
//! # Responsibility
//! - Carry the fields of a schema property that unit editing reads/writes.
//! - Derive the display label used by property editors.
//!
//! # Invariants
//! - `element_id` is stable for the lifetime of the property.
//! - `old_measurement_unit` is only written by the unit controller.

use crate::model::unit::UnitId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one event property.
pub type PropertyId = Uuid;

/// Label shown when a property has neither label nor runtime name.
pub const DEFAULT_PROPERTY_LABEL: &str = "Property";

/// Primitive event property as seen by the unit editor.
///
/// Field names follow the external schema (`runTimeName`, `measurementUnit`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPropertyPrimitive {
    pub element_id: PropertyId,
    /// Human-readable label set by the schema author.
    pub label: Option<String>,
    /// Field name in the event payload.
    #[serde(rename = "runTimeName")]
    pub runtime_name: Option<String>,
    /// Position of the property in its parent list.
    pub property_number: Option<u32>,
    /// Live unit, possibly the target of a transformation.
    pub measurement_unit: Option<UnitId>,
    /// Native unit recorded when the first transformation was committed.
    pub old_measurement_unit: Option<UnitId>,
}

impl EventPropertyPrimitive {
    /// Creates a property with a generated stable ID and no unit.
    pub fn new(runtime_name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), runtime_name)
    }

    /// Creates a property with a caller-provided ID.
    pub fn with_id(element_id: PropertyId, runtime_name: impl Into<String>) -> Self {
        Self {
            element_id,
            label: None,
            runtime_name: Some(runtime_name.into()),
            property_number: None,
            measurement_unit: None,
            old_measurement_unit: None,
        }
    }

    /// Builder-style unit assignment, used when loading persisted schemas.
    pub fn with_measurement_unit(mut self, unit: impl Into<UnitId>) -> Self {
        self.measurement_unit = Some(unit.into());
        self
    }

    /// Builder-style label assignment.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns `label`, else `runtime_name`, else `fallback`.
    ///
    /// Presence decides, not content: an empty label still wins over the
    /// runtime name.
    pub fn display_label<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.label
            .as_deref()
            .or(self.runtime_name.as_deref())
            .unwrap_or(fallback)
    }

    pub fn has_measurement_unit(&self) -> bool {
        self.measurement_unit.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{EventPropertyPrimitive, DEFAULT_PROPERTY_LABEL};

    #[test]
    fn display_label_prefers_label_then_runtime_name() {
        let mut property = EventPropertyPrimitive::new("temp");
        assert_eq!(property.display_label(DEFAULT_PROPERTY_LABEL), "temp");

        property.label = Some("Temperature".to_string());
        assert_eq!(property.display_label(DEFAULT_PROPERTY_LABEL), "Temperature");

        property.label = None;
        property.runtime_name = None;
        assert_eq!(property.display_label(DEFAULT_PROPERTY_LABEL), "Property");
    }

    #[test]
    fn empty_label_is_still_a_label() {
        let property = EventPropertyPrimitive::new("temp").with_label("");
        assert_eq!(property.display_label(DEFAULT_PROPERTY_LABEL), "");
    }
}
