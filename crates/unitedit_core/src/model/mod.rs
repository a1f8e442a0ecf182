//! Domain model for unit-aware schema editing.
//!
//! # Responsibility
//! - Define the unit value shared by catalog, resolver and controller.
//! - Define the event property projection mutated by the controller.
//!
//! # Invariants
//! - Unit values are validated on construction and never mutated.
//! - Properties are identified by a stable `PropertyId`.

pub mod property;
pub mod unit;
