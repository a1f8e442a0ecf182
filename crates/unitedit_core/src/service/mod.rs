//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate catalog lookups and resolver calls into editor commands.
//! - Keep UI layers decoupled from resolver transport and storage details.

pub mod unit_controller;
