#![allow(dead_code)]

use std::cell::RefCell;
use unitedit_core::{
    CompatibilityTable, ResolutionReply, ResolverError, UnitCatalog, UnitCompatibilityResolver,
    UnitDescription,
};

pub fn unit(resource: &str, label: &str) -> UnitDescription {
    UnitDescription::new(resource, label).unwrap()
}

pub fn second() -> UnitDescription {
    unit("u:sec", "second")
}

pub fn minute() -> UnitDescription {
    unit("u:min", "minute")
}

pub fn hour() -> UnitDescription {
    unit("u:h", "hour")
}

pub fn millisecond() -> UnitDescription {
    unit("u:ms", "millisecond")
}

pub fn microsecond() -> UnitDescription {
    unit("u:us", "microsecond")
}

pub fn time_catalog() -> UnitCatalog {
    UnitCatalog::from_units(vec![
        second(),
        minute(),
        hour(),
        millisecond(),
        microsecond(),
    ])
}

/// `u:sec -> [ms, us]`, `u:min -> [sec, ms]`, everything else empty.
pub fn time_table() -> CompatibilityTable {
    CompatibilityTable::new()
        .with_targets("u:sec", vec![millisecond(), microsecond()])
        .with_targets("u:min", vec![second(), millisecond()])
}

/// Resolver that parks replies until the test delivers them.
#[derive(Default)]
pub struct DeferredResolver {
    pending: RefCell<Vec<(UnitDescription, ResolutionReply)>>,
    calls: RefCell<usize>,
}

impl DeferredResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Removes the oldest parked reply issued for `resource`.
    pub fn take(&self, resource: &str) -> ResolutionReply {
        let mut pending = self.pending.borrow_mut();
        let index = pending
            .iter()
            .position(|(source, _)| source.is(resource))
            .unwrap_or_else(|| panic!("no pending request for {resource}"));
        pending.remove(index).1
    }

    pub fn take_oldest(&self) -> Option<(UnitDescription, ResolutionReply)> {
        let mut pending = self.pending.borrow_mut();
        if pending.is_empty() {
            None
        } else {
            Some(pending.remove(0))
        }
    }

    pub fn take_newest(&self) -> Option<(UnitDescription, ResolutionReply)> {
        self.pending.borrow_mut().pop()
    }

    pub fn fail(&self, resource: &str) {
        self.take(resource)
            .fail(ResolverError::Unavailable("backend offline".to_string()));
    }
}

impl UnitCompatibilityResolver for DeferredResolver {
    fn resolve_compatible(&self, source: &UnitDescription, reply: ResolutionReply) {
        *self.calls.borrow_mut() += 1;
        self.pending.borrow_mut().push((source.clone(), reply));
    }
}
