//! Unit compatibility resolver contract.
//!
//! # Responsibility
//! - Define the narrow contract of the backend service that lists units a
//!   source unit can be transformed into.
//! - Carry replies back to the requesting controller through a single-use
//!   [`ResolutionReply`], so delivery may happen at any later point and in
//!   any order relative to other requests.
//!
//! # Invariants
//! - Every request is tagged with a [`ResolutionTicket`] and its source unit.
//! - A reply is delivered at most once (`deliver`/`fail` consume it).
//! - Replies whose controller is gone are dropped silently.

use crate::model::unit::{UnitDescription, UnitId};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::sync::mpsc::Sender;

/// Monotonic per-controller request token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResolutionTicket(u64);

impl ResolutionTicket {
    pub(crate) fn first() -> Self {
        Self(1)
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl Display for ResolutionTicket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resolver-side failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// Service could not be reached.
    Unavailable(String),
    /// Service answered with something that is not a unit list.
    InvalidResponse(String),
}

impl Display for ResolverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "unit resolver unavailable: {message}"),
            Self::InvalidResponse(message) => {
                write!(f, "unit resolver returned invalid response: {message}")
            }
        }
    }
}

impl Error for ResolverError {}

/// Completed resolution as observed by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResponse {
    pub ticket: ResolutionTicket,
    /// Resource of the unit the request was issued for.
    pub source: UnitId,
    pub result: Result<Vec<UnitDescription>, ResolverError>,
}

/// Single-use channel back to the controller that issued a request.
#[derive(Debug)]
pub struct ResolutionReply {
    ticket: ResolutionTicket,
    source: UnitId,
    sender: Sender<ResolutionResponse>,
}

impl ResolutionReply {
    pub(crate) fn new(
        ticket: ResolutionTicket,
        source: UnitId,
        sender: Sender<ResolutionResponse>,
    ) -> Self {
        Self {
            ticket,
            source,
            sender,
        }
    }

    pub fn ticket(&self) -> ResolutionTicket {
        self.ticket
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Delivers the compatible units (possibly none).
    pub fn deliver(self, units: Vec<UnitDescription>) {
        self.send(Ok(units));
    }

    /// Reports a resolver failure.
    pub fn fail(self, error: ResolverError) {
        self.send(Err(error));
    }

    fn send(self, result: Result<Vec<UnitDescription>, ResolverError>) {
        let response = ResolutionResponse {
            ticket: self.ticket,
            source: self.source,
            result,
        };
        // Receiver is gone when the editor was torn down first.
        let _ = self.sender.send(response);
    }
}

/// Backend service listing units a source unit can be transformed into.
///
/// Implementations answer through `reply`, either before returning or later.
pub trait UnitCompatibilityResolver {
    fn resolve_compatible(&self, source: &UnitDescription, reply: ResolutionReply);
}

impl<T: UnitCompatibilityResolver + ?Sized> UnitCompatibilityResolver for &T {
    fn resolve_compatible(&self, source: &UnitDescription, reply: ResolutionReply) {
        (**self).resolve_compatible(source, reply);
    }
}

impl<T: UnitCompatibilityResolver + ?Sized> UnitCompatibilityResolver for Rc<T> {
    fn resolve_compatible(&self, source: &UnitDescription, reply: ResolutionReply) {
        (**self).resolve_compatible(source, reply);
    }
}

impl<T: UnitCompatibilityResolver + ?Sized> UnitCompatibilityResolver for Box<T> {
    fn resolve_compatible(&self, source: &UnitDescription, reply: ResolutionReply) {
        (**self).resolve_compatible(source, reply);
    }
}

/// Resolver answering immediately from a fixed compatibility table.
///
/// Unknown source units resolve to an empty list.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityTable {
    targets: HashMap<UnitId, Vec<UnitDescription>>,
}

impl CompatibilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the targets for `source`, replacing earlier entries.
    pub fn with_targets(
        mut self,
        source: impl Into<UnitId>,
        targets: Vec<UnitDescription>,
    ) -> Self {
        self.targets.insert(source.into(), targets);
        self
    }

    pub fn targets_for(&self, source: &str) -> &[UnitDescription] {
        self.targets.get(source).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl UnitCompatibilityResolver for CompatibilityTable {
    fn resolve_compatible(&self, source: &UnitDescription, reply: ResolutionReply) {
        reply.deliver(self.targets_for(source.resource()).to_vec());
    }
}
