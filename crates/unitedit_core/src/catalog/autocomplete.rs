//! Free-text unit autocomplete.
//!
//! # Responsibility
//! - Narrow the catalog to units whose label starts with the typed query.
//! - Keep the suggestion list as derived state of the query and notify
//!   subscribers on every recomputation.
//!
//! # Invariants
//! - Matching is a case-insensitive label prefix test, never substring/fuzzy.
//! - An empty query yields the full catalog in catalog order.
//! - Suggestions are recomputed synchronously on every query change, so they
//!   are never stale relative to the query.

use crate::catalog::unit_catalog::UnitCatalog;
use crate::model::unit::UnitDescription;

/// Returns the units whose lower-cased label starts with the lower-cased
/// `query`, preserving input order.
pub fn filter_units(query: &str, units: &[UnitDescription]) -> Vec<UnitDescription> {
    if query.is_empty() {
        return units.to_vec();
    }

    let needle = query.to_lowercase();
    units
        .iter()
        .filter(|unit| unit.label().to_lowercase().starts_with(&needle))
        .cloned()
        .collect()
}

/// Handle returned by [`UnitAutocomplete::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type SuggestionListener = Box<dyn FnMut(&str, &[UnitDescription])>;

/// Query input plus its derived suggestion list.
pub struct UnitAutocomplete {
    catalog: UnitCatalog,
    query: String,
    limit: Option<usize>,
    suggestions: Vec<UnitDescription>,
    listeners: Vec<(SubscriptionId, SuggestionListener)>,
    next_subscription: u64,
}

impl UnitAutocomplete {
    /// Creates an autocomplete primed with an empty query.
    ///
    /// `limit` caps the number of suggestions; `None` keeps all matches.
    pub fn new(catalog: UnitCatalog, limit: Option<usize>) -> Self {
        let mut autocomplete = Self {
            catalog,
            query: String::new(),
            limit,
            suggestions: Vec::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        };
        autocomplete.recompute();
        autocomplete
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[UnitDescription] {
        &self.suggestions
    }

    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    /// Replaces the query text and recomputes suggestions.
    pub fn set_query(&mut self, query: impl Into<String>) -> &[UnitDescription] {
        self.query = query.into();
        self.recompute();
        &self.suggestions
    }

    /// Registers a listener that receives `(query, suggestions)`.
    ///
    /// The listener is invoked immediately with the current state and then
    /// after every recomputation.
    pub fn subscribe(
        &mut self,
        mut listener: impl FnMut(&str, &[UnitDescription]) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        listener(&self.query, &self.suggestions);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` when `id` is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn recompute(&mut self) {
        let mut suggestions = filter_units(&self.query, self.catalog.units());
        if let Some(limit) = self.limit {
            suggestions.truncate(limit);
        }
        self.suggestions = suggestions;

        for (_, listener) in &mut self.listeners {
            listener(&self.query, &self.suggestions);
        }
    }
}

impl std::fmt::Debug for UnitAutocomplete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitAutocomplete")
            .field("query", &self.query)
            .field("limit", &self.limit)
            .field("suggestions", &self.suggestions.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
