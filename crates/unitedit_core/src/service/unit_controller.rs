//! Unit transformation controller for one primitive event property.
//!
//! # Responsibility
//! - Own the property's transformation session and its state machine
//!   (`Idle`, `Assigned`, `Resolving`, `Transformed`).
//! - Issue compatibility lookups and correlate late replies by ticket.
//! - Keep `measurement_unit` / `old_measurement_unit` consistent with the
//!   session.
//!
//! # Invariants
//! - `old_measurement_unit` is set iff a transformation was committed by this
//!   controller; it is written once, on the first commit.
//! - While transformation is enabled, `measurement_unit` equals the selected
//!   candidate's resource.
//! - Disabling transformation clears `measurement_unit` and keeps
//!   `old_measurement_unit`.
//! - Candidates are only replaced by the reply carrying the latest ticket and
//!   the source unit it was issued for.
//! - No command returns an error; failures leave state unchanged and are
//!   reported through outcome values and logs.

use crate::catalog::autocomplete::{SubscriptionId, UnitAutocomplete};
use crate::catalog::unit_catalog::UnitCatalog;
use crate::model::property::{EventPropertyPrimitive, DEFAULT_PROPERTY_LABEL};
use crate::model::unit::{UnitDescription, UnitId};
use crate::resolver::{
    ResolutionReply, ResolutionResponse, ResolutionTicket, UnitCompatibilityResolver,
};
use log::{debug, warn};
use serde::Serialize;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Per-editor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    /// Label shown when the property has neither label nor runtime name.
    pub fallback_label: String,
    /// Move a persisted unit into the display-only label on construction.
    pub migrate_existing_unit: bool,
    /// Maximum number of autocomplete suggestions; `None` keeps all.
    pub autocomplete_limit: Option<usize>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            fallback_label: DEFAULT_PROPERTY_LABEL.to_string(),
            migrate_existing_unit: true,
            autocomplete_limit: None,
        }
    }
}

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitEditState {
    /// No unit assigned.
    Idle,
    /// A unit is known but no transformation is active.
    Assigned,
    /// A compatibility lookup is in flight.
    Resolving,
    /// A resolved target unit is live on the property.
    Transformed,
}

/// Result of a source unit selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// A lookup was issued under this ticket.
    Requested(ResolutionTicket),
    /// Text matches no catalog label; nothing changed.
    NoMatch,
}

/// Result of [`PropertyUnitController::toggle_transformation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Disabled,
    Select(SelectOutcome),
}

/// Result of applying one resolver reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Transformation entered with this many candidates.
    Applied { candidates: usize },
    /// No compatible units; transformation not offered.
    Empty,
    /// Resolver reported an error; handled like `Empty`.
    Failed,
    /// Reply belongs to an abandoned request and was dropped.
    Stale,
}

/// Result of picking a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    Committed,
    /// Unit is not among the current candidates.
    NotACandidate,
    /// Transformation is not enabled.
    Inactive,
}

/// Serializable snapshot for UI binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitEditView {
    pub state: UnitEditState,
    pub enabled: bool,
    pub candidates: Vec<UnitDescription>,
    pub selected: Option<UnitDescription>,
    pub display_label: String,
    pub query: String,
    pub suggestions: Vec<UnitDescription>,
    pub previous_unit_label: Option<String>,
}

#[derive(Debug, Clone)]
struct PendingResolution {
    ticket: ResolutionTicket,
    source: UnitDescription,
}

#[derive(Debug, Clone, Default)]
struct TransformationSession {
    enabled: bool,
    candidates: Vec<UnitDescription>,
    selected: Option<UnitDescription>,
    restore_anchor: Option<UnitId>,
    /// Source unit behind the current candidate list.
    resolved_source: Option<UnitId>,
    committed: bool,
    pending: Option<PendingResolution>,
}

/// State machine behind one property's unit editor.
///
/// The controller exclusively owns its property until
/// [`into_property`](Self::into_property) hands it back. Resolver replies are
/// queued and applied by [`poll_resolutions`](Self::poll_resolutions); every
/// command polls once after it runs, so synchronous resolvers take effect
/// immediately.
pub struct PropertyUnitController<R: UnitCompatibilityResolver> {
    property: EventPropertyPrimitive,
    resolver: R,
    options: EditorOptions,
    autocomplete: UnitAutocomplete,
    state: UnitEditState,
    native_unit: Option<UnitId>,
    previous_unit_label: Option<String>,
    session: Option<TransformationSession>,
    next_ticket: ResolutionTicket,
    reply_sender: Sender<ResolutionResponse>,
    replies: Receiver<ResolutionResponse>,
}

impl<R: UnitCompatibilityResolver> PropertyUnitController<R> {
    /// Creates a controller with default options.
    pub fn new(property: EventPropertyPrimitive, catalog: UnitCatalog, resolver: R) -> Self {
        Self::with_options(property, catalog, resolver, EditorOptions::default())
    }

    /// Creates a controller and runs the load-time unit migration.
    ///
    /// # Contract
    /// - A property carrying `measurement_unit` is moved to `Assigned`: the
    ///   unit is cleared from the property, its catalog label becomes the
    ///   previous-unit label and primes the autocomplete query, and
    ///   `old_measurement_unit` is blanked.
    /// - Otherwise the controller starts `Idle`. With migration turned off, a
    ///   unit the property already carries stays live and becomes the restore
    ///   anchor of the first transformation.
    pub fn with_options(
        property: EventPropertyPrimitive,
        catalog: UnitCatalog,
        resolver: R,
        options: EditorOptions,
    ) -> Self {
        let (reply_sender, replies) = channel();
        let autocomplete = UnitAutocomplete::new(catalog, options.autocomplete_limit);
        let mut controller = Self {
            property,
            resolver,
            options,
            autocomplete,
            state: UnitEditState::Idle,
            native_unit: None,
            previous_unit_label: None,
            session: None,
            next_ticket: ResolutionTicket::first(),
            reply_sender,
            replies,
        };
        if controller.options.migrate_existing_unit {
            controller.migrate_existing_unit();
        } else {
            controller.native_unit = controller.property.measurement_unit.clone();
        }
        controller
    }

    fn migrate_existing_unit(&mut self) {
        let Some(existing) = self.property.measurement_unit.take() else {
            return;
        };
        self.property.old_measurement_unit = None;

        let label = self
            .autocomplete
            .catalog()
            .find_by_resource(&existing)
            .map(|unit| unit.label().to_string());
        match &label {
            Some(label) => {
                self.autocomplete.set_query(label.as_str());
            }
            None => warn!(
                "event=unit_migrate module=controller status=error property={} unit={} error_code=unknown_unit",
                self.property.element_id, existing
            ),
        }
        debug!(
            "event=unit_migrate module=controller status=ok property={} unit={}",
            self.property.element_id, existing
        );

        self.previous_unit_label = label;
        self.native_unit = Some(existing);
        self.state = UnitEditState::Assigned;
    }

    /// Updates the free-text unit input and returns the new suggestions.
    pub fn set_query(&mut self, text: impl Into<String>) -> &[UnitDescription] {
        self.autocomplete.set_query(text)
    }

    /// Subscribes to `(query, suggestions)` updates of the unit input.
    pub fn subscribe_suggestions(
        &mut self,
        listener: impl FnMut(&str, &[UnitDescription]) + 'static,
    ) -> SubscriptionId {
        self.autocomplete.subscribe(listener)
    }

    pub fn unsubscribe_suggestions(&mut self, id: SubscriptionId) -> bool {
        self.autocomplete.unsubscribe(id)
    }

    /// Selects the unit whose label is `label` and requests its compatible
    /// target units.
    ///
    /// # Contract
    /// - The unit input takes `label` as its text.
    /// - Unknown labels return `NoMatch` without touching the session.
    /// - An active transformation is disabled first.
    /// - The session starts with the migrated native unit as restore anchor.
    ///   Without one, the anchor becomes the source unit of the first
    ///   resolution that commits, so abandoned selections never leak into
    ///   `old_measurement_unit`.
    /// - Any earlier in-flight request becomes stale.
    /// - Re-resolving the source unit of the current candidates keeps the
    ///   previously selected candidate if the new list still contains it;
    ///   otherwise the first candidate is selected.
    pub fn select_source_unit(&mut self, label: &str) -> SelectOutcome {
        self.autocomplete.set_query(label);
        let Some(source) = self.autocomplete.catalog().find_by_label(label).cloned() else {
            debug!(
                "event=unit_select module=controller status=skip property={} reason=no_match",
                self.property.element_id
            );
            return SelectOutcome::NoMatch;
        };

        if self.is_enabled() {
            self.disable_transformation();
        }

        let ticket = self.next_ticket;
        self.next_ticket = ticket.next();

        let native_unit = &self.native_unit;
        let session = self.session.get_or_insert_with(|| TransformationSession {
            restore_anchor: native_unit.clone(),
            ..TransformationSession::default()
        });
        if let Some(abandoned) = session.pending.replace(PendingResolution {
            ticket,
            source: source.clone(),
        }) {
            debug!(
                "event=unit_resolve module=controller status=superseded property={} ticket={} by={}",
                self.property.element_id, abandoned.ticket, ticket
            );
        }
        self.state = UnitEditState::Resolving;

        debug!(
            "event=unit_resolve module=controller status=start property={} ticket={} source={}",
            self.property.element_id,
            ticket,
            source.resource()
        );
        let reply = ResolutionReply::new(
            ticket,
            source.resource().to_string(),
            self.reply_sender.clone(),
        );
        self.resolver.resolve_compatible(&source, reply);
        self.poll_resolutions();

        SelectOutcome::Requested(ticket)
    }

    /// Disables an active transformation, or selects the unit named by the
    /// current query text.
    pub fn toggle_transformation(&mut self) -> ToggleOutcome {
        if self.disable_transformation() {
            return ToggleOutcome::Disabled;
        }
        let query = self.autocomplete.query().to_string();
        ToggleOutcome::Select(self.select_source_unit(&query))
    }

    /// Leaves transformed mode, clearing the live unit.
    ///
    /// The historical `old_measurement_unit` is kept. Returns `false` when
    /// transformation was not enabled.
    pub fn disable_transformation(&mut self) -> bool {
        let Some(session) = self.session.as_mut().filter(|session| session.enabled) else {
            return false;
        };
        session.enabled = false;
        self.property.measurement_unit = None;
        self.state = UnitEditState::Idle;
        debug!(
            "event=unit_transform module=controller status=disabled property={}",
            self.property.element_id
        );
        true
    }

    /// Makes `unit` the live target unit.
    pub fn pick_candidate(&mut self, unit: &UnitDescription) -> PickOutcome {
        let Some(session) = self.session.as_mut().filter(|session| session.enabled) else {
            return PickOutcome::Inactive;
        };
        let Some(candidate) = session
            .candidates
            .iter()
            .find(|candidate| candidate.is(unit.resource()))
            .cloned()
        else {
            return PickOutcome::NotACandidate;
        };

        commit_unit(&mut self.property, session, &candidate);
        session.selected = Some(candidate);
        PickOutcome::Committed
    }

    /// Applies every queued resolver reply. Returns how many were handled.
    pub fn poll_resolutions(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(response) = self.replies.try_recv() {
            self.apply_resolution(response);
            handled += 1;
        }
        handled
    }

    /// Applies one resolver reply.
    ///
    /// Replies for anything but the latest in-flight ticket and its source
    /// unit are dropped as `Stale`.
    pub fn apply_resolution(&mut self, response: ResolutionResponse) -> ResolutionOutcome {
        let element_id = self.property.element_id;
        let Some(session) = self.session.as_mut() else {
            return ResolutionOutcome::Stale;
        };
        let is_current = session.pending.as_ref().is_some_and(|pending| {
            pending.ticket == response.ticket && pending.source.is(&response.source)
        });
        if !is_current {
            debug!(
                "event=unit_resolve module=controller status=skip property={} ticket={} reason=stale",
                element_id, response.ticket
            );
            return ResolutionOutcome::Stale;
        }
        let pending = session.pending.take();

        let units = match response.result {
            Ok(units) => units,
            Err(err) => {
                warn!(
                    "event=unit_resolve module=controller status=error property={} ticket={} error={}",
                    element_id, response.ticket, err
                );
                self.state = UnitEditState::Assigned;
                return ResolutionOutcome::Failed;
            }
        };
        let Some(first) = units.first().cloned() else {
            debug!(
                "event=unit_resolve module=controller status=skip property={} ticket={} reason=empty",
                element_id, response.ticket
            );
            self.state = UnitEditState::Assigned;
            return ResolutionOutcome::Empty;
        };

        let source = pending.map(|pending| pending.source.resource().to_string());
        if session.restore_anchor.is_none() {
            session.restore_anchor = source.clone();
        }
        // Re-resolving the same source keeps the user's pick when still offered.
        let kept = session
            .selected
            .as_ref()
            .filter(|_| session.resolved_source == source)
            .and_then(|previous| units.iter().find(|unit| unit.is(previous.resource())))
            .cloned();
        let selected = kept.unwrap_or(first);

        let candidates = units.len();
        session.candidates = units;
        session.resolved_source = source;
        session.enabled = true;
        commit_unit(&mut self.property, session, &selected);
        session.selected = Some(selected);
        self.state = UnitEditState::Transformed;
        debug!(
            "event=unit_resolve module=controller status=ok property={} ticket={} candidates={}",
            element_id, response.ticket, candidates
        );
        ResolutionOutcome::Applied { candidates }
    }

    /// Writes the list position into `property_number`.
    pub fn sync_property_number(&mut self, index: u32) {
        self.property.property_number = Some(index);
    }

    pub fn property(&self) -> &EventPropertyPrimitive {
        &self.property
    }

    /// Ends the editing session and returns the property.
    pub fn into_property(self) -> EventPropertyPrimitive {
        self.property
    }

    pub fn state(&self) -> UnitEditState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.session.as_ref().is_some_and(|session| session.enabled)
    }

    pub fn candidates(&self) -> &[UnitDescription] {
        self.session
            .as_ref()
            .map(|session| session.candidates.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected(&self) -> Option<&UnitDescription> {
        self.session.as_ref()?.selected.as_ref()
    }

    pub fn restore_anchor(&self) -> Option<&str> {
        self.session.as_ref()?.restore_anchor.as_deref()
    }

    /// Ticket of the in-flight lookup, if any.
    pub fn pending_ticket(&self) -> Option<ResolutionTicket> {
        Some(self.session.as_ref()?.pending.as_ref()?.ticket)
    }

    /// Property label, else runtime name, else the configured fallback.
    pub fn display_label(&self) -> &str {
        self.property.display_label(&self.options.fallback_label)
    }

    /// Catalog label of the unit migrated away on construction.
    pub fn previous_unit_label(&self) -> Option<&str> {
        self.previous_unit_label.as_deref()
    }

    pub fn query(&self) -> &str {
        self.autocomplete.query()
    }

    pub fn suggestions(&self) -> &[UnitDescription] {
        self.autocomplete.suggestions()
    }

    pub fn catalog(&self) -> &UnitCatalog {
        self.autocomplete.catalog()
    }

    pub fn view(&self) -> UnitEditView {
        UnitEditView {
            state: self.state,
            enabled: self.is_enabled(),
            candidates: self.candidates().to_vec(),
            selected: self.selected().cloned(),
            display_label: self.display_label().to_string(),
            query: self.query().to_string(),
            suggestions: self.suggestions().to_vec(),
            previous_unit_label: self.previous_unit_label.clone(),
        }
    }
}

fn commit_unit(
    property: &mut EventPropertyPrimitive,
    session: &mut TransformationSession,
    unit: &UnitDescription,
) {
    property.measurement_unit = Some(unit.resource().to_string());
    if !session.committed {
        property.old_measurement_unit = session.restore_anchor.clone();
        session.committed = true;
    }
}
