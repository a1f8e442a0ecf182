mod common;

use common::{hour, time_catalog, time_table, unit, DeferredResolver};
use std::rc::Rc;
use unitedit_core::{
    CompatibilityTable, EventPropertyPrimitive, PropertyUnitController, SelectOutcome,
    UnitEditState,
};

#[derive(Debug, Clone, Copy)]
enum Command {
    Select(&'static str),
    Toggle,
    PickFirst,
    PickLast,
    PickForeign,
    Disable,
    DeliverOldest,
    DeliverNewest,
}

const COMMANDS: &[Command] = &[
    Command::Select("second"),
    Command::Select("minute"),
    Command::Select("hour"),
    Command::Select("fortnight"),
    Command::Toggle,
    Command::PickFirst,
    Command::PickLast,
    Command::PickForeign,
    Command::Disable,
    Command::DeliverOldest,
    Command::DeliverNewest,
];

struct Harness {
    controller: PropertyUnitController<Rc<DeferredResolver>>,
    resolver: Rc<DeferredResolver>,
    table: CompatibilityTable,
    latest_source: Option<String>,
    ever_committed: bool,
    trace: Vec<Command>,
}

impl Harness {
    fn new(property: EventPropertyPrimitive) -> Self {
        let resolver = Rc::new(DeferredResolver::new());
        let controller =
            PropertyUnitController::new(property, time_catalog(), Rc::clone(&resolver));
        Self {
            controller,
            resolver,
            table: time_table(),
            latest_source: None,
            ever_committed: false,
            trace: Vec::new(),
        }
    }

    fn run(&mut self, command: Command) {
        self.trace.push(command);
        let mut disabled = false;
        match command {
            Command::Select(label) => {
                if let SelectOutcome::Requested(_) = self.controller.select_source_unit(label) {
                    self.record_request(label);
                }
            }
            Command::Toggle => {
                let query = self.controller.query().to_string();
                match self.controller.toggle_transformation() {
                    unitedit_core::ToggleOutcome::Disabled => disabled = true,
                    unitedit_core::ToggleOutcome::Select(SelectOutcome::Requested(_)) => {
                        self.record_request(&query)
                    }
                    unitedit_core::ToggleOutcome::Select(SelectOutcome::NoMatch) => {}
                }
            }
            Command::PickFirst => {
                if let Some(first) = self.controller.candidates().first().cloned() {
                    self.controller.pick_candidate(&first);
                }
            }
            Command::PickLast => {
                if let Some(last) = self.controller.candidates().last().cloned() {
                    self.controller.pick_candidate(&last);
                }
            }
            Command::PickForeign => {
                let before = self.controller.property().clone();
                self.controller.pick_candidate(&unit("u:parsec", "parsec"));
                assert_eq!(self.controller.property(), &before, "{:?}", self.trace);
            }
            Command::Disable => disabled = self.controller.disable_transformation(),
            Command::DeliverOldest => {
                if let Some((source, reply)) = self.resolver.take_oldest() {
                    reply.deliver(self.table.targets_for(source.resource()).to_vec());
                }
                self.controller.poll_resolutions();
            }
            Command::DeliverNewest => {
                if let Some((source, reply)) = self.resolver.take_newest() {
                    reply.deliver(self.table.targets_for(source.resource()).to_vec());
                }
                self.controller.poll_resolutions();
            }
        }

        if self.controller.is_enabled() {
            self.ever_committed = true;
        }
        if disabled {
            assert_eq!(
                self.controller.property().measurement_unit,
                None,
                "disable must clear the live unit: {:?}",
                self.trace
            );
            assert_eq!(self.controller.state(), UnitEditState::Idle);
        }
        self.check();
    }

    fn record_request(&mut self, label: &str) {
        let source = time_catalog()
            .find_by_label(label)
            .map(|unit| unit.resource().to_string());
        self.latest_source = source;
    }

    fn check(&self) {
        let property = self.controller.property();
        assert_eq!(
            property.old_measurement_unit.is_some(),
            self.ever_committed,
            "old unit must be set exactly after the first commit: {:?}",
            self.trace
        );

        if self.controller.is_enabled() {
            let selected = self
                .controller
                .selected()
                .unwrap_or_else(|| panic!("enabled without selection: {:?}", self.trace));
            assert_eq!(
                property.measurement_unit.as_deref(),
                Some(selected.resource()),
                "live unit must follow the selection: {:?}",
                self.trace
            );
            assert!(self.controller.candidates().contains(selected));

            let source = self
                .latest_source
                .as_deref()
                .unwrap_or_else(|| panic!("enabled without request: {:?}", self.trace));
            assert_eq!(
                self.controller.candidates(),
                self.table.targets_for(source),
                "candidates must come from the latest request: {:?}",
                self.trace
            );
            assert_eq!(self.controller.state(), UnitEditState::Transformed);
        } else {
            assert_ne!(self.controller.state(), UnitEditState::Transformed);
        }

        if self.controller.pending_ticket().is_some() {
            assert_eq!(self.controller.state(), UnitEditState::Resolving);
        }
    }
}

fn sequences(depth: usize) -> Vec<Vec<Command>> {
    let mut all = vec![Vec::new()];
    for _ in 0..depth {
        all = all
            .into_iter()
            .flat_map(|prefix| {
                COMMANDS.iter().map(move |command| {
                    let mut next = prefix.clone();
                    next.push(*command);
                    next
                })
            })
            .collect();
    }
    all
}

fn run_all(make_property: impl Fn() -> EventPropertyPrimitive) {
    for sequence in sequences(4) {
        let mut harness = Harness::new(make_property());
        for command in sequence {
            harness.run(command);
        }
        while harness.resolver.pending_count() > 0 {
            harness.run(Command::DeliverOldest);
        }
    }
}

#[test]
fn invariants_hold_for_every_short_command_sequence() {
    run_all(|| EventPropertyPrimitive::new("duration"));
}

#[test]
fn invariants_hold_after_migrating_a_persisted_unit() {
    run_all(|| EventPropertyPrimitive::new("duration").with_measurement_unit(hour().resource()));
}

#[test]
fn migrated_anchor_is_recorded_on_first_commit() {
    let mut harness = Harness::new(
        EventPropertyPrimitive::new("duration").with_measurement_unit(hour().resource()),
    );
    harness.run(Command::Select("minute"));
    harness.run(Command::Select("second"));
    harness.run(Command::DeliverOldest);
    harness.run(Command::DeliverOldest);

    let property = harness.controller.property();
    assert_eq!(property.old_measurement_unit.as_deref(), Some("u:h"));
    assert_eq!(property.measurement_unit.as_deref(), Some("u:ms"));
}
