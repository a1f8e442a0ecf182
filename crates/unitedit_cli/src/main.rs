//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `unitedit_core` linkage with a scripted editing session.
//! - Keep output deterministic JSON for quick local sanity checks.
//!
//! Usage: `unitedit_cli [--db PATH] [--log-dir ABS_DIR]`. With `--db` the
//! catalog is read from (and seeded into) a SQLite file.

use log::info;
use std::process::ExitCode;
use unitedit_core::db::open_db;
use unitedit_core::{
    core_version, default_log_level, init_logging, CompatibilityTable, EventPropertyPrimitive,
    PropertyUnitController, SqliteUnitRepository, StaticUnitSource, UnitCatalog, UnitDescription,
    UnitRepository,
};

#[derive(Default)]
struct Args {
    db: Option<String>,
    log_dir: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut raw = std::env::args().skip(1);
    while let Some(flag) = raw.next() {
        let slot = match flag.as_str() {
            "--db" => &mut args.db,
            "--log-dir" => &mut args.log_dir,
            other => return Err(format!("unknown argument `{other}`")),
        };
        *slot = Some(raw.next().ok_or_else(|| format!("`{flag}` needs a value"))?);
    }
    Ok(args)
}

fn demo_units() -> Result<Vec<UnitDescription>, String> {
    [
        ("http://qudt.org/vocab/unit#SecondTime", "second"),
        ("http://qudt.org/vocab/unit#MinuteTime", "minute"),
        ("http://qudt.org/vocab/unit#MilliSecond", "millisecond"),
        ("http://qudt.org/vocab/unit#MicroSecond", "microsecond"),
    ]
    .into_iter()
    .map(|(resource, label)| UnitDescription::new(resource, label).map_err(|err| err.to_string()))
    .collect()
}

fn load_catalog(args: &Args, units: Vec<UnitDescription>) -> Result<UnitCatalog, String> {
    let Some(path) = &args.db else {
        return Ok(UnitCatalog::load(&StaticUnitSource::new(units)));
    };
    let conn = open_db(path).map_err(|err| err.to_string())?;
    let repo = SqliteUnitRepository::new(&conn);
    if repo.count_units().map_err(|err| err.to_string())? == 0 {
        repo.replace_all(&units).map_err(|err| err.to_string())?;
    }
    Ok(UnitCatalog::load(&repo))
}

fn run() -> Result<(), String> {
    let args = parse_args()?;
    if let Some(log_dir) = &args.log_dir {
        init_logging(default_log_level(), log_dir)?;
    }
    println!("unitedit_core version={}", core_version());

    let units = demo_units()?;
    let table = CompatibilityTable::new()
        .with_targets(units[0].resource(), vec![units[2].clone(), units[3].clone()])
        .with_targets(units[1].resource(), vec![units[0].clone(), units[2].clone()]);
    let catalog = load_catalog(&args, units)?;

    let property = EventPropertyPrimitive::new("duration").with_label("Duration");
    let mut controller = PropertyUnitController::new(property, catalog, table);
    controller.set_query("sec");
    let outcome = controller.select_source_unit("second");
    info!("event=cli_session module=cli status=ok outcome={outcome:?}");
    if let Some(last) = controller.candidates().last().cloned() {
        controller.pick_candidate(&last);
    }

    let view = serde_json::to_string_pretty(&controller.view()).map_err(|err| err.to_string())?;
    println!("{view}");
    let property =
        serde_json::to_string_pretty(&controller.into_property()).map_err(|err| err.to_string())?;
    println!("{property}");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
