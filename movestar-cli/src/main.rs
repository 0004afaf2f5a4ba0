use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, ValueEnum};
use serde::Serialize;

use movestar_core::prelude::*;
use movestar_core::scoring::{
    compute_comfort_score_with, compute_eco_score_with, compute_safe_score_with,
};

/// Wrapper for movestar.
/// After running `cargo build --release`, run with
/// ```bash
/// ./target/release/movestar-cli --tables-dir ./tables --speed-file trip.csv --score all
/// ```
/// or pass the speed trace inline:
/// ```bash
/// ./target/release/movestar-cli --speed "[0, 2.5, 5, 5, 2]" --unit mps
/// ```
/// Without `--tables-dir`, the tables built into `movestar-core` are used.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(group(
    ArgGroup::new("trace")
    .required(true)
    .args(&["speed", "speed-file"])
))]
struct MovestarApi {
    /// Speed trace as a JSON array, one sample per second
    #[clap(long, value_parser)]
    speed: Option<String>,
    /// Path to speed trace file (csv with `Time,Speed` columns, yaml or json)
    #[clap(long, value_parser)]
    speed_file: Option<PathBuf>,
    /// Vehicle class: 1 for light duty, 2 for heavy duty
    #[clap(long, value_parser, default_value_t = 1)]
    vehicle_class: i64,
    /// Directory containing `EmsRate_<class>.csv` and optionally `VehicleSrcCoeff.csv`,
    /// defaults to the built-in tables
    #[clap(long, value_parser)]
    tables_dir: Option<PathBuf>,
    /// Unit of the input speeds, defaults to mps
    #[clap(long, value_enum)]
    unit: Option<UnitArg>,
    /// Average sub-second samples into one sample per second
    #[clap(long, action)]
    resample: bool,
    /// Path to scoring parameters file (yaml or json)
    #[clap(long, value_parser)]
    params_file: Option<PathBuf>,
    /// Which results to report, defaults to emissions
    #[clap(long, value_enum)]
    score: Option<ScoreArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum UnitArg {
    Mps,
    Kph,
    Mph,
}

impl From<UnitArg> for SpeedUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Mps => SpeedUnit::MetersPerSecond,
            UnitArg::Kph => SpeedUnit::KilometersPerHour,
            UnitArg::Mph => SpeedUnit::MilesPerHour,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ScoreArg {
    Emissions,
    Eco,
    Safe,
    Comfort,
    All,
}

impl ScoreArg {
    fn includes(self, other: ScoreArg) -> bool {
        self == ScoreArg::All || self == other
    }
}

#[derive(Serialize, Default)]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    emissions: Option<EmissionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    eco: Option<EcoDrivingResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    safe: Option<SafeScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comfort: Option<ComfortScore>,
}

fn load_trace(api: &MovestarApi) -> anyhow::Result<SpeedTrace> {
    let unit: SpeedUnit = api.unit.map(Into::into).unwrap_or_default();
    let trace = if let Some(speed_json) = &api.speed {
        let speed: Vec<f64> = serde_json::from_str(speed_json)
            .with_context(|| format!("`--speed` is not a JSON array of numbers: {speed_json}"))?;
        SpeedTrace::from_speeds(&speed, unit)?
    } else if let Some(speed_file) = &api.speed_file {
        let trace = SpeedTrace::from_file_named(speed_file)?;
        let speed = trace.mps.iter().map(|v| unit.to_mps(*v)).collect();
        SpeedTrace {
            mps: speed,
            ..trace
        }
    } else {
        anyhow::bail!("one of `--speed` or `--speed-file` is required");
    };
    Ok(if api.resample {
        trace.to_second_by_second()
    } else {
        if !trace.is_one_hz() {
            log::warn!(
                "speed trace {:?} is not sampled at 1 Hz, each sample is treated as one second; pass `--resample` to average per second",
                trace.name
            );
        }
        trace
    })
}

fn run(api: &MovestarApi) -> anyhow::Result<Report> {
    let tables = match &api.tables_dir {
        Some(dir) => TableSet::from_dir(dir)?,
        None => TableSet::builtin()?,
    };
    let params = match &api.params_file {
        Some(path) => ScoringParams::from_file(path)
            .with_context(|| format!("Invalid scoring parameters: {path:?}"))?,
        None => ScoringParams::default(),
    };
    let trace = load_trace(api)?;
    let speed = trace.speeds();
    log::info!("loaded speed trace of {} samples", speed.len());

    let score = api.score.unwrap_or(ScoreArg::Emissions);
    let mut report = Report::default();
    if score.includes(ScoreArg::Emissions) {
        report.emissions = Some(compute_emissions(&tables, api.vehicle_class, &speed)?);
    }
    if score.includes(ScoreArg::Eco) {
        report.eco = Some(compute_eco_score_with(
            &tables,
            api.vehicle_class,
            &speed,
            &params,
        )?);
    }
    if score.includes(ScoreArg::Safe) {
        report.safe = Some(compute_safe_score_with(&speed, &params));
    }
    if score.includes(ScoreArg::Comfort) {
        report.comfort = Some(compute_comfort_score_with(&speed, &params));
    }
    Ok(report)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let api = MovestarApi::parse();
    let report = run(&api)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
