use std::cell::Cell;
use std::fs;

use movestar_core::imports::*;
use movestar_core::params::M_PER_MI;
use movestar_core::prelude::*;
use movestar_core::scoring::benchmark_trajectory;

/// Rate of `(bin + 1) * (col + 1)` per second for every class
fn rate_table() -> RateTable {
    RateTable::from_rates_per_hr(Array2::from_shape_fn((23, 7), |(bin, col)| {
        ((bin + 1) * (col + 1)) as f64 * 3600.0
    }))
    .unwrap()
}

fn light_duty() -> PhysicalCoefficients {
    PhysicalCoefficients {
        A: 0.156461,
        B: 0.002002,
        C: 0.000493,
        M: 1.4788,
        f: 1.4788,
    }
}

fn tables() -> TableSet {
    TableSet::new()
        .with_coefficients(VehicleClass::LightDuty, light_duty())
        .with_rate_table(VehicleClass::LightDuty, rate_table())
}

/// Provider that counts lookups
struct CountingProvider {
    inner: TableSet,
    lookups: Cell<usize>,
}

impl TableProvider for CountingProvider {
    fn coefficients(&self, class: VehicleClass) -> Result<PhysicalCoefficients, EmissionError> {
        self.lookups.set(self.lookups.get() + 1);
        self.inner.coefficients(class)
    }

    fn rate_table(&self, class: VehicleClass) -> Result<&RateTable, EmissionError> {
        self.lookups.set(self.lookups.get() + 1);
        self.inner.rate_table(class)
    }
}

fn urban_trace() -> Vec<f64> {
    vec![
        0.0, 0.0, 1.2, 3.1, 5.4, 7.9, 10.2, 12.0, 13.1, 13.4, 13.0, 11.5, 8.2, 4.9, 2.0, 0.4,
        0.0, 0.0, 2.5, 6.0, 9.8, 14.1, 18.5, 22.0, 24.6, 25.1, 24.8, 23.0, 19.2, 12.6, 6.1,
        1.5, 0.0,
    ]
}

#[test]
fn test_histogram_sums_to_trace_length() {
    for speed in [urban_trace(), vec![10.0; 5], vec![0.0; 7], vec![3.0]] {
        let trip = TripEmissions::run(&tables(), VehicleClass::LightDuty, &speed).unwrap();
        assert_eq!(trip.histogram.total() as usize, speed.len());
    }
}

#[test]
fn test_central_difference_acceleration_edges() {
    let trip = TripEmissions::run(&tables(), VehicleClass::LightDuty, &urban_trace()).unwrap();
    assert_eq!(trip.accel_mps2[0], 0.0);
    assert_eq!(trip.accel_mps2[trip.accel_mps2.len() - 1], 0.0);
}

#[test]
fn test_emission_factor_scales_emission_rate() {
    let speed = urban_trace();
    let distance_m: f64 = speed.iter().sum();
    let result = compute_emissions(&tables(), 1, &speed).unwrap();
    let rate = result.emission_rate.values();
    let factor = result.emission_factor.unwrap().values();
    for col in 0..8 {
        assert!(
            factor[col].approx_eq(&(rate[col] * M_PER_MI / distance_m), 1e-9),
            "{}",
            EmissionFactor::COLUMNS[col]
        );
    }
    assert_eq!(rate[8], speed.len() as f64);
    assert!(factor[8].approx_eq(&(distance_m / M_PER_MI), 1e-12));
}

#[test]
fn test_stationary_trip() {
    let speed = [0.0; 5];
    let trip = TripEmissions::run(&tables(), VehicleClass::LightDuty, &speed).unwrap();
    assert_eq!(trip.histogram.count(OperatingMode::Idle), 5);
    assert_eq!(trip.result.emission_rate.travel_time_s, 5.0);
    // idle rates are nonzero in this table, yet a trip that never moves reports none
    assert_eq!(
        trip.result.emission_rate.values(),
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0]
    );
    assert!(trip.result.is_degenerate());

    let eco = compute_eco_score(&tables(), 1, &speed).unwrap();
    assert_eq!(eco.score, 1.0);
    assert_eq!(
        [
            eco.emission_co,
            eco.emission_hc,
            eco.emission_nox,
            eco.emission_pm25,
            eco.emission_energy,
            eco.emission_co2
        ],
        [0.0; 6]
    );
}

#[test]
fn test_zero_rate_table_gives_zero_totals() {
    let tables = TableSet::new()
        .with_coefficients(VehicleClass::LightDuty, light_duty())
        .with_rate_table(
            VehicleClass::LightDuty,
            RateTable::from_rates_per_hr(Array2::zeros((23, 7))).unwrap(),
        );
    let result = compute_emissions(&tables, 1, &[0.0; 5]).unwrap();
    assert_eq!(
        result.emission_rate.values(),
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0]
    );
}

#[test]
fn test_constant_speed_scores() {
    let speed = [10.0; 5];
    let trip = TripEmissions::run(&tables(), VehicleClass::LightDuty, &speed).unwrap();
    let (mode, count) = trip
        .histogram
        .iter()
        .find(|(_, count)| *count > 0)
        .unwrap();
    assert_eq!(count, 5);
    assert_eq!(mode, OperatingMode::LowSpeedVsp0To3);
    assert_eq!(mode.moves_id(), 12);
    assert!(trip.histogram.count(OperatingMode::Braking) == 0);

    assert_eq!(compute_safe_score(&speed).score, 1.0);
    assert_eq!(compute_comfort_score(&speed).score, 1.0);
}

#[test]
fn test_invalid_class_does_not_touch_provider() {
    let provider = CountingProvider {
        inner: tables(),
        lookups: Cell::new(0),
    };
    assert_eq!(
        compute_emissions(&provider, 3, &urban_trace()),
        Err(EmissionError::InvalidVehicleClass(3))
    );
    assert_eq!(
        compute_eco_score(&provider, 3, &urban_trace()),
        Err(EmissionError::InvalidVehicleClass(3))
    );
    assert_eq!(provider.lookups.get(), 0);

    compute_emissions(&provider, 1, &urban_trace()).unwrap();
    assert_eq!(provider.lookups.get(), 2);
}

#[test]
fn test_unknown_class_propagates() {
    assert_eq!(
        compute_emissions(&tables(), 2, &urban_trace()),
        Err(EmissionError::UnknownVehicleClass(VehicleClass::HeavyDuty))
    );
}

#[test]
fn test_eco_score_bounds_and_benchmark() {
    let speed: Vec<f64> = urban_trace()[2..30].to_vec();
    let eco = compute_eco_score(&tables(), 1, &speed).unwrap();
    assert!((0.6..=1.0).contains(&eco.score));
    let comparison = eco.benchmark.unwrap();
    assert!(comparison.benchmark_distance_m >= comparison.distance_m);

    let benchmark = benchmark_trajectory(&speed, 10_000);
    assert!(benchmark.speed_mps.len() < 10_000);
    assert_eq!(benchmark.speed_mps, comparison.trajectory_mps);
}

#[test]
fn test_batch_run() {
    let batch = TripBatch(
        (0..8)
            .map(|i| {
                movestar_core::trip::TripJob::new(
                    VehicleClass::LightDuty,
                    urban_trace().iter().map(|v| v * (1.0 + i as f64 / 10.0)).collect(),
                )
            })
            .collect(),
    );
    let tables = tables();
    let results = batch.run(&tables, Some(true)).unwrap();
    assert_eq!(results.len(), 8);
    for (job, trip) in batch.0.iter().zip(results.iter()) {
        assert_eq!(
            trip.result,
            compute_emissions(&tables, 1, &job.speed_mps).unwrap()
        );
    }
}

#[test]
fn test_tables_from_dir() {
    let dir = tempfile::tempdir().unwrap();
    let rows: Vec<String> = (0..23)
        .map(|bin| {
            let mut row = vec![format!("{}", bin)];
            row.extend((0..7).map(|col| format!("{}", ((bin + 1) * (col + 1)) as f64 * 3600.0)));
            row.join(",")
        })
        .collect();
    fs::write(dir.path().join("EmsRate_1.csv"), rows.join("\n")).unwrap();
    // no such vehicle class, skipped
    fs::write(dir.path().join("EmsRate_9.csv"), "not,a,table").unwrap();
    fs::write(
        dir.path().join("VehicleSrcCoeff.csv"),
        "VehicleType,A,B,C,M,f\n1,0.156461,0.002002,0.000493,1.4788,1.4788\n",
    )
    .unwrap();

    let loaded = TableSet::from_dir(dir.path()).unwrap();
    assert_eq!(loaded.classes(), vec![VehicleClass::LightDuty]);
    assert_eq!(loaded, tables());
    assert_eq!(
        compute_emissions(&loaded, 1, &urban_trace()).unwrap(),
        compute_emissions(&tables(), 1, &urban_trace()).unwrap()
    );
}

#[test]
fn test_tables_from_dir_rejects_malformed_rate_table() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("EmsRate_1.csv"), "0,1,2,3,4,5,6,7\n").unwrap();
    fs::write(
        dir.path().join("VehicleSrcCoeff.csv"),
        "VehicleType,A,B,C,M,f\n1,0.1,0.0,0.0,1.0,1.0\n",
    )
    .unwrap();
    let err = TableSet::from_dir(dir.path()).unwrap_err();
    assert!(format!("{err:?}").contains("EmsRate_1.csv"));
}

#[test]
#[cfg(feature = "resources")]
fn test_tables_from_dir_falls_back_to_builtin_coefficients() {
    let dir = tempfile::tempdir().unwrap();
    let rows = vec!["0,1,1,1,1,1,1,1"; 23];
    fs::write(dir.path().join("EmsRate_2.csv"), rows.join("\n")).unwrap();
    let loaded = TableSet::from_dir(dir.path()).unwrap();
    assert_eq!(loaded.classes(), vec![VehicleClass::HeavyDuty]);
    assert_eq!(
        loaded.coefficients(VehicleClass::HeavyDuty).unwrap().M,
        29.3275
    );
}

#[test]
fn test_speed_trace_file_feeds_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trip.csv");
    let trace = SpeedTrace::from_speeds(&urban_trace(), SpeedUnit::MetersPerSecond).unwrap();
    trace.to_file(&path).unwrap();
    let loaded = SpeedTrace::from_file_named(&path).unwrap();
    assert_eq!(loaded.name, "trip");
    assert_eq!(
        compute_emissions(&tables(), 1, &loaded.speeds()).unwrap(),
        compute_emissions(&tables(), 1, &urban_trace()).unwrap()
    );
}
