//! Eco-driving score: per-mile energy of the actual trip compared with a
//! constant-acceleration benchmark covering the same distance between the same
//! initial and final speeds.

use crate::emissions::EmissionRate;
use crate::error::EmissionError;
use crate::imports::*;
use crate::params::ScoringParams;
use crate::tables::TableProvider;
use crate::trip::TripEmissions;
use crate::utils::score_percentage;
use crate::vehicle::VehicleClass;

/// Constant-acceleration speed profile from the first to the last speed of a trip
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BenchmarkTrajectory {
    /// speed [m/s], one sample per second
    pub speed_mps: Vec<f64>,
    /// distance of the original trip [m]
    pub target_distance_m: f64,
    /// distance covered by `speed_mps` [m]
    pub distance_m: f64,
}

impl BenchmarkTrajectory {
    /// True when the sample cap stopped the trajectory short of the target distance
    pub fn is_capped(&self, max_samples: usize) -> bool {
        self.speed_mps.len() >= max_samples && self.distance_m < self.target_distance_m
    }
}

/// Builds `v(i) = v1 + acc * i` with `acc = (v2^2 - v1^2) / (2 S)`, where `v1`/`v2`
/// are the first/last speeds and `S` the trip distance. Samples are appended while
/// the accumulated distance is below `S`, up to `max_samples`.
pub fn benchmark_trajectory(speed_mps: &[f64], max_samples: usize) -> BenchmarkTrajectory {
    let v1 = speed_mps.first().copied().unwrap_or_default();
    let v2 = speed_mps.last().copied().unwrap_or_default();
    let target_distance_m: f64 = speed_mps.iter().sum();
    let accel = if target_distance_m == 0.0 {
        0.0
    } else {
        (v2.powi(2) - v1.powi(2)) / (2.0 * target_distance_m)
    };

    let mut benchmark = Vec::new();
    let mut distance_m = 0.0;
    while distance_m < target_distance_m && benchmark.len() < max_samples {
        let v = v1 + accel * benchmark.len() as f64;
        benchmark.push(v);
        distance_m += v;
    }

    let trajectory = BenchmarkTrajectory {
        speed_mps: benchmark,
        target_distance_m,
        distance_m,
    };
    if trajectory.is_capped(max_samples) {
        log::warn!(
            "benchmark trajectory stopped at {max_samples} samples, {distance_m} of {target_distance_m} m covered"
        );
    }
    trajectory
}

/// Eco-driving score from the actual (`e1`) and benchmark (`e2`) per-mile energy.
/// A trip with no energy use scores 1, otherwise `min(e2 / e1, 1)` floored at
/// `floor`. A NaN ratio scores 0.
pub fn score_from_energy(e1: f64, e2: f64, floor: f64) -> f64 {
    if e1 == 0.0 {
        return 1.0;
    }
    let ratio = e2 / e1;
    if ratio.is_nan() {
        log::warn!("eco-driving energy ratio is undefined (E1 = {e1}, E2 = {e2}), scoring 0");
        return 0.0;
    }
    ratio.min(1.0).max(floor)
}

/// Benchmark comparison behind an eco-driving score
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BenchmarkComparison {
    #[serde(rename = "benchmark_speed_trajectory")]
    pub trajectory_mps: Vec<f64>,
    /// original trip distance [m]
    #[serde(rename = "Dist_Org")]
    pub distance_m: f64,
    /// benchmark distance [m]
    #[serde(rename = "Dist_BenchMark")]
    pub benchmark_distance_m: f64,
    /// actual per-mile energy [KJ/mi]
    #[serde(rename = "E1_Org")]
    pub e1: f64,
    /// benchmark per-mile energy [KJ/mi]
    #[serde(rename = "E2_BenchMark")]
    pub e2: f64,
    /// 0 when `e1` is 0
    pub e2_by_e1: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EcoDrivingResult {
    #[serde(rename = "eco_driving_score")]
    pub score: f64,
    #[serde(rename = "eco_driving_score_per")]
    pub score_percentage: String,
    /// trip totals, g
    pub emission_co: f64,
    pub emission_hc: f64,
    pub emission_nox: f64,
    /// organic PM2.5
    #[serde(rename = "emission_pm2.5")]
    pub emission_pm25: f64,
    /// KJ
    pub emission_energy: f64,
    pub emission_co2: f64,
    /// absent when the trip starts and ends at rest
    #[serde(flatten)]
    pub benchmark: Option<BenchmarkComparison>,
}

impl SerdeAPI for EcoDrivingResult {}

impl EcoDrivingResult {
    fn new(score: f64, rate: &EmissionRate, benchmark: Option<BenchmarkComparison>) -> Self {
        Self {
            score,
            score_percentage: score_percentage(score),
            emission_co: rate.co_g,
            emission_hc: rate.hc_g,
            emission_nox: rate.nox_g,
            emission_pm25: rate.pm25_org_g,
            emission_energy: rate.energy_kj,
            emission_co2: rate.co2_g,
            benchmark,
        }
    }

    /// Perfect score with zero emissions, for a trip that never moves
    fn stationary() -> Self {
        Self::new(1.0, &EmissionRate::default(), None)
    }
}

/// Eco-driving score of a 1 Hz speed trace (m/s) with default parameters
pub fn compute_eco_score<P: TableProvider + ?Sized>(
    provider: &P,
    vehicle_class: i64,
    speed_mps: &[f64],
) -> Result<EcoDrivingResult, EmissionError> {
    compute_eco_score_with(provider, vehicle_class, speed_mps, &ScoringParams::default())
}

pub fn compute_eco_score_with<P: TableProvider + ?Sized>(
    provider: &P,
    vehicle_class: i64,
    speed_mps: &[f64],
    params: &ScoringParams,
) -> Result<EcoDrivingResult, EmissionError> {
    let class = VehicleClass::try_from(vehicle_class)?;

    let (v1, v2) = match (speed_mps.first(), speed_mps.last()) {
        (Some(v1), Some(v2)) => (*v1, *v2),
        _ => return Ok(EcoDrivingResult::stationary()),
    };

    if v1 == 0.0 && v2 == 0.0 {
        if speed_mps.iter().all(|v| *v == 0.0) {
            return Ok(EcoDrivingResult::stationary());
        }
        let trip = TripEmissions::run(provider, class, speed_mps)?;
        return Ok(EcoDrivingResult::new(
            1.0,
            &trip.result.emission_rate,
            None,
        ));
    }

    let benchmark = benchmark_trajectory(speed_mps, params.benchmark_max_samples);
    let benchmark_trip = TripEmissions::run(provider, class, &benchmark.speed_mps)?;
    let trip = TripEmissions::run(provider, class, speed_mps)?;

    let energy_per_mi = |trip: &TripEmissions| {
        trip.result
            .emission_factor
            .map_or(f64::NAN, |factor| factor.energy_kj_per_mi)
    };
    let e2 = energy_per_mi(&benchmark_trip);
    let e1 = energy_per_mi(&trip);
    let score = score_from_energy(e1, e2, params.eco_score_floor);

    let comparison = BenchmarkComparison {
        trajectory_mps: benchmark.speed_mps,
        distance_m: benchmark.target_distance_m,
        benchmark_distance_m: benchmark.distance_m,
        e1,
        e2,
        e2_by_e1: if e1 == 0.0 { 0.0 } else { e2 / e1 },
    };
    Ok(EcoDrivingResult::new(
        score,
        &trip.result.emission_rate,
        Some(comparison),
    ))
}
