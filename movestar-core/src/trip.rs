//! Module containing the trip emission pipeline: kinematics -> VSP -> operating-mode
//! histogram -> emission totals, for one speed trace and one vehicle class, plus a
//! batch runner for many independent trips.

use rayon::prelude::*;

use crate::emissions::{aggregate, EmissionResult, EmissionTotals};
use crate::error::EmissionError;
use crate::imports::*;
use crate::kinematics::speed_to_accel;
use crate::opmode::{classify, OperatingModeHistogram};
use crate::tables::TableProvider;
use crate::vehicle::VehicleClass;
use crate::vsp::calc_vsp;

/// Estimates emissions for a 1 Hz speed trace (m/s).
///
/// The vehicle class code is validated before the provider is consulted, so an
/// invalid code fails with [`EmissionError::InvalidVehicleClass`] without any lookup.
/// A trip with zero distance yields an Emission Rate but no Emission Factor, and a
/// trace that never moves reports zero totals.
pub fn compute_emissions<P: TableProvider + ?Sized>(
    provider: &P,
    vehicle_class: i64,
    speed_mps: &[f64],
) -> Result<EmissionResult, EmissionError> {
    let class = VehicleClass::try_from(vehicle_class)?;
    Ok(TripEmissions::run(provider, class, speed_mps)?.result)
}

/// Full pipeline output for one trip, including the intermediate arrays
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TripEmissions {
    pub vehicle_class: VehicleClass,
    /// speed [m/s]
    pub speed_mps: Array1<f64>,
    /// central-difference acceleration [m/s^2]
    pub accel_mps2: Array1<f64>,
    /// vehicle specific power [kW/tonne]
    pub vsp: Array1<f64>,
    pub histogram: OperatingModeHistogram,
    pub result: EmissionResult,
}

impl SerdeAPI for TripEmissions {}

impl TripEmissions {
    pub fn run<P: TableProvider + ?Sized>(
        provider: &P,
        vehicle_class: VehicleClass,
        speed_mps: &[f64],
    ) -> Result<Self, EmissionError> {
        let coeffs = provider.coefficients(vehicle_class)?;
        let table = provider.rate_table(vehicle_class)?;

        let speed_mps = Array1::from_vec(speed_mps.to_vec());
        let accel_mps2 = speed_to_accel(&speed_mps);
        let vsp = calc_vsp(&speed_mps, &accel_mps2, &coeffs);
        let histogram = classify(&speed_mps, &accel_mps2, &vsp);
        log::debug!(
            "vehicle class {vehicle_class}: operating-mode counts {:?}",
            histogram.counts()
        );

        // a vehicle that never moves is not counted as emitting
        let totals = if speed_mps.iter().all(|v| *v == 0.0) {
            EmissionTotals::default()
        } else {
            aggregate(&histogram, table)
        };
        let travel_time_s = speed_mps.len() as f64;
        let distance_m = speed_mps.sum();
        let result = EmissionResult::new(&totals, travel_time_s, distance_m);
        if result.is_degenerate() {
            log::warn!("trip of {travel_time_s} s has zero distance, no emission factor computed");
        }

        Ok(Self {
            vehicle_class,
            speed_mps,
            accel_mps2,
            vsp,
            histogram,
            result,
        })
    }
}

/// One trip in a [`TripBatch`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TripJob {
    pub vehicle_class: VehicleClass,
    /// speed [m/s]
    pub speed_mps: Vec<f64>,
}

impl TripJob {
    pub fn new(vehicle_class: VehicleClass, speed_mps: Vec<f64>) -> Self {
        Self {
            vehicle_class,
            speed_mps,
        }
    }
}

/// Independent trips sharing one read-only table provider
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TripBatch(pub Vec<TripJob>);

impl SerdeAPI for TripBatch {}

impl TripBatch {
    /// Runs every trip in the batch, in input order.
    /// # Arguments:
    /// * provider: table lookup shared by all trips
    /// * parallelize: whether to run trips on the rayon thread pool, defaults to `true`
    pub fn run<P: TableProvider + Sync + ?Sized>(
        &self,
        provider: &P,
        parallelize: Option<bool>,
    ) -> anyhow::Result<Vec<TripEmissions>> {
        let parallelize = parallelize.unwrap_or(true);
        let run_job = |(i, job): (usize, &TripJob)| {
            TripEmissions::run(provider, job.vehicle_class, &job.speed_mps)
                .with_context(|| format!("trip idx: {}", i))
        };
        if parallelize {
            self.0.par_iter().enumerate().map(run_job).collect()
        } else {
            self.0.iter().enumerate().map(run_job).collect()
        }
    }

    pub fn push(&mut self, job: TripJob) {
        self.0.push(job);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
