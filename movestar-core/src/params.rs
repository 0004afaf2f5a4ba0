//! Module containing MOVESTAR parameters.

use crate::imports::*;

/// Unit conversions that should NEVER change
/// m/s to mph, also m/s^2 to mph/s
pub const MPH_PER_MPS: f64 = 2.23693629;
pub const M_PER_MI: f64 = 1609.34;
pub const S_PER_HR: f64 = 3600.0;
pub const KPH_PER_MPS: f64 = 3.6;
/// Divisor applied to speed traces given in mph
pub const MPH_PER_MPS_COARSE: f64 = 2.237;

/// Number of MOVES operating modes covered by the rate tables
pub const N_OPMODES: usize = 23;
/// Number of pollutant/energy columns in a rate table
pub const N_RATE_COLUMNS: usize = 7;

/// Carbon mass fraction of CO2
pub const CARBON_PER_CO2: f64 = 12.0 / 44.0;
/// Fuel mass per unit carbon mass
pub const FUEL_PER_CARBON: f64 = 13.78 / 12.0;

/// Parameters for the driving-behavior scores
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScoringParams {
    /// Hard cap on the number of samples in a benchmark speed trajectory
    pub benchmark_max_samples: usize,
    /// Lowest eco-driving score a non-degenerate trip can receive
    pub eco_score_floor: f64,
    /// |acceleration| above which a sample counts against the safe-driving score, m/s^2
    pub safe_accel_threshold_mps2: f64,
    /// |jerk| above which a sample counts against the comfort score, m/s^3
    pub comfort_jerk_threshold_mps3: f64,
    /// Score deducted per counted sample
    pub penalty_per_event: f64,
    /// Lowest safe-driving or comfort score
    pub score_floor: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            benchmark_max_samples: 10_000,
            eco_score_floor: 0.6,
            safe_accel_threshold_mps2: 3.0,
            comfort_jerk_threshold_mps3: 10.0,
            penalty_per_event: 0.04,
            score_floor: 0.6,
        }
    }
}

impl SerdeAPI for ScoringParams {
    fn init(&mut self) -> anyhow::Result<()> {
        ensure!(
            self.benchmark_max_samples > 0,
            "`benchmark_max_samples` must be positive"
        );
        ensure!(
            (0.0..=1.0).contains(&self.eco_score_floor),
            "`eco_score_floor` must be within [0, 1], got {}",
            self.eco_score_floor
        );
        ensure!(
            (0.0..=1.0).contains(&self.score_floor),
            "`score_floor` must be within [0, 1], got {}",
            self.score_floor
        );
        ensure!(
            self.penalty_per_event >= 0.0,
            "`penalty_per_event` must be non-negative, got {}",
            self.penalty_per_event
        );
        Ok(())
    }
}
