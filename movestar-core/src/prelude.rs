//! Convenience re-exports of the types most callers need

pub use crate::emissions::{EmissionFactor, EmissionRate, EmissionResult, EmissionTotals};
pub use crate::error::EmissionError;
pub use crate::opmode::{OperatingMode, OperatingModeHistogram};
pub use crate::params::ScoringParams;
pub use crate::scoring::{
    compute_comfort_score, compute_eco_score, compute_safe_score, ComfortScore,
    EcoDrivingResult, SafeScore,
};
pub use crate::tables::{RateTable, TableProvider, TableSet};
pub use crate::trace::{SpeedTrace, SpeedUnit};
pub use crate::traits::{ApproxEq, SerdeAPI};
pub use crate::trip::{compute_emissions, TripBatch, TripEmissions};
pub use crate::vehicle::{PhysicalCoefficients, VehicleClass};
