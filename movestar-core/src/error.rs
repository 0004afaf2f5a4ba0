//! Errors surfaced by the emission pipeline and scorers

use thiserror::Error;

use crate::vehicle::VehicleClass;

/// Errors that can occur when running a trip through the emission pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmissionError {
    /// The vehicle class code is outside the supported enumeration
    #[error("Invalid vehicle class {0}: please enter vehicle type as 1 or 2")]
    InvalidVehicleClass(i64),

    /// The vehicle class is valid but the provider has no coefficients or rates for it
    #[error("No physical coefficients or emission rate table for vehicle class {0}")]
    UnknownVehicleClass(VehicleClass),
}
