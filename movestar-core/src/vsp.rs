//! Vehicle Specific Power (VSP), the power-per-unit-mass proxy that MOVES uses to
//! characterize instantaneous engine load.

use crate::imports::*;
use crate::vehicle::PhysicalCoefficients;

/// VSP (kW/tonne) at a single sample, assuming zero road grade
///
/// # Arguments
/// - speed_mps: speed, m/s
/// - accel_mps2: acceleration, m/s^2
/// - coeffs: road-load coefficients of the vehicle class
pub fn vsp_at(speed_mps: f64, accel_mps2: f64, coeffs: &PhysicalCoefficients) -> f64 {
    (coeffs.A * speed_mps
        + coeffs.B * speed_mps.powi(2)
        + coeffs.C * speed_mps.powi(3)
        + coeffs.M * accel_mps2 * speed_mps)
        / coeffs.f
}

/// Pointwise VSP (kW/tonne) over a trip. `speed_mps` and `accel_mps2` must have the
/// same length.
pub fn calc_vsp(
    speed_mps: &Array1<f64>,
    accel_mps2: &Array1<f64>,
    coeffs: &PhysicalCoefficients,
) -> Array1<f64> {
    debug_assert_eq!(speed_mps.len(), accel_mps2.len());
    speed_mps
        .iter()
        .zip(accel_mps2.iter())
        .map(|(&v, &a)| vsp_at(v, a, coeffs))
        .collect()
}
