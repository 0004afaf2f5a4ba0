//! Finite-difference derivatives of once-per-second samples.
//!
//! [`derivative`] is a backward difference used by the driving-behavior scores.
//! [`speed_to_accel`] is a central difference used for VSP and operating-mode binning.
//! The two differ at the trip boundaries.

use crate::imports::*;
use crate::utils::diff;

/// Backward first difference: `d[0] = 0`, `d[i] = x[i] - x[i-1]`.
/// Units are per second since samples are one second apart.
pub fn derivative(x: &Array1<f64>) -> Array1<f64> {
    diff(x)
}

/// Acceleration (m/s^2) from speed (m/s) by central difference over three points.
/// The first and last elements are always zero.
pub fn speed_to_accel(speed_mps: &Array1<f64>) -> Array1<f64> {
    let n = speed_mps.len();
    let mut accel = Array1::zeros(n);
    for i in 1..n.saturating_sub(1) {
        accel[i] = (speed_mps[i + 1] - speed_mps[i - 1]) / 2.0;
    }
    accel
}

/// Jerk (m/s^3) from acceleration (m/s^2) by backward difference
pub fn accel_to_jerk(accel_mps2: &Array1<f64>) -> Array1<f64> {
    derivative(accel_mps2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivative_boundaries() {
        assert_eq!(derivative(&Array1::zeros(0)).len(), 0);
        assert_eq!(derivative(&array![7.0]), array![0.0]);
    }

    #[test]
    fn test_speed_to_accel_central_difference() {
        let speed = array![0.0, 2.0, 6.0, 8.0, 8.0];
        assert_eq!(speed_to_accel(&speed), array![0.0, 3.0, 3.0, 1.0, 0.0]);
    }

    #[test]
    fn test_speed_to_accel_edges_are_zero() {
        for n in 0..6 {
            let speed = Array1::from_iter((0..n).map(|i| (i * i) as f64));
            let accel = speed_to_accel(&speed);
            assert_eq!(accel.len(), n);
            if n >= 1 {
                assert_eq!(accel[0], 0.0);
                assert_eq!(accel[n - 1], 0.0);
            }
        }
    }

    #[test]
    fn test_rules_differ_at_start() {
        let speed = array![0.0, 4.0, 4.0];
        assert_eq!(derivative(&speed), array![0.0, 4.0, 0.0]);
        assert_eq!(speed_to_accel(&speed), array![0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_accel_to_jerk() {
        let accel = array![0.0, 1.0, -2.0];
        assert_eq!(accel_to_jerk(&accel), array![0.0, 1.0, -3.0]);
    }
}
