//! Driving-behavior scores derived from a speed trace: eco-driving (energy against a
//! constant-acceleration benchmark), safe driving (hard accelerations) and comfort
//! (jerk).

pub mod eco;
pub mod safety;

pub use eco::*;
pub use safety::*;

/// Deducts `penalty_per_event` per counted event from a perfect score, not going
/// below `floor`
pub fn penalized_score(n_events: usize, penalty_per_event: f64, floor: f64) -> f64 {
    (1.0 - penalty_per_event * n_events as f64).max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ApproxEq;

    #[test]
    fn test_penalized_score() {
        assert_eq!(penalized_score(0, 0.04, 0.6), 1.0);
        assert!(penalized_score(3, 0.04, 0.6).approx_eq(&0.88, 1e-12));
        assert_eq!(penalized_score(10, 0.04, 0.6), 0.6);
        assert_eq!(penalized_score(1000, 0.04, 0.6), 0.6);
    }
}
