//! Safe-driving and comfort scores. Both count threshold exceedances of a
//! backward-difference derivative of speed.

use super::penalized_score;
use crate::imports::*;
use crate::kinematics::{accel_to_jerk, derivative};
use crate::params::ScoringParams;
use crate::utils::{count_abs_above, score_percentage};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SafeScore {
    /// backward-difference acceleration [m/s^2]
    #[serde(rename = "acc")]
    pub accel_mps2: Vec<f64>,
    #[serde(rename = "safe_driving_score")]
    pub score: f64,
    #[serde(rename = "safe_driving_score_per")]
    pub score_percentage: String,
}

impl SerdeAPI for SafeScore {}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ComfortScore {
    /// backward-difference jerk [m/s^3]
    #[serde(rename = "jerk")]
    pub jerk_mps3: Vec<f64>,
    #[serde(rename = "comfort_score")]
    pub score: f64,
    #[serde(rename = "comfort_score_per")]
    pub score_percentage: String,
}

impl SerdeAPI for ComfortScore {}

/// Safe-driving score of a 1 Hz speed trace (m/s) with default parameters
pub fn compute_safe_score(speed_mps: &[f64]) -> SafeScore {
    compute_safe_score_with(speed_mps, &ScoringParams::default())
}

pub fn compute_safe_score_with(speed_mps: &[f64], params: &ScoringParams) -> SafeScore {
    let accel = derivative(&Array1::from_vec(speed_mps.to_vec()));
    let n_hard = count_abs_above(&accel, params.safe_accel_threshold_mps2);
    let score = penalized_score(n_hard, params.penalty_per_event, params.score_floor);
    SafeScore {
        accel_mps2: accel.to_vec(),
        score,
        score_percentage: score_percentage(score),
    }
}

/// Comfort score of a 1 Hz speed trace (m/s) with default parameters
pub fn compute_comfort_score(speed_mps: &[f64]) -> ComfortScore {
    compute_comfort_score_with(speed_mps, &ScoringParams::default())
}

pub fn compute_comfort_score_with(speed_mps: &[f64], params: &ScoringParams) -> ComfortScore {
    let accel = derivative(&Array1::from_vec(speed_mps.to_vec()));
    let jerk = accel_to_jerk(&accel);
    let n_jerky = count_abs_above(&jerk, params.comfort_jerk_threshold_mps3);
    let score = penalized_score(n_jerky, params.penalty_per_event, params.score_floor);
    ComfortScore {
        jerk_mps3: jerk.to_vec(),
        score,
        score_percentage: score_percentage(score),
    }
}
