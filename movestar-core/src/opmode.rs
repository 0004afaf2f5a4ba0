//! Module containing the MOVES operating-mode bins and the classifier that assigns
//! each second of a trip to one of them.
//!
//! Bins are identified by their position 0..23, which is also the row order of every
//! emission rate table. The position is an opaque identity: see
//! [`OperatingMode::moves_id`] for the MOVES opMode number behind each one.

use crate::imports::*;
use crate::params::{MPH_PER_MPS, N_OPMODES};
use crate::utils::arrmax;

/// The 23 MOVES running operating modes, in rate-table row order
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatingMode {
    Braking,
    Idle,
    // speed < 25 mph
    LowSpeedCoasting,
    LowSpeedVsp0To3,
    LowSpeedVsp3To6,
    LowSpeedVsp6To9,
    LowSpeedVsp9To12,
    LowSpeedVspAbove12,
    // 25 mph <= speed < 50 mph
    ModerateSpeedCoasting,
    ModerateSpeedVsp0To3,
    ModerateSpeedVsp3To6,
    ModerateSpeedVsp6To9,
    ModerateSpeedVsp9To12,
    ModerateSpeedVsp12To18,
    ModerateSpeedVsp18To24,
    ModerateSpeedVsp24To30,
    ModerateSpeedVspAbove30,
    // speed >= 50 mph
    HighSpeedVspBelow6,
    HighSpeedVsp6To12,
    HighSpeedVsp12To18,
    HighSpeedVsp18To24,
    HighSpeedVsp24To30,
    HighSpeedVspAbove30,
}

use OperatingMode::*;

const MOVES_IDS: [u8; N_OPMODES] = [
    0, 1, 11, 12, 13, 14, 15, 16, 21, 22, 23, 24, 25, 27, 28, 29, 30, 33, 35, 37, 38, 39, 40,
];

impl OperatingMode {
    /// Every operating mode, in bin order
    pub const ALL: [OperatingMode; N_OPMODES] = [
        Braking,
        Idle,
        LowSpeedCoasting,
        LowSpeedVsp0To3,
        LowSpeedVsp3To6,
        LowSpeedVsp6To9,
        LowSpeedVsp9To12,
        LowSpeedVspAbove12,
        ModerateSpeedCoasting,
        ModerateSpeedVsp0To3,
        ModerateSpeedVsp3To6,
        ModerateSpeedVsp6To9,
        ModerateSpeedVsp9To12,
        ModerateSpeedVsp12To18,
        ModerateSpeedVsp18To24,
        ModerateSpeedVsp24To30,
        ModerateSpeedVspAbove30,
        HighSpeedVspBelow6,
        HighSpeedVsp6To12,
        HighSpeedVsp12To18,
        HighSpeedVsp18To24,
        HighSpeedVsp24To30,
        HighSpeedVspAbove30,
    ];

    /// 0-based bin position, also the rate-table row
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// MOVES opMode identifier
    pub fn moves_id(self) -> u8 {
        MOVES_IDS[self.index()]
    }

    pub fn from_moves_id(id: u8) -> Option<Self> {
        MOVES_IDS
            .iter()
            .position(|&m| m == id)
            .and_then(Self::from_index)
    }
}

/// VSP ladder for one speed regime. `modes` has one more entry than `vsp_bounds`; the
/// last mode catches everything at or above the highest bound.
struct SpeedRegime {
    /// exclusive upper bound of the regime, mph
    max_speed_mph: f64,
    /// ascending VSP bounds, kW/tonne
    vsp_bounds: &'static [f64],
    modes: &'static [OperatingMode],
}

static SPEED_REGIMES: [SpeedRegime; 3] = [
    SpeedRegime {
        max_speed_mph: 25.0,
        vsp_bounds: &[0.0, 3.0, 6.0, 9.0, 12.0],
        modes: &[
            LowSpeedCoasting,
            LowSpeedVsp0To3,
            LowSpeedVsp3To6,
            LowSpeedVsp6To9,
            LowSpeedVsp9To12,
            LowSpeedVspAbove12,
        ],
    },
    SpeedRegime {
        max_speed_mph: 50.0,
        vsp_bounds: &[0.0, 3.0, 6.0, 9.0, 12.0, 18.0, 24.0, 30.0],
        modes: &[
            ModerateSpeedCoasting,
            ModerateSpeedVsp0To3,
            ModerateSpeedVsp3To6,
            ModerateSpeedVsp6To9,
            ModerateSpeedVsp9To12,
            ModerateSpeedVsp12To18,
            ModerateSpeedVsp18To24,
            ModerateSpeedVsp24To30,
            ModerateSpeedVspAbove30,
        ],
    },
    SpeedRegime {
        max_speed_mph: f64::INFINITY,
        vsp_bounds: &[6.0, 12.0, 18.0, 24.0, 30.0],
        modes: &[
            HighSpeedVspBelow6,
            HighSpeedVsp6To12,
            HighSpeedVsp12To18,
            HighSpeedVsp18To24,
            HighSpeedVsp24To30,
            HighSpeedVspAbove30,
        ],
    },
];

impl SpeedRegime {
    fn for_speed(speed_mph: f64) -> &'static SpeedRegime {
        SPEED_REGIMES
            .iter()
            .find(|regime| speed_mph < regime.max_speed_mph)
            .unwrap_or(&SPEED_REGIMES[SPEED_REGIMES.len() - 1])
    }

    /// First mode whose bound is strictly greater than `vsp`. `vsp_top` closes the
    /// ladder; a value that clears it (only NaN can) lands in the top mode too.
    fn select(&self, vsp: f64, vsp_top: f64) -> OperatingMode {
        self.vsp_bounds
            .iter()
            .chain(std::iter::once(&vsp_top))
            .position(|&bound| vsp < bound)
            .map(|pos| self.modes[pos])
            .unwrap_or(self.modes[self.modes.len() - 1])
    }
}

/// Braking test at sample `i`: hard deceleration now, or two consecutive moderate
/// decelerations just before (only once at least four samples exist)
fn is_braking(accel_mps2: &Array1<f64>, i: usize) -> bool {
    if accel_mps2[i] * MPH_PER_MPS <= -2.0 {
        return true;
    }
    i >= 3 && accel_mps2[i - 2] * MPH_PER_MPS < -1.0 && accel_mps2[i - 1] * MPH_PER_MPS < -1.0
}

/// Assigns an operating mode to every sample of a trip.
///
/// # Arguments
/// - speed_mps: speed, m/s
/// - accel_mps2: acceleration, m/s^2
/// - vsp: vehicle specific power, kW/tonne
///
/// All three must have the same length. Returns an empty vector when `vsp` is empty,
/// since the top of the VSP ladder is undefined.
pub fn classify_modes(
    speed_mps: &Array1<f64>,
    accel_mps2: &Array1<f64>,
    vsp: &Array1<f64>,
) -> Vec<OperatingMode> {
    let vsp_top = match arrmax(&vsp.to_vec()) {
        Some(max) => max + 1.0,
        None => return Vec::new(),
    };
    let n = speed_mps.len().min(accel_mps2.len()).min(vsp.len());
    (0..n)
        .map(|i| {
            let speed_mph = speed_mps[i] * MPH_PER_MPS;
            if is_braking(accel_mps2, i) {
                Braking
            } else if speed_mph < 1.0 {
                Idle
            } else {
                SpeedRegime::for_speed(speed_mph).select(vsp[i], vsp_top)
            }
        })
        .collect()
}

/// Operating-mode occupancy of a trip: seconds spent in each of the 23 bins.
/// Degrades to all zeros when VSP is empty.
pub fn classify(
    speed_mps: &Array1<f64>,
    accel_mps2: &Array1<f64>,
    vsp: &Array1<f64>,
) -> OperatingModeHistogram {
    OperatingModeHistogram::from_modes(classify_modes(speed_mps, accel_mps2, vsp))
}

/// Seconds spent in each operating mode, indexed by bin
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct OperatingModeHistogram {
    counts: [u64; N_OPMODES],
}

impl OperatingModeHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_modes<I: IntoIterator<Item = OperatingMode>>(modes: I) -> Self {
        let mut hist = Self::new();
        for mode in modes {
            hist.increment(mode);
        }
        hist
    }

    pub fn increment(&mut self, mode: OperatingMode) {
        self.counts[mode.index()] += 1;
    }

    pub fn count(&self, mode: OperatingMode) -> u64 {
        self.counts[mode.index()]
    }

    pub fn counts(&self) -> &[u64; N_OPMODES] {
        &self.counts
    }

    /// Number of classified seconds
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Modes paired with their counts, in bin order
    pub fn iter(&self) -> impl Iterator<Item = (OperatingMode, u64)> + '_ {
        OperatingMode::ALL
            .iter()
            .zip(self.counts.iter())
            .map(|(&mode, &count)| (mode, count))
    }

    /// Counts as a float row vector for multiplying against a rate table
    pub fn to_array(&self) -> Array1<f64> {
        self.counts.iter().map(|&c| c as f64).collect()
    }
}
