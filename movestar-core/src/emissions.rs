//! Module for aggregating an operating-mode histogram against a rate table into trip
//! totals, and for the absolute and per-mile views of those totals.

use crate::imports::*;
use crate::opmode::OperatingModeHistogram;
use crate::params::{CARBON_PER_CO2, FUEL_PER_CARBON, M_PER_MI, N_RATE_COLUMNS};
use crate::tables::RateTable;

/// Trip totals for the seven rate-table quantities plus fuel derived from CO2
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct EmissionTotals {
    pub co: f64,
    pub hc: f64,
    pub nox: f64,
    pub pm25_ele: f64,
    pub pm25_org: f64,
    pub energy: f64,
    pub co2: f64,
    pub fuel: f64,
}

impl EmissionTotals {
    /// Builds totals from the seven table quantities in column order, deriving fuel
    pub fn from_table_columns(columns: [f64; N_RATE_COLUMNS]) -> Self {
        let [co, hc, nox, pm25_ele, pm25_org, energy, co2] = columns;
        Self {
            co,
            hc,
            nox,
            pm25_ele,
            pm25_org,
            energy,
            co2,
            fuel: fuel_from_co2(co2),
        }
    }

    /// Values in column order: CO, HC, NOx, PM2.5 elemental, PM2.5 organic, energy, CO2, fuel
    pub fn to_array(&self) -> [f64; 8] {
        [
            self.co,
            self.hc,
            self.nox,
            self.pm25_ele,
            self.pm25_org,
            self.energy,
            self.co2,
            self.fuel,
        ]
    }

    /// Every quantity multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            co: self.co * factor,
            hc: self.hc * factor,
            nox: self.nox * factor,
            pm25_ele: self.pm25_ele * factor,
            pm25_org: self.pm25_org * factor,
            energy: self.energy * factor,
            co2: self.co2 * factor,
            fuel: self.fuel * factor,
        }
    }
}

/// Fuel mass from CO2 mass via carbon balance
pub fn fuel_from_co2(co2: f64) -> f64 {
    co2 * CARBON_PER_CO2 * FUEL_PER_CARBON
}

/// Dot product of bin occupancy (seconds) and per-second rates
pub fn aggregate(hist: &OperatingModeHistogram, table: &RateTable) -> EmissionTotals {
    let sums = hist.to_array().dot(table.rates_per_sec());
    let mut columns = [0.0; N_RATE_COLUMNS];
    for (col, sum) in columns.iter_mut().zip(sums.iter()) {
        *col = *sum;
    }
    EmissionTotals::from_table_columns(columns)
}

/// Absolute trip totals and travel time
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct EmissionRate {
    #[serde(rename = "CO(g)")]
    pub co_g: f64,
    #[serde(rename = "HC(g)")]
    pub hc_g: f64,
    #[serde(rename = "NOx(g)")]
    pub nox_g: f64,
    #[serde(rename = "PM2.5_Ele(g)")]
    pub pm25_ele_g: f64,
    #[serde(rename = "PM2.5_Org(g)")]
    pub pm25_org_g: f64,
    #[serde(rename = "Energy(KJ)")]
    pub energy_kj: f64,
    #[serde(rename = "CO2(g)")]
    pub co2_g: f64,
    #[serde(rename = "Fuel(g)")]
    pub fuel_g: f64,
    #[serde(rename = "TT(s)")]
    pub travel_time_s: f64,
}

impl EmissionRate {
    pub const COLUMNS: [&'static str; 9] = [
        "CO(g)",
        "HC(g)",
        "NOx(g)",
        "PM2.5_Ele(g)",
        "PM2.5_Org(g)",
        "Energy(KJ)",
        "CO2(g)",
        "Fuel(g)",
        "TT(s)",
    ];

    pub fn new(totals: &EmissionTotals, travel_time_s: f64) -> Self {
        Self {
            co_g: totals.co,
            hc_g: totals.hc,
            nox_g: totals.nox,
            pm25_ele_g: totals.pm25_ele,
            pm25_org_g: totals.pm25_org,
            energy_kj: totals.energy,
            co2_g: totals.co2,
            fuel_g: totals.fuel,
            travel_time_s,
        }
    }

    pub fn totals(&self) -> EmissionTotals {
        EmissionTotals {
            co: self.co_g,
            hc: self.hc_g,
            nox: self.nox_g,
            pm25_ele: self.pm25_ele_g,
            pm25_org: self.pm25_org_g,
            energy: self.energy_kj,
            co2: self.co2_g,
            fuel: self.fuel_g,
        }
    }

    /// Row in [`Self::COLUMNS`] order
    pub fn values(&self) -> [f64; 9] {
        let t = self.totals().to_array();
        [t[0], t[1], t[2], t[3], t[4], t[5], t[6], t[7], self.travel_time_s]
    }
}

/// Per-mile trip totals and travel distance
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct EmissionFactor {
    #[serde(rename = "CO(g/mi)")]
    pub co_g_per_mi: f64,
    #[serde(rename = "HC(g/mi)")]
    pub hc_g_per_mi: f64,
    #[serde(rename = "NOx(g/mi)")]
    pub nox_g_per_mi: f64,
    #[serde(rename = "PM2.5_Ele(g/mi)")]
    pub pm25_ele_g_per_mi: f64,
    #[serde(rename = "PM2.5_Org(g/mi)")]
    pub pm25_org_g_per_mi: f64,
    #[serde(rename = "Energy(KJ/mi)")]
    pub energy_kj_per_mi: f64,
    #[serde(rename = "CO2(g/mi)")]
    pub co2_g_per_mi: f64,
    #[serde(rename = "Fuel(g/mi)")]
    pub fuel_g_per_mi: f64,
    #[serde(rename = "TD(mi)")]
    pub travel_distance_mi: f64,
}

impl EmissionFactor {
    pub const COLUMNS: [&'static str; 9] = [
        "CO(g/mi)",
        "HC(g/mi)",
        "NOx(g/mi)",
        "PM2.5_Ele(g/mi)",
        "PM2.5_Org(g/mi)",
        "Energy(KJ/mi)",
        "CO2(g/mi)",
        "Fuel(g/mi)",
        "TD(mi)",
    ];

    /// Normalizes `totals` by distance. Returns `None` when `distance_m` is not
    /// positive and finite, since no per-mile figure exists for such a trip.
    pub fn from_totals(totals: &EmissionTotals, distance_m: f64) -> Option<Self> {
        if !(distance_m.is_finite() && distance_m > 0.0) {
            return None;
        }
        let per_mi = totals.scaled(M_PER_MI / distance_m);
        Some(Self {
            co_g_per_mi: per_mi.co,
            hc_g_per_mi: per_mi.hc,
            nox_g_per_mi: per_mi.nox,
            pm25_ele_g_per_mi: per_mi.pm25_ele,
            pm25_org_g_per_mi: per_mi.pm25_org,
            energy_kj_per_mi: per_mi.energy,
            co2_g_per_mi: per_mi.co2,
            fuel_g_per_mi: per_mi.fuel,
            travel_distance_mi: distance_m / M_PER_MI,
        })
    }

    /// Row in [`Self::COLUMNS`] order
    pub fn values(&self) -> [f64; 9] {
        [
            self.co_g_per_mi,
            self.hc_g_per_mi,
            self.nox_g_per_mi,
            self.pm25_ele_g_per_mi,
            self.pm25_org_g_per_mi,
            self.energy_kj_per_mi,
            self.co2_g_per_mi,
            self.fuel_g_per_mi,
            self.travel_distance_mi,
        ]
    }
}

/// Absolute and per-mile views of one trip. `emission_factor` is `None` for a trip
/// with zero distance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct EmissionResult {
    #[serde(rename = "Emission Rate")]
    pub emission_rate: EmissionRate,
    #[serde(rename = "Emission Factor")]
    pub emission_factor: Option<EmissionFactor>,
}

impl EmissionResult {
    pub fn new(totals: &EmissionTotals, travel_time_s: f64, distance_m: f64) -> Self {
        Self {
            emission_rate: EmissionRate::new(totals, travel_time_s),
            emission_factor: EmissionFactor::from_totals(totals, distance_m),
        }
    }

    /// True when there is no per-mile view
    pub fn is_degenerate(&self) -> bool {
        self.emission_factor.is_none()
    }
}

impl SerdeAPI for EmissionResult {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opmode::OperatingMode;

    fn ramp_table() -> RateTable {
        // rate for (bin, col) is (bin + 1) * (col + 1) per second
        let per_hr = Array2::from_shape_fn((23, 7), |(bin, col)| {
            ((bin + 1) * (col + 1)) as f64 * 3600.0
        });
        RateTable::from_rates_per_hr(per_hr).unwrap()
    }

    #[test]
    fn test_fuel_from_co2() {
        assert!(fuel_from_co2(44.0).approx_eq(&13.78, 1e-12));
        assert_eq!(fuel_from_co2(0.0), 0.0);
    }

    #[test]
    fn test_aggregate() {
        let mut hist = OperatingModeHistogram::new();
        hist.increment(OperatingMode::Idle);
        hist.increment(OperatingMode::Idle);
        hist.increment(OperatingMode::Braking);
        let totals = aggregate(&hist, &ramp_table());
        // 2 s in bin 1 at 2*(col+1) plus 1 s in bin 0 at 1*(col+1)
        assert!(totals.co.approx_eq(&5.0, 1e-9));
        assert!(totals.co2.approx_eq(&35.0, 1e-9));
        assert!(totals.fuel.approx_eq(&fuel_from_co2(35.0), 1e-9));
    }

    #[test]
    fn test_aggregate_empty_histogram_is_zero() {
        let totals = aggregate(&OperatingModeHistogram::new(), &ramp_table());
        assert_eq!(totals, EmissionTotals::default());
    }

    #[test]
    fn test_factor_is_rate_scaled_by_distance() {
        let totals = EmissionTotals::from_table_columns([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let result = EmissionResult::new(&totals, 10.0, 250.0);
        let rate = result.emission_rate.values();
        let factor = result.emission_factor.unwrap().values();
        for col in 0..8 {
            assert!(factor[col].approx_eq(&(rate[col] * M_PER_MI / 250.0), 1e-12));
        }
        assert_eq!(rate[8], 10.0);
        assert!(factor[8].approx_eq(&(250.0 / M_PER_MI), 1e-12));
    }

    #[test]
    fn test_zero_distance_is_degenerate() {
        let result = EmissionResult::new(&EmissionTotals::default(), 5.0, 0.0);
        assert!(result.is_degenerate());
        assert_eq!(result.emission_rate.travel_time_s, 5.0);
    }

    #[test]
    fn test_result_serializes_with_column_names() {
        let totals = EmissionTotals::from_table_columns([1.0; 7]);
        let json = EmissionResult::new(&totals, 3.0, 30.0).to_json().unwrap();
        for column in EmissionRate::COLUMNS.iter().chain(EmissionFactor::COLUMNS.iter()) {
            assert!(json.contains(column), "missing {column}");
        }
        assert!(json.contains("\"Emission Rate\""));
        let degenerate = EmissionResult::new(&totals, 3.0, 0.0).to_json().unwrap();
        assert!(degenerate.contains("\"Emission Factor\":null"));
    }
}
