//! Module containing the vehicle class enumeration and the physical coefficients used
//! in the VSP formula.

use std::fmt;

use crate::error::EmissionError;
use crate::imports::*;

/// Vehicle classes with MOVESTAR tables
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "i64", into = "i64")]
pub enum VehicleClass {
    /// light-duty passenger car (MOVES source type 21)
    LightDuty,
    /// combination short-haul truck (MOVES source type 61)
    HeavyDuty,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 2] = [VehicleClass::LightDuty, VehicleClass::HeavyDuty];

    /// Integer code used in table file names and on the command line
    pub fn code(&self) -> i64 {
        match self {
            Self::LightDuty => 1,
            Self::HeavyDuty => 2,
        }
    }
}

impl TryFrom<i64> for VehicleClass {
    type Error = EmissionError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::LightDuty),
            2 => Ok(Self::HeavyDuty),
            _ => Err(EmissionError::InvalidVehicleClass(code)),
        }
    }
}

impl From<VehicleClass> for i64 {
    fn from(class: VehicleClass) -> Self {
        class.code()
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Road-load regression coefficients and mass factor for one vehicle class.
/// Field names follow the MOVES source-type physics table.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[allow(non_snake_case)]
pub struct PhysicalCoefficients {
    /// rolling term, kW-s/m
    pub A: f64,
    /// rotating term, kW-s^2/m^2
    pub B: f64,
    /// drag term, kW-s^3/m^3
    pub C: f64,
    /// source mass, metric tons
    pub M: f64,
    /// fixed mass factor, metric tons
    pub f: f64,
}

impl PhysicalCoefficients {
    /// Checks that every coefficient is finite
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            [self.A, self.B, self.C, self.M, self.f]
                .iter()
                .all(|x| x.is_finite()),
            "Physical coefficients must be finite: {self:?}"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_class_codes() {
        for class in VehicleClass::ALL {
            assert_eq!(VehicleClass::try_from(class.code()).unwrap(), class);
        }
        assert_eq!(
            VehicleClass::try_from(3),
            Err(EmissionError::InvalidVehicleClass(3))
        );
        assert_eq!(
            VehicleClass::try_from(0),
            Err(EmissionError::InvalidVehicleClass(0))
        );
    }

    #[test]
    fn test_vehicle_class_serde_as_code() {
        assert_eq!(serde_json::to_string(&VehicleClass::HeavyDuty).unwrap(), "2");
        let class: VehicleClass = serde_json::from_str("1").unwrap();
        assert_eq!(class, VehicleClass::LightDuty);
        assert!(serde_json::from_str::<VehicleClass>("7").is_err());
    }

    #[test]
    fn test_coefficients_validate() {
        let coeffs = PhysicalCoefficients {
            A: 0.156461,
            B: 0.002002,
            C: 0.000493,
            M: 1.4788,
            f: 1.4788,
        };
        assert!(coeffs.validate().is_ok());
        let bad = PhysicalCoefficients { C: f64::NAN, ..coeffs };
        assert!(bad.validate().is_err());
    }
}
