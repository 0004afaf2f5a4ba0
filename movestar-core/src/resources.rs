use include_dir::{include_dir, Dir};

use crate::tables::rate_file_name;
use crate::vehicle::VehicleClass;

pub const RESOURCES_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/resources");

/// File name of the vehicle source coefficient table
pub const VEHICLE_SRC_COEFF_FILE: &str = "VehicleSrcCoeff.csv";

fn resource_contents(name: &str) -> anyhow::Result<&'static [u8]> {
    RESOURCES_DIR
        .get_file(name)
        .map(|file| file.contents())
        .ok_or_else(|| anyhow::anyhow!("File not found in resources: {name:?}"))
}

/// Contents of the built-in vehicle source coefficient table
pub fn vehicle_src_coeff_csv() -> anyhow::Result<&'static [u8]> {
    resource_contents(VEHICLE_SRC_COEFF_FILE)
}

/// Contents of the built-in `EmsRate_<class>.csv` for `class`.
///
/// Rates come from the MOVESTAR VISSIM plugin (MOVES source type 100 for light duty,
/// 300 for heavy duty). That data has a single PM2.5 column, which is stored as
/// PM2.5 organic; the elemental column is zero.
pub fn rate_table_csv(class: VehicleClass) -> anyhow::Result<&'static [u8]> {
    resource_contents(&rate_file_name(class))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_src_coeff_is_embedded() {
        let contents = vehicle_src_coeff_csv().unwrap();
        assert!(std::str::from_utf8(contents)
            .unwrap()
            .starts_with("VehicleType,A,B,C,M,f"));
    }

    #[test]
    fn test_rate_tables_are_embedded_for_every_class() {
        for class in VehicleClass::ALL {
            let contents = std::str::from_utf8(rate_table_csv(class).unwrap()).unwrap();
            assert_eq!(contents.lines().count(), 23);
            // first column holds the MOVES opMode id
            assert!(contents.starts_with("0,"));
            assert!(contents.lines().last().unwrap().starts_with("40,"));
        }
    }
}
