//! Module containing emission rate tables, vehicle coefficient tables, and the
//! provider interface the pipeline looks them up through.

use std::collections::HashMap;
use std::io::Read;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::EmissionError;
use crate::imports::*;
use crate::params::{N_OPMODES, N_RATE_COLUMNS, S_PER_HR};
use crate::vehicle::{PhysicalCoefficients, VehicleClass};

/// File name of the vehicle coefficient table inside a tables directory
pub const COEFFICIENT_FILE: &str = "VehicleSrcCoeff.csv";

lazy_static! {
    static ref RATE_FILE_REGEX: Regex = Regex::new(r"^EmsRate_(\d+)\.csv$").unwrap();
}

/// Name of the rate table file for `class`, e.g. `EmsRate_1.csv`
pub fn rate_file_name(class: VehicleClass) -> String {
    format!("EmsRate_{}.csv", class.code())
}

/// Physical coefficients keyed by vehicle class
pub type CoefficientTable = HashMap<VehicleClass, PhysicalCoefficients>;

/// Lookup of per-class physical coefficients and emission rate tables
pub trait TableProvider {
    /// Road-load coefficients (A, B, C, M, f) for `class`
    fn coefficients(&self, class: VehicleClass) -> Result<PhysicalCoefficients, EmissionError>;

    /// Emission rate table for `class`
    fn rate_table(&self, class: VehicleClass) -> Result<&RateTable, EmissionError>;
}

/// Emission rates for the 23 operating modes (rows, in bin order) and 7
/// pollutant/energy quantities (columns: CO, HC, NOx, PM2.5 elemental, PM2.5 organic,
/// energy, CO2). Stored per second.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RateTable {
    rates_per_sec: Array2<f64>,
}

impl RateTable {
    /// Builds a table from per-hour rates, converting them to per-second rates
    pub fn from_rates_per_hr(rates_per_hr: Array2<f64>) -> anyhow::Result<Self> {
        ensure!(
            rates_per_hr.dim() == (N_OPMODES, N_RATE_COLUMNS),
            "Rate table must be {N_OPMODES}x{N_RATE_COLUMNS}, got {:?}",
            rates_per_hr.dim()
        );
        ensure!(
            rates_per_hr.iter().all(|x| x.is_finite()),
            "Rate table contains non-finite values"
        );
        Ok(Self {
            rates_per_sec: rates_per_hr / S_PER_HR,
        })
    }

    /// Reads a header-less CSV table with 23 rows and 8 columns. The first column is
    /// reserved and ignored; the remaining 7 are per-hour rates.
    pub fn from_csv_reader<R: Read>(rdr: R) -> anyhow::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(rdr);
        let mut values: Vec<f64> = Vec::with_capacity(N_OPMODES * N_RATE_COLUMNS);
        let mut n_rows = 0;
        for (row, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("Could not read rate table row {row}"))?;
            ensure!(
                record.len() == N_RATE_COLUMNS + 1,
                "Rate table row {row} has {} columns, expected {}",
                record.len(),
                N_RATE_COLUMNS + 1
            );
            for (col, field) in record.iter().enumerate().skip(1) {
                values.push(field.parse::<f64>().with_context(|| {
                    format!("Could not parse rate table value {field:?} at row {row}, column {col}")
                })?);
            }
            n_rows += 1;
        }
        ensure!(
            n_rows == N_OPMODES,
            "Rate table has {n_rows} rows, expected one per operating mode ({N_OPMODES})"
        );
        let rates_per_hr = Array2::from_shape_vec((N_OPMODES, N_RATE_COLUMNS), values)
            .with_context(|| format_dbg!())?;
        Self::from_rates_per_hr(rates_per_hr)
    }

    pub fn from_csv_file<P: AsRef<Path>>(filepath: P) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        let file = File::open(filepath)
            .with_context(|| format!("Could not open rate table: {filepath:?}"))?;
        Self::from_csv_reader(file).with_context(|| format!("Invalid rate table: {filepath:?}"))
    }

    /// Per-second rates, 23x7
    pub fn rates_per_sec(&self) -> &Array2<f64> {
        &self.rates_per_sec
    }

    /// Per-hour rates, 23x7, as they appear in the source table
    pub fn rates_per_hr(&self) -> Array2<f64> {
        &self.rates_per_sec * S_PER_HR
    }
}

/// One row of the coefficient table
#[derive(Deserialize, Debug)]
#[allow(non_snake_case)]
struct CoefficientRecord {
    VehicleType: i64,
    A: f64,
    B: f64,
    C: f64,
    M: f64,
    f: f64,
}

/// Reads a coefficient table with header `VehicleType,A,B,C,M,f`. Rows for vehicle
/// types without a [`VehicleClass`] are skipped.
pub fn read_coefficients_csv<R: Read>(rdr: R) -> anyhow::Result<CoefficientTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr);
    let mut coefficients = HashMap::new();
    for (row, result) in rdr.deserialize::<CoefficientRecord>().enumerate() {
        let record = result.with_context(|| format!("Could not read coefficient row {row}"))?;
        let class = match VehicleClass::try_from(record.VehicleType) {
            Ok(class) => class,
            Err(_) => {
                log::debug!(
                    "skipping coefficients for unsupported vehicle type {}",
                    record.VehicleType
                );
                continue;
            }
        };
        let coeffs = PhysicalCoefficients {
            A: record.A,
            B: record.B,
            C: record.C,
            M: record.M,
            f: record.f,
        };
        coeffs
            .validate()
            .with_context(|| format!("Coefficient row {row}"))?;
        ensure!(
            coefficients.insert(class, coeffs).is_none(),
            "Duplicate coefficients for vehicle class {class}"
        );
    }
    Ok(coefficients)
}

/// In-memory table provider keyed by vehicle class. Loaded once, then shared read-only
/// between trips.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSet {
    coefficients: CoefficientTable,
    rate_tables: HashMap<VehicleClass, RateTable>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coefficients(mut self, class: VehicleClass, coeffs: PhysicalCoefficients) -> Self {
        self.insert_coefficients(class, coeffs);
        self
    }

    pub fn with_rate_table(mut self, class: VehicleClass, table: RateTable) -> Self {
        self.insert_rate_table(class, table);
        self
    }

    pub fn insert_coefficients(&mut self, class: VehicleClass, coeffs: PhysicalCoefficients) {
        self.coefficients.insert(class, coeffs);
    }

    pub fn insert_rate_table(&mut self, class: VehicleClass, table: RateTable) {
        self.rate_tables.insert(class, table);
    }

    /// Coefficients shipped with the crate
    #[cfg(feature = "resources")]
    pub fn default_coefficients() -> anyhow::Result<CoefficientTable> {
        read_coefficients_csv(crate::resources::vehicle_src_coeff_csv()?)
            .context("Invalid built-in coefficient table")
    }

    /// Coefficients and rate tables for every class, all shipped with the crate
    #[cfg(feature = "resources")]
    pub fn builtin() -> anyhow::Result<Self> {
        let mut tables = Self {
            coefficients: Self::default_coefficients()?,
            rate_tables: HashMap::new(),
        };
        for class in VehicleClass::ALL {
            let table = RateTable::from_csv_reader(crate::resources::rate_table_csv(class)?)
                .with_context(|| format!("Invalid built-in {}", rate_file_name(class)))?;
            tables.insert_rate_table(class, table);
        }
        log::info!("using built-in tables for {} vehicle class(es)", tables.classes().len());
        Ok(tables)
    }

    /// Loads every `EmsRate_<class>.csv` in `dir` along with `VehicleSrcCoeff.csv`.
    /// When the directory has no coefficient file, the built-in coefficients are used
    /// (requires the `resources` feature).
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        ensure!(dir.is_dir(), "Tables directory not found: {dir:?}");

        let coeff_path = dir.join(COEFFICIENT_FILE);
        let coefficients = if coeff_path.exists() {
            let file = File::open(&coeff_path)
                .with_context(|| format!("Could not open coefficient table: {coeff_path:?}"))?;
            read_coefficients_csv(file)
                .with_context(|| format!("Invalid coefficient table: {coeff_path:?}"))?
        } else {
            Self::fallback_coefficients(dir)?
        };

        let mut rate_tables = HashMap::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Could not read tables directory: {dir:?}"))?
        {
            let path = entry?.path();
            let code = match path
                .file_name()
                .and_then(OsStr::to_str)
                .and_then(|name| RATE_FILE_REGEX.captures(name))
            {
                Some(caps) => caps[1].parse::<i64>()?,
                None => continue,
            };
            match VehicleClass::try_from(code) {
                Ok(class) => {
                    rate_tables.insert(class, RateTable::from_csv_file(&path)?);
                }
                Err(err) => log::warn!("ignoring {path:?}: {err}"),
            }
        }

        for class in VehicleClass::ALL {
            if !rate_tables.contains_key(&class) {
                log::debug!("no {} in {dir:?}", rate_file_name(class));
            }
        }
        log::info!(
            "loaded coefficients for {} and rate tables for {} vehicle class(es) from {dir:?}",
            coefficients.len(),
            rate_tables.len()
        );
        Ok(Self {
            coefficients,
            rate_tables,
        })
    }

    #[cfg(feature = "resources")]
    fn fallback_coefficients(dir: &Path) -> anyhow::Result<CoefficientTable> {
        log::info!("no {COEFFICIENT_FILE} in {dir:?}, using built-in coefficients");
        Self::default_coefficients()
    }

    #[cfg(not(feature = "resources"))]
    fn fallback_coefficients(dir: &Path) -> anyhow::Result<CoefficientTable> {
        bail!("{COEFFICIENT_FILE} not found in {dir:?}")
    }

    /// Classes with both coefficients and a rate table
    pub fn classes(&self) -> Vec<VehicleClass> {
        let mut classes: Vec<VehicleClass> = self
            .coefficients
            .keys()
            .filter(|class| self.rate_tables.contains_key(class))
            .copied()
            .collect();
        classes.sort();
        classes
    }
}

impl TableProvider for TableSet {
    fn coefficients(&self, class: VehicleClass) -> Result<PhysicalCoefficients, EmissionError> {
        self.coefficients
            .get(&class)
            .copied()
            .ok_or(EmissionError::UnknownVehicleClass(class))
    }

    fn rate_table(&self, class: VehicleClass) -> Result<&RateTable, EmissionError> {
        self.rate_tables
            .get(&class)
            .ok_or(EmissionError::UnknownVehicleClass(class))
    }
}

/// Light-duty tables with real coefficients and a rate of `(bin + 1) * (col + 1)` per
/// second; no heavy-duty tables.
#[cfg(test)]
pub(crate) fn mock_tables() -> TableSet {
    let per_hr = Array2::from_shape_fn((N_OPMODES, N_RATE_COLUMNS), |(bin, col)| {
        ((bin + 1) * (col + 1)) as f64 * S_PER_HR
    });
    TableSet::new()
        .with_coefficients(
            VehicleClass::LightDuty,
            PhysicalCoefficients {
                A: 0.156461,
                B: 0.002002,
                C: 0.000493,
                M: 1.4788,
                f: 1.4788,
            },
        )
        .with_rate_table(
            VehicleClass::LightDuty,
            RateTable::from_rates_per_hr(per_hr).unwrap(),
        )
}
