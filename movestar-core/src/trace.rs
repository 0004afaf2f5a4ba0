//! Module containing the speed trace that feeds the emission pipeline, with CSV, YAML
//! and JSON I/O and conversion from other speed units.

use crate::imports::*;
use crate::params::{KPH_PER_MPS, MPH_PER_MPS_COARSE};

/// Unit of speed values in an input trace
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedUnit {
    #[default]
    #[serde(rename = "mps", alias = "m/s")]
    MetersPerSecond,
    #[serde(rename = "kph", alias = "km/h")]
    KilometersPerHour,
    #[serde(rename = "mph")]
    MilesPerHour,
}

impl SpeedUnit {
    /// Converts `speed` in this unit to m/s
    pub fn to_mps(self, speed: f64) -> f64 {
        match self {
            Self::MetersPerSecond => speed,
            Self::KilometersPerHour => speed / KPH_PER_MPS,
            Self::MilesPerHour => speed / MPH_PER_MPS_COARSE,
        }
    }
}

/// One row of a speed trace CSV file
#[derive(Default, PartialEq, Clone, Debug, Deserialize, Serialize)]
pub struct SpeedTraceElement {
    /// time [s]
    #[serde(rename = "Time", alias = "time_s")]
    pub time_s: f64,
    /// speed [m/s]
    #[serde(rename = "Speed", alias = "mps")]
    pub mps: f64,
}

/// Time-stamped speed samples, m/s
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SpeedTrace {
    /// time [s]
    pub time_s: Array1<f64>,
    /// speed [m/s]
    pub mps: Array1<f64>,
    #[serde(default)]
    pub name: String,
}

impl SerdeAPI for SpeedTrace {
    const ACCEPTED_BYTE_FORMATS: &'static [&'static str] = &["yaml", "json", "csv"];
    const ACCEPTED_STR_FORMATS: &'static [&'static str] = &["yaml", "json", "csv"];

    fn init(&mut self) -> anyhow::Result<()> {
        self.init_checks()
    }

    fn to_writer<W: std::io::Write>(&self, wtr: W, format: &str) -> anyhow::Result<()> {
        match format_key(format).as_str() {
            "yaml" | "yml" => serde_yaml::to_writer(wtr, self)?,
            "json" => serde_json::to_writer(wtr, self)?,
            "csv" => {
                let mut wtr = csv::Writer::from_writer(wtr);
                for (time_s, mps) in self.time_s.iter().zip(self.mps.iter()) {
                    wtr.serialize(SpeedTraceElement {
                        time_s: *time_s,
                        mps: *mps,
                    })?;
                }
                wtr.flush()?
            }
            _ => bail!(
                "Unsupported format {format:?}, must be one of {:?}",
                Self::ACCEPTED_BYTE_FORMATS
            ),
        }
        Ok(())
    }

    fn to_str(&self, format: &str) -> anyhow::Result<String> {
        Ok(
            match format_key(format).as_str() {
                "yaml" | "yml" => self.to_yaml()?,
                "json" => self.to_json()?,
                "csv" => self.to_csv()?,
                _ => bail!(
                    "Unsupported format {format:?}, must be one of {:?}",
                    Self::ACCEPTED_STR_FORMATS
                ),
            },
        )
    }

    fn from_str<S: AsRef<str>>(contents: S, format: &str) -> anyhow::Result<Self> {
        Ok(
            match format_key(format).as_str() {
                "yaml" | "yml" => Self::from_yaml(contents)?,
                "json" => Self::from_json(contents)?,
                "csv" => Self::from_reader(contents.as_ref().as_bytes(), "csv")?,
                _ => bail!(
                    "Unsupported format {format:?}, must be one of {:?}",
                    Self::ACCEPTED_STR_FORMATS
                ),
            },
        )
    }

    fn from_reader<R: std::io::Read>(rdr: R, format: &str) -> anyhow::Result<Self> {
        let mut deserialized = match format_key(format).as_str() {
            "yaml" | "yml" => serde_yaml::from_reader(rdr)?,
            "json" => serde_json::from_reader(rdr)?,
            "csv" => {
                let mut rdr = csv::ReaderBuilder::new()
                    .trim(csv::Trim::All)
                    .from_reader(rdr);
                let mut time_s = Vec::new();
                let mut mps = Vec::new();
                for (row, result) in rdr.deserialize::<SpeedTraceElement>().enumerate() {
                    let elem =
                        result.with_context(|| format!("Could not parse speed trace row {row}"))?;
                    time_s.push(elem.time_s);
                    mps.push(elem.mps);
                }
                Self {
                    time_s: Array1::from_vec(time_s),
                    mps: Array1::from_vec(mps),
                    name: String::default(),
                }
            }
            _ => bail!(
                "Unsupported format {format:?}, must be one of {:?}",
                Self::ACCEPTED_BYTE_FORMATS
            ),
        };
        deserialized.init()?;
        Ok(deserialized)
    }
}

impl SpeedTrace {
    /// Builds a trace from parallel time and speed samples, converting speeds to m/s
    pub fn new(time_s: Vec<f64>, speed: Vec<f64>, unit: SpeedUnit) -> anyhow::Result<Self> {
        let mut trace = Self {
            time_s: Array1::from_vec(time_s),
            mps: speed.into_iter().map(|v| unit.to_mps(v)).collect(),
            name: String::default(),
        };
        trace.init()?;
        Ok(trace)
    }

    /// Builds a 1 Hz trace starting at t = 0 s
    pub fn from_speeds(speed: &[f64], unit: SpeedUnit) -> anyhow::Result<Self> {
        let time_s = (0..speed.len()).map(|i| i as f64).collect();
        Self::new(time_s, speed.to_vec(), unit)
    }

    /// Load trace from a CSV, YAML or JSON file, naming it after the file stem
    pub fn from_file_named<P: AsRef<Path>>(filepath: P) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        let mut trace = Self::from_file(filepath)
            .with_context(|| format!("Invalid speed trace: {filepath:?}"))?;
        if trace.name.is_empty() {
            if let Some(stem) = filepath.file_stem().and_then(OsStr::to_str) {
                trace.name = stem.to_string();
            }
        }
        Ok(trace)
    }

    fn init_checks(&self) -> anyhow::Result<()> {
        ensure!(!self.is_empty(), "Speed trace is empty");
        ensure!(
            self.time_s.len() == self.mps.len(),
            "Speed trace has unequal field lengths\ntime_s: {}\nmps: {}",
            self.time_s.len(),
            self.mps.len()
        );
        ensure!(
            self.time_s.windows(2).into_iter().all(|w| w[0] < w[1]),
            "Speed trace time is not strictly increasing"
        );
        Ok(())
    }

    /// Write (serialize) trace to a CSV string
    pub fn to_csv(&self) -> anyhow::Result<String> {
        let mut buf = Vec::with_capacity(self.len());
        self.to_writer(&mut buf, "csv")?;
        Ok(String::from_utf8(buf)?)
    }

    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_s.is_empty()
    }

    /// Whether consecutive samples are one second apart, within `1e-6` s
    pub fn is_one_hz(&self) -> bool {
        self.time_s
            .windows(2)
            .into_iter()
            .all(|w| ((w[1] - w[0]) - 1.0).abs() < 1e-6)
    }

    /// Collapses sub-second samples into one sample per whole second: samples are
    /// grouped by `floor(time_s)` and each group contributes its mean speed.
    pub fn to_second_by_second(&self) -> Self {
        let mut time_s: Vec<f64> = Vec::new();
        let mut mps: Vec<f64> = Vec::new();
        let mut group_len = 0usize;
        for (t, v) in self.time_s.iter().zip(self.mps.iter()) {
            let second = t.floor();
            match time_s.last() {
                Some(last) if *last == second => {
                    group_len += 1;
                    if let Some(sum) = mps.last_mut() {
                        *sum += v;
                    }
                }
                _ => {
                    if let Some(sum) = mps.last_mut() {
                        *sum /= group_len as f64;
                    }
                    time_s.push(second);
                    mps.push(*v);
                    group_len = 1;
                }
            }
        }
        if let Some(sum) = mps.last_mut() {
            *sum /= group_len as f64;
        }
        Self {
            time_s: Array1::from_vec(time_s),
            mps: Array1::from_vec(mps),
            name: self.name.clone(),
        }
    }

    /// Speeds as a plain slice-backed vector, m/s
    pub fn speeds(&self) -> Vec<f64> {
        self.mps.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_unit_to_mps() {
        assert_eq!(SpeedUnit::MetersPerSecond.to_mps(10.0), 10.0);
        assert!(SpeedUnit::KilometersPerHour.to_mps(36.0).approx_eq(&10.0, 1e-12));
        assert!(SpeedUnit::MilesPerHour.to_mps(22.37).approx_eq(&10.0, 1e-12));
    }

    #[test]
    fn test_csv_round_trip_with_headers() {
        let csv = "Time,Speed\n0,0.0\n1,2.5\n2,5.0\n";
        let trace = SpeedTrace::from_str(csv, "csv").unwrap();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace.mps, array![0.0, 2.5, 5.0]);
        let written = trace.to_csv().unwrap();
        assert!(written.starts_with("Time,Speed"));
        assert_eq!(SpeedTrace::from_str(written, "csv").unwrap(), trace);
    }

    #[test]
    fn test_str_serde() {
        let trace = SpeedTrace::from_speeds(&[0.0, 1.0, 2.0], SpeedUnit::MetersPerSecond).unwrap();
        for format in SpeedTrace::ACCEPTED_STR_FORMATS {
            let serialized = trace.to_str(format).unwrap();
            let deserialized = SpeedTrace::from_str(&serialized, format).unwrap();
            assert_eq!(deserialized.mps, trace.mps);
            assert_eq!(deserialized.time_s, trace.time_s);
        }
    }

    #[test]
    fn test_init_checks() {
        assert!(SpeedTrace::from_speeds(&[], SpeedUnit::MetersPerSecond).is_err());
        assert!(SpeedTrace::new(vec![0.0, 1.0, 1.0], vec![0.0; 3], SpeedUnit::MetersPerSecond).is_err());
        assert!(SpeedTrace::new(vec![0.0, 1.0], vec![0.0; 3], SpeedUnit::MetersPerSecond).is_err());
        assert!(SpeedTrace::from_str("Time,Speed\n1,0\n0,0\n", "csv").is_err());
    }

    #[test]
    fn test_to_second_by_second() {
        let trace = SpeedTrace::new(
            vec![0.0, 0.5, 1.0, 1.25, 1.5, 3.2],
            vec![1.0, 3.0, 2.0, 4.0, 6.0, 7.0],
            SpeedUnit::MetersPerSecond,
        )
        .unwrap();
        let resampled = trace.to_second_by_second();
        assert_eq!(resampled.time_s, array![0.0, 1.0, 3.0]);
        assert!(resampled.speeds().approx_eq(&vec![2.0, 4.0, 7.0], 1e-12));
    }

    #[test]
    fn test_is_one_hz() {
        let trace = SpeedTrace::from_speeds(&[0.0, 1.0, 2.0], SpeedUnit::MetersPerSecond).unwrap();
        assert!(trace.is_one_hz());
        let half_hz =
            SpeedTrace::new(vec![0.0, 0.5, 1.0], vec![0.0; 3], SpeedUnit::MetersPerSecond)
                .unwrap();
        assert!(!half_hz.is_one_hz());
        assert!(half_hz.to_second_by_second().is_one_hz());
        let gap = SpeedTrace::new(vec![0.0, 1.0, 3.0], vec![0.0; 3], SpeedUnit::MetersPerSecond)
            .unwrap();
        assert!(!gap.is_one_hz());
    }

    #[test]
    fn test_from_speeds_converts_units() {
        let trace = SpeedTrace::from_speeds(&[0.0, 36.0], SpeedUnit::KilometersPerHour).unwrap();
        assert_eq!(trace.time_s, array![0.0, 1.0]);
        assert!(trace.mps[1].approx_eq(&10.0, 1e-12));
    }
}
