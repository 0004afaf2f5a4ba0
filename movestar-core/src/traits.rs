use crate::imports::*;

/// Lower-cased format name without a leading dot, so `".YML"` reads as `"yml"`
pub(crate) fn format_key(format: &str) -> String {
    format.trim_start_matches('.').to_lowercase()
}

fn file_extension(filepath: &Path) -> anyhow::Result<&str> {
    filepath
        .extension()
        .and_then(OsStr::to_str)
        .with_context(|| format!("File extension could not be parsed: {filepath:?}"))
}

/// YAML/JSON persistence for inputs and results. Every read runs [`SerdeAPI::init`],
/// so a deserialized value has passed the same checks as one built in code.
pub trait SerdeAPI: Serialize + for<'a> Deserialize<'a> {
    const ACCEPTED_BYTE_FORMATS: &'static [&'static str] = &["yaml", "json"];
    const ACCEPTED_STR_FORMATS: &'static [&'static str] = &["yaml", "json"];

    /// Validation run after every read
    fn init(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Writes to `filepath`, picking the format from its extension. Truncates an
    /// existing file.
    fn to_file<P: AsRef<Path>>(&self, filepath: P) -> anyhow::Result<()> {
        let filepath = filepath.as_ref();
        let extension = file_extension(filepath)?;
        let file = File::create(filepath)
            .with_context(|| format!("Could not create file: {filepath:?}"))?;
        self.to_writer(file, extension)
    }

    fn to_writer<W: std::io::Write>(&self, wtr: W, format: &str) -> anyhow::Result<()> {
        match format_key(format).as_str() {
            "yaml" | "yml" => serde_yaml::to_writer(wtr, self)?,
            "json" => serde_json::to_writer(wtr, self)?,
            _ => bail!(
                "Unsupported format {format:?}, must be one of {:?}",
                Self::ACCEPTED_BYTE_FORMATS
            ),
        }
        Ok(())
    }

    /// Reads from `filepath`, picking the format from its extension
    fn from_file<P: AsRef<Path>>(filepath: P) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        let extension = file_extension(filepath)?;
        ensure!(filepath.exists(), "File not found: {filepath:?}");
        let file =
            File::open(filepath).with_context(|| format!("Could not open file: {filepath:?}"))?;
        Self::from_reader(file, extension)
    }

    fn to_str(&self, format: &str) -> anyhow::Result<String> {
        match format_key(format).as_str() {
            "yaml" | "yml" => self.to_yaml(),
            "json" => self.to_json(),
            _ => bail!(
                "Unsupported format {format:?}, must be one of {:?}",
                Self::ACCEPTED_STR_FORMATS
            ),
        }
    }

    fn from_str<S: AsRef<str>>(contents: S, format: &str) -> anyhow::Result<Self> {
        match format_key(format).as_str() {
            "yaml" | "yml" => Self::from_yaml(contents),
            "json" => Self::from_json(contents),
            _ => bail!(
                "Unsupported format {format:?}, must be one of {:?}",
                Self::ACCEPTED_STR_FORMATS
            ),
        }
    }

    fn from_reader<R: std::io::Read>(rdr: R, format: &str) -> anyhow::Result<Self> {
        let mut value: Self = match format_key(format).as_str() {
            "yaml" | "yml" => serde_yaml::from_reader(rdr)?,
            "json" => serde_json::from_reader(rdr)?,
            _ => bail!(
                "Unsupported format {format:?}, must be one of {:?}",
                Self::ACCEPTED_BYTE_FORMATS
            ),
        };
        value.init()?;
        Ok(value)
    }

    fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(&self)?)
    }

    fn from_json<S: AsRef<str>>(json_str: S) -> anyhow::Result<Self> {
        let mut value: Self = serde_json::from_str(json_str.as_ref())?;
        value.init()?;
        Ok(value)
    }

    fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(&self)?)
    }

    fn from_yaml<S: AsRef<str>>(yaml_str: S) -> anyhow::Result<Self> {
        let mut value: Self = serde_yaml::from_str(yaml_str.as_ref())?;
        value.init()?;
        Ok(value)
    }
}

/// Equality within a relative or absolute tolerance
pub trait ApproxEq<Rhs = Self> {
    fn approx_eq(&self, other: &Rhs, tol: f64) -> bool;
}

impl ApproxEq for f64 {
    fn approx_eq(&self, other: &f64, tol: f64) -> bool {
        ((other - self) / (self + other)).abs() < tol || (other - self).abs() < tol
    }
}

impl<T: ApproxEq> ApproxEq for Vec<T> {
    fn approx_eq(&self, other: &Vec<T>, tol: f64) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(x, y)| x.approx_eq(y, tol))
    }
}
