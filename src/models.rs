use crate::error::{BmxError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// API-imposed upper bound on series per request.
pub const MAX_SERIES_PER_REQUEST: usize = 20;

/// Language of titles and descriptive fields in the response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    /// Spanish, the API's native language.
    Native,
    #[default]
    English,
}

impl Language {
    pub fn locale(&self) -> &'static str {
        match self {
            Language::Native => "es",
            Language::English => "en",
        }
    }
}

/// Server-side transformation applied to the raw levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncrementMode {
    /// Plain levels, no `incremento` parameter.
    #[default]
    Levels,
    /// % change against the previous observation.
    PeriodOverPeriod,
    /// % change against the same period one year earlier.
    YearOverYear,
    /// % change since the last observation of the previous year.
    SinceLastYearEnd,
}

impl IncrementMode {
    /// Value for the `incremento` query parameter, `None` for levels.
    pub fn to_query_param(&self) -> Option<&'static str> {
        match self {
            IncrementMode::Levels => None,
            IncrementMode::PeriodOverPeriod => Some("PorcObsAnt"),
            IncrementMode::YearOverYear => Some("PorcAnual"),
            IncrementMode::SinceLastYearEnd => Some("PorcAcumAnual"),
        }
    }
}

/// Inclusive calendar date range for a data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(BmxError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Path segments in the `/{start}/{end}` form the API expects.
    pub fn to_path(&self) -> String {
        format!(
            "/{}/{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// What slice of history a data request asks for, after resolving
/// the latest-value flag against an optional date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataWindow {
    /// Full history; no path suffix.
    Full,
    Range(DateRange),
    /// Most recent observation only. `overridden` holds a range that was
    /// supplied alongside the flag and ignored.
    Latest { overridden: Option<DateRange> },
}

impl DataWindow {
    pub fn path_suffix(&self) -> String {
        match self {
            DataWindow::Full => String::new(),
            DataWindow::Range(r) => r.to_path(),
            DataWindow::Latest { .. } => "/oportuno".to_string(),
        }
    }
}

/// What to do with observations carrying the API's no-data placeholder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingPolicy {
    /// Any non-numeric value is a [`BmxError::NumericParse`].
    #[default]
    Fail,
    /// Drop placeholder rows (`N/E`, empty); other garbage still fails.
    Skip,
}

/// Parameters of a data request besides the series list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataQuery {
    pub date_range: Option<DateRange>,
    /// Ask the API to trim trailing zeros (`decimales=sinCeros`).
    pub decimals: bool,
    pub increment: IncrementMode,
    pub latest_only: bool,
    pub language: Language,
    pub missing: MissingPolicy,
}

impl DataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn latest(mut self, latest_only: bool) -> Self {
        self.latest_only = latest_only;
        self
    }

    pub fn increment(mut self, increment: IncrementMode) -> Self {
        self.increment = increment;
        self
    }

    pub fn decimals(mut self, decimals: bool) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn missing(mut self, missing: MissingPolicy) -> Self {
        self.missing = missing;
        self
    }

    /// Latest-value mode takes precedence over any date range.
    pub fn window(&self) -> DataWindow {
        match (self.latest_only, self.date_range) {
            (true, overridden) => DataWindow::Latest { overridden },
            (false, Some(r)) => DataWindow::Range(r),
            (false, None) => DataWindow::Full,
        }
    }
}

/// `{"bmx": {"series": [...]}}` success envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub bmx: SeriesList<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeriesList<T> {
    #[serde(default = "Vec::new")]
    pub series: Vec<T>,
}

/// `{"error": {"mensaje": ..., "detalle": ...}}` failure envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiError,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub mensaje: String,
    #[serde(default)]
    pub detalle: String,
}

/// One row of metadata per series, as returned by the API.
///
/// Known fields are typed; anything else the API adds is kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataRecord {
    #[serde(rename = "idSerie")]
    pub series_code: String,
    #[serde(rename = "titulo", default)]
    pub title: String,
    #[serde(rename = "fechaInicio", default)]
    pub start_date: Option<String>,
    #[serde(rename = "fechaFin", default)]
    pub end_date: Option<String>,
    #[serde(rename = "periodicidad", default)]
    pub periodicity: Option<String>,
    #[serde(rename = "cifra", default)]
    pub figure: Option<String>,
    #[serde(rename = "unidad", default)]
    pub unit: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

pub type MetadataTable = Vec<MetadataRecord>;

/// Raw per-series object of a data response.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSeries {
    #[serde(rename = "idSerie")]
    pub series_code: String,
    #[serde(rename = "titulo", default)]
    pub title: String,
    #[serde(default)]
    pub datos: Option<Vec<RawObservation>>,
}

/// Raw `{fecha, dato}` pair, both still in the API's string formats.
#[derive(Debug, Clone, Deserialize)]
pub struct RawObservation {
    pub fecha: String,
    /// Usually a string like `"1,234.56"`; bare numbers are accepted too.
    #[serde(deserialize_with = "de_string_from_string_or_number")]
    pub dato: String,
}

/// Serde helper: read a JSON string or number into its textual form.
fn de_string_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct TextVisitor;

    impl<'de> Visitor<'de> for TextVisitor {
        type Value = String;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or a number")
        }

        fn visit_str<E>(self, s: &str) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(s.to_string())
        }

        fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_f64<E>(self, v: f64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

/// Tidy observation row (one row = one date of one series).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "dato")]
    pub value: f64,
    pub series_name: String,
    pub series_code: String,
}

impl Observation {
    /// Date in `YYYY-MM-DD` form.
    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// All observations of one series, in the order the API returned them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesTable {
    pub series_code: String,
    pub series_name: String,
    pub observations: Vec<Observation>,
}

impl SeriesTable {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.value)
    }
}
