use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Milliseconds since the Unix epoch.
///
/// The query API reports timestamps as floating point seconds; they are kept
/// at millisecond precision, which is what Prometheus stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Convert fractional Unix seconds, rounding to the nearest millisecond.
    pub fn from_unix_seconds(seconds: f64) -> Self {
        Self((seconds * 1000.0).round() as i64)
    }

    /// Calendar representation, or `None` when out of chrono's range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.timestamp_millis())
    }
}

/// Seconds with the shortest fraction that represents the value, e.g. `1`
/// or `1435781451.781`.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 as f64 / 1000.0)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        Ok(Self::from_unix_seconds(seconds))
    }
}

/// A sample value as encoded by the query API.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleValue(pub f64);

impl SampleValue {
    pub fn get(self) -> f64 {
        self.0
    }
}

impl FromStr for SampleValue {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = match s {
            "+Inf" | "Inf" => f64::INFINITY,
            "-Inf" => f64::NEG_INFINITY,
            "NaN" => f64::NAN,
            other => other.parse()?,
        };
        Ok(Self(value))
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value.is_nan() {
            f.write_str("NaN")
        } else if value.is_infinite() {
            f.write_str(if value > 0.0 { "+Inf" } else { "-Inf" })
        } else {
            write!(f, "{value}")
        }
    }
}

impl<'de> Deserialize<'de> for SampleValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|e| de::Error::custom(format!("invalid sample value {raw:?}: {e}")))
    }
}

/// Label set identifying a series. Ordered by label name so the display
/// form is stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// `{__name__="up", job="api"}`; values are quoted and escaped.
impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value:?}")?;
        }
        f.write_str("}")
    }
}

/// A `[timestamp, "value"]` pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplePair {
    pub timestamp: Timestamp,
    pub value: SampleValue,
}

impl<'de> Deserialize<'de> for SamplePair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (timestamp, value) = <(Timestamp, SampleValue)>::deserialize(deserializer)?;
        Ok(Self { timestamp, value })
    }
}

/// One series of a range query result.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub metric: Labels,
    #[serde(default)]
    pub values: Vec<SamplePair>,
}

/// One element of an instant vector.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "RawSample")]
pub struct Sample {
    pub metric: Labels,
    pub timestamp: Timestamp,
    pub value: SampleValue,
}

#[derive(Deserialize)]
struct RawSample {
    #[serde(default)]
    metric: Labels,
    value: SamplePair,
}

impl From<RawSample> for Sample {
    fn from(raw: RawSample) -> Self {
        Self {
            metric: raw.metric,
            timestamp: raw.value.timestamp,
            value: raw.value.value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(from = "SamplePair")]
pub struct Scalar {
    pub timestamp: Timestamp,
    pub value: SampleValue,
}

impl From<SamplePair> for Scalar {
    fn from(pair: SamplePair) -> Self {
        Self {
            timestamp: pair.timestamp,
            value: pair.value,
        }
    }
}

/// Decoded `data.result` of a query response.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryResult {
    Matrix(Vec<Series>),
    Vector(Vec<Sample>),
    Scalar(Scalar),
}

impl QueryResult {
    /// The `resultType` this result was decoded from.
    pub fn result_type(&self) -> &'static str {
        match self {
            QueryResult::Matrix(_) => "matrix",
            QueryResult::Vector(_) => "vector",
            QueryResult::Scalar(_) => "scalar",
        }
    }
}
