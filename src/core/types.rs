use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::Display;
use uuid::Uuid;

/// Unique identifier for an ingested extraction response.
///
/// Assigned at ingress; derivation results are memoized against it, so a
/// refetched response never aliases a cached bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponseId(Uuid);

impl ResponseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ResponseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user-defined projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectionId(Uuid);

impl ProjectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProjectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tag assigned to a numerical column by header text rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColumnTag {
    Year,
    Projection,
    Other,
}

/// The chart kinds the deriver produces data for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Area,
    Donut,
    Scatter,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Area,
        ChartKind::Donut,
        ChartKind::Scatter,
    ];
}

/// Availability classification for one derived series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SeriesStatus {
    /// Every value missing. The series is dropped from rendering.
    AllNull,
    /// Every present value is exactly zero. Rendered, but flagged so the
    /// Y-axis does not collapse to a degenerate point.
    AllZero,
    Mixed,
}

/// Named percent shortcuts for projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Scenario {
    Lower,
    Base,
    Higher,
    Custom,
}

impl Scenario {
    /// Preset growth rate, if this scenario is one.
    pub fn preset_percent(&self) -> Option<f64> {
        match self {
            Scenario::Lower => Some(-100.0),
            Scenario::Base => Some(0.0),
            Scenario::Higher => Some(100.0),
            Scenario::Custom => None,
        }
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lower" => Ok(Scenario::Lower),
            "base" => Ok(Scenario::Base),
            "higher" => Ok(Scenario::Higher),
            "custom" => Ok(Scenario::Custom),
            _ => Err(format!("Unknown scenario: {s}")),
        }
    }
}
