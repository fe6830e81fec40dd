//! Scenario projections: user-defined compound-growth extrapolations of a
//! numerical series beyond its last real observation.

use crate::core::types::{ProjectionId, Scenario};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Label used when the base series has no X positions left to project into.
pub const NEXT_PERIOD_LABEL: &str = "Next period";

pub const PERCENT_MIN: f64 = -100.0;
pub const PERCENT_MAX: f64 = 100.0;

/// A user-defined projection over one base numerical column.
///
/// Lifecycle is session-only: created, edited and removed by explicit user
/// action, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub id: ProjectionId,
    pub name: String,
    /// Percent change per step, clamped to `[-100, 100]` at input time.
    pub percent: f64,
    pub scenario: Scenario,
    /// Header of the base numerical column this projection extends.
    pub column: String,
}

/// The projections active in one session, with unique names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSet {
    items: Vec<Projection>,
    revision: u64,
}

impl ProjectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic edit counter, used as memoization identity.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projection> {
        self.items.iter()
    }

    pub fn get(&self, id: ProjectionId) -> Option<&Projection> {
        self.items.iter().find(|p| p.id == id)
    }

    /// Add a projection at the base scenario. The name is de-duplicated
    /// against the active set by auto-suffixing.
    pub fn add(&mut self, name: &str, column: &str) -> ProjectionId {
        let id = ProjectionId::new();
        let unique = self.unique_name(name, None);
        self.items.push(Projection {
            id,
            name: unique,
            percent: 0.0,
            scenario: Scenario::Base,
            column: column.to_string(),
        });
        self.revision += 1;
        id
    }

    /// Rename a projection, keeping names unique via auto-suffix.
    pub fn rename(&mut self, id: ProjectionId, name: &str) -> bool {
        let unique = self.unique_name(name, Some(id));
        let Some(item) = self.items.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        item.name = unique;
        self.revision += 1;
        true
    }

    /// Set the growth rate directly. Clamps to the allowed range and flips
    /// the scenario to custom.
    pub fn set_percent(&mut self, id: ProjectionId, percent: f64) -> bool {
        let Some(item) = self.items.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        item.percent = percent.clamp(PERCENT_MIN, PERCENT_MAX);
        item.scenario = Scenario::Custom;
        self.revision += 1;
        true
    }

    /// Apply a scenario preset, overwriting the percent. Selecting custom
    /// keeps the current percent.
    pub fn set_scenario(&mut self, id: ProjectionId, scenario: Scenario) -> bool {
        let Some(item) = self.items.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        if let Some(percent) = scenario.preset_percent() {
            item.percent = percent;
        }
        item.scenario = scenario;
        self.revision += 1;
        true
    }

    pub fn remove(&mut self, id: ProjectionId) -> bool {
        let before = self.items.len();
        self.items.retain(|p| p.id != id);
        let removed = self.items.len() != before;
        if removed {
            self.revision += 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            self.revision += 1;
        }
    }

    /// First free variant of `name`, skipping the projection being renamed.
    fn unique_name(&self, name: &str, skip: Option<ProjectionId>) -> String {
        let base = name.trim();
        let base = if base.is_empty() { "Projection" } else { base };
        let taken = |candidate: &str| {
            self.items
                .iter()
                .any(|p| Some(p.id) != skip && p.name == candidate)
        };
        if !taken(base) {
            return base.to_string();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{base} ({n})");
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// One extrapolated point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: String,
    pub value: f64,
}

/// A fully computed projection series, ready to render next to the base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSeries {
    pub name: String,
    pub column: String,
    pub scenario: Scenario,
    pub percent: f64,
    pub points: Vec<ProjectedPoint>,
}

/// Extrapolate a base series beyond its last present value.
///
/// The anchor is the last index with a present value; gaps earlier in the
/// series are irrelevant. Each step compounds: `v_i = v0 * (1 + p/100)^i`.
/// When the anchor sits on the final X position, a single open-ended
/// "next period" point is produced. A series with no present value at all
/// yields no points.
pub fn extrapolate(xs: &[String], base: &[Option<f64>], percent: f64) -> Vec<ProjectedPoint> {
    let Some(anchor) = base.iter().rposition(|v| v.is_some()) else {
        return Vec::new();
    };
    let v0 = match base[anchor] {
        Some(v) => v,
        None => return Vec::new(),
    };
    let rate = 1.0 + percent / 100.0;

    if anchor + 1 >= xs.len() {
        return vec![ProjectedPoint {
            x: NEXT_PERIOD_LABEL.to_string(),
            value: v0 * rate,
        }];
    }

    xs.iter()
        .enumerate()
        .skip(anchor + 1)
        .map(|(i, x)| ProjectedPoint {
            x: x.clone(),
            value: v0 * rate.powi((i - anchor) as i32),
        })
        .collect()
}

/// Compute every projection in the set against the same base axis.
///
/// `values_of` supplies the ordered base series for a column header, or
/// `None` when the column does not exist in the active table.
pub fn compute_all<F>(set: &ProjectionSet, xs: &[String], values_of: F) -> Vec<ProjectionSeries>
where
    F: Fn(&str) -> Option<Vec<Option<f64>>>,
{
    set.iter()
        .map(|projection| {
            let points = values_of(&projection.column)
                .map(|base| extrapolate(xs, &base, projection.percent))
                .unwrap_or_default();
            debug!(
                name = %projection.name,
                column = %projection.column,
                points = points.len(),
                "computed projection"
            );
            ProjectionSeries {
                name: projection.name.clone(),
                column: projection.column.clone(),
                scenario: projection.scenario,
                percent: projection.percent,
                points,
            }
        })
        .collect()
}
