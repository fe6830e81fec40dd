//! Chart data derivation: turns a classified table into renderable series
//! for each chart kind, with per-series availability and axis domain rules.

use crate::classify::Classification;
use crate::config::DeriveConfig;
use crate::core::models::Table;
use crate::core::types::{ChartKind, SeriesStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Column choices for one derivation run. Unset fields fall back to the
/// classification defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeriveOptions {
    pub x_column: Option<String>,
    pub y_columns: Option<Vec<String>>,
    pub donut_category: Option<String>,
    pub donut_value: Option<String>,
    pub scatter_x: Option<String>,
    pub scatter_y: Option<String>,
    /// Donut slice the user has focused; its label always shows.
    pub focused_slice: Option<String>,
}

/// One X category with a value per selected Y column. A `None` value is the
/// "no data" marker: the renderer skips the point instead of plotting zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRow {
    pub x: String,
    pub values: BTreeMap<String, Option<f64>>,
}

/// Donut/pie slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlicePoint {
    pub name: String,
    pub value: f64,
    /// Minor slices suppress their label unless focused.
    pub label_visible: bool,
}

/// Scatter point; rows missing either coordinate are excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

/// Name and availability state of one derived series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesInfo {
    pub name: String,
    pub status: SeriesStatus,
}

/// Y-axis bounds; `None` means the renderer auto-scales that end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisDomain {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Whether each chart kind ended up with at least one non-empty series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub bar: bool,
    pub line: bool,
    pub area: bool,
    pub donut: bool,
    pub scatter: bool,
}

impl Availability {
    pub fn for_kind(&self, kind: ChartKind) -> bool {
        match kind {
            ChartKind::Bar => self.bar,
            ChartKind::Line => self.line,
            ChartKind::Area => self.area,
            ChartKind::Donut => self.donut,
            ChartKind::Scatter => self.scatter,
        }
    }
}

/// Everything the display layer needs to render the five chart kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartData {
    /// Category rows where at least one series has data. Bars skip "no
    /// data" categories outright rather than drawing them at zero.
    pub bar: Vec<CategoryRow>,
    /// All category rows; missing values render as gaps.
    pub line: Vec<CategoryRow>,
    pub area: Vec<CategoryRow>,
    pub donut: Vec<SlicePoint>,
    pub scatter: Vec<ScatterPoint>,
    /// Surviving series (all-null series are dropped here already).
    pub series: Vec<SeriesInfo>,
    pub y_domain: AxisDomain,
    pub availability: Availability,
}

/// Derive chart datasets with default tuning.
pub fn derive(table: &Table, classification: &Classification, options: &DeriveOptions) -> ChartData {
    derive_with(table, classification, options, &DeriveConfig::default())
}

/// Derive all chart datasets for one table.
///
/// Pure and total: malformed shapes produce empty datasets, never errors.
pub fn derive_with(
    table: &Table,
    classification: &Classification,
    options: &DeriveOptions,
    config: &DeriveConfig,
) -> ChartData {
    let mut data = ChartData::default();
    if table.headers.is_empty() || table.rows.is_empty() {
        return data;
    }

    let x_column = options
        .x_column
        .clone()
        .or_else(|| classification.default_x.clone());
    let y_columns: Vec<String> = options
        .y_columns
        .clone()
        .unwrap_or_else(|| classification.default_y.clone())
        .into_iter()
        .filter(|c| table.headers.contains(c))
        .collect();

    if let Some(x) = x_column.as_deref() {
        let (rows, series, domain) = derive_category_rows(table, x, &y_columns, config);
        data.bar = rows
            .iter()
            .filter(|r| r.values.values().any(|v| v.is_some()))
            .cloned()
            .collect();
        data.line = rows.clone();
        data.area = rows;
        data.series = series;
        data.y_domain = domain;
    }

    data.donut = derive_donut(table, classification, options, config);
    data.scatter = derive_scatter(table, classification, options);

    let has_series = !data.series.is_empty();
    data.availability = Availability {
        bar: has_series && !data.bar.is_empty(),
        line: has_series && !data.line.is_empty(),
        area: has_series && !data.area.is_empty(),
        donut: !data.donut.is_empty(),
        scatter: !data.scatter.is_empty(),
    };
    debug!(
        series = data.series.len(),
        bar = data.bar.len(),
        donut = data.donut.len(),
        scatter = data.scatter.len(),
        "derived chart data"
    );
    data
}

/// Build one row per distinct X value with a value slot per Y column, then
/// classify each series and compute the Y domain.
fn derive_category_rows(
    table: &Table,
    x_column: &str,
    y_columns: &[String],
    config: &DeriveConfig,
) -> (Vec<CategoryRow>, Vec<SeriesInfo>, AxisDomain) {
    let mut rows: Vec<CategoryRow> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for raw in &table.rows {
        let Some(x_cell) = raw.get(x_column) else {
            continue;
        };
        if x_cell.is_empty() {
            continue;
        }
        let label = x_cell.label();
        // first occurrence of a duplicate X wins
        if !seen.insert(label.clone()) {
            continue;
        }
        let mut values = BTreeMap::new();
        for column in y_columns {
            let value = raw.get(column).and_then(|cell| cell.as_number());
            values.insert(column.clone(), value);
        }
        rows.push(CategoryRow { x: label, values });
    }

    // classify series and drop the all-null ones
    let mut series: Vec<SeriesInfo> = Vec::new();
    let mut dropped: Vec<String> = Vec::new();
    for column in y_columns {
        let observed: Vec<Option<f64>> = rows
            .iter()
            .map(|r| r.values.get(column).copied().flatten())
            .collect();
        match classify_series(&observed) {
            SeriesStatus::AllNull => dropped.push(column.clone()),
            status => series.push(SeriesInfo {
                name: column.clone(),
                status,
            }),
        }
    }
    for row in &mut rows {
        for column in &dropped {
            row.values.remove(column);
        }
    }

    let domain = y_domain(&rows, &series, config);
    (rows, series, domain)
}

/// Availability state of one series' observed values.
fn classify_series(values: &[Option<f64>]) -> SeriesStatus {
    let present: Vec<f64> = values.iter().copied().flatten().collect();
    if present.is_empty() {
        return SeriesStatus::AllNull;
    }
    if present.iter().all(|v| *v == 0.0) {
        return SeriesStatus::AllZero;
    }
    SeriesStatus::Mixed
}

/// Y-axis domain rule: all-zero series force `[0, 1]` so the axis does not
/// collapse; otherwise auto minimum and `headroom ×` the observed maximum.
fn y_domain(rows: &[CategoryRow], series: &[SeriesInfo], config: &DeriveConfig) -> AxisDomain {
    if series.is_empty() {
        return AxisDomain::default();
    }
    if series.iter().all(|s| s.status == SeriesStatus::AllZero) {
        return AxisDomain {
            min: Some(0.0),
            max: Some(1.0),
        };
    }
    let observed_max = rows
        .iter()
        .flat_map(|r| r.values.values().copied().flatten())
        .fold(f64::NEG_INFINITY, f64::max);
    if observed_max.is_finite() {
        AxisDomain {
            min: None,
            max: Some(observed_max * config.headroom),
        }
    } else {
        AxisDomain::default()
    }
}

/// Reduce the table to `{name, value}` slices over a categorical column and
/// a numeric column. Rows with a missing category, a non-numeric value, or a
/// negative value are skipped; duplicate categories accumulate.
fn derive_donut(
    table: &Table,
    classification: &Classification,
    options: &DeriveOptions,
    config: &DeriveConfig,
) -> Vec<SlicePoint> {
    let category = options
        .donut_category
        .clone()
        .or_else(|| classification.default_x.clone());
    let value_column = options
        .donut_value
        .clone()
        .or_else(|| classification.default_y.first().cloned());
    let (Some(category), Some(value_column)) = (category, value_column) else {
        return Vec::new();
    };

    let mut names: Vec<String> = Vec::new();
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for raw in &table.rows {
        let Some(name_cell) = raw.get(&category) else {
            continue;
        };
        if name_cell.is_empty() {
            continue;
        }
        let Some(value) = raw.get(&value_column).and_then(|c| c.as_number()) else {
            continue;
        };
        if value < 0.0 {
            continue;
        }
        let name = name_cell.label();
        if !totals.contains_key(&name) {
            names.push(name.clone());
        }
        *totals.entry(name).or_insert(0.0) += value;
    }

    let total: f64 = totals.values().sum();
    if total <= 0.0 {
        return Vec::new();
    }
    names
        .into_iter()
        .map(|name| {
            let value = totals[&name];
            let minor = value / total < config.minor_slice_fraction;
            let focused = options.focused_slice.as_deref() == Some(name.as_str());
            SlicePoint {
                label_visible: !minor || focused,
                name,
                value,
            }
        })
        .collect()
}

/// Pair two numeric columns row by row, excluding rows where either side is
/// the "no data" marker.
fn derive_scatter(
    table: &Table,
    classification: &Classification,
    options: &DeriveOptions,
) -> Vec<ScatterPoint> {
    let defaults = scatter_defaults(classification);
    let x_column = options
        .scatter_x
        .clone()
        .or_else(|| defaults.as_ref().map(|(x, _)| x.clone()));
    let y_column = options
        .scatter_y
        .clone()
        .or_else(|| defaults.as_ref().map(|(_, y)| y.clone()));
    let (Some(x_column), Some(y_column)) = (x_column, y_column) else {
        return Vec::new();
    };

    table
        .rows
        .iter()
        .filter_map(|raw| {
            let x = raw.get(&x_column)?.as_number()?;
            let y = raw.get(&y_column)?.as_number()?;
            Some(ScatterPoint { x, y })
        })
        .collect()
}

/// Default scatter axes: the default Y pair when it has two members,
/// otherwise the first two numeric columns.
fn scatter_defaults(classification: &Classification) -> Option<(String, String)> {
    if classification.default_y.len() >= 2 {
        return Some((
            classification.default_y[0].clone(),
            classification.default_y[1].clone(),
        ));
    }
    if classification.numerical.len() >= 2 {
        return Some((
            classification.numerical[0].clone(),
            classification.numerical[1].clone(),
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::core::value::CellValue;
    use std::collections::HashMap;

    fn row(pairs: &[(&str, CellValue)]) -> HashMap<String, CellValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn table(headers: &[&str], rows: Vec<HashMap<String, CellValue>>) -> Table {
        Table::new(headers.iter().map(|s| s.to_string()).collect(), rows)
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn derive_default(t: &Table) -> ChartData {
        let c = classify(&t.headers, &t.rows);
        derive(t, &c, &DeriveOptions::default())
    }

    #[test]
    fn test_all_null_series_excluded() {
        let t = table(
            &["Month", "2023", "2024"],
            vec![
                row(&[("Month", text("Jan")), ("2023", num(10.0)), ("2024", CellValue::Null)]),
                row(&[("Month", text("Feb")), ("2023", num(20.0)), ("2024", CellValue::Null)]),
            ],
        );
        let data = derive_default(&t);
        assert_eq!(data.series.len(), 1);
        assert_eq!(data.series[0].name, "2023");
        assert_eq!(data.series[0].status, SeriesStatus::Mixed);
        // the dropped column leaves no value slots behind
        assert!(data.line.iter().all(|r| !r.values.contains_key("2024")));
    }

    #[test]
    fn test_all_zero_series_flagged_and_domain_forced() {
        let t = table(
            &["Month", "2023"],
            vec![
                row(&[("Month", text("Jan")), ("2023", num(0.0))]),
                row(&[("Month", text("Feb")), ("2023", num(0.0))]),
            ],
        );
        let data = derive_default(&t);
        assert_eq!(data.series[0].status, SeriesStatus::AllZero);
        assert_eq!(data.y_domain, AxisDomain { min: Some(0.0), max: Some(1.0) });
        assert!(data.availability.bar);
    }

    #[test]
    fn test_domain_headroom() {
        let t = table(
            &["Month", "2023"],
            vec![
                row(&[("Month", text("Jan")), ("2023", num(100.0))]),
                row(&[("Month", text("Feb")), ("2023", num(200.0))]),
            ],
        );
        let data = derive_default(&t);
        assert_eq!(data.y_domain.min, None);
        assert!((data.y_domain.max.unwrap() - 210.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_values_are_gaps_not_zeros() {
        let t = table(
            &["Month", "2023"],
            vec![
                row(&[("Month", text("Jan")), ("2023", num(5.0))]),
                row(&[("Month", text("Feb")), ("2023", text("n/a"))]),
            ],
        );
        let data = derive_default(&t);
        assert_eq!(data.line.len(), 2);
        assert_eq!(data.line[1].values["2023"], None);
        // bar drops the category with no data at all
        assert_eq!(data.bar.len(), 1);
        assert_eq!(data.bar[0].x, "Jan");
    }

    #[test]
    fn test_duplicate_x_first_occurrence_wins() {
        let t = table(
            &["Month", "2023"],
            vec![
                row(&[("Month", text("Jan")), ("2023", num(1.0))]),
                row(&[("Month", text("Jan")), ("2023", num(9.0))]),
            ],
        );
        let data = derive_default(&t);
        assert_eq!(data.line.len(), 1);
        assert_eq!(data.line[0].values["2023"], Some(1.0));
    }

    #[test]
    fn test_donut_minor_slice_label_hidden_unless_focused() {
        let rows = vec![
            row(&[("Site", text("A")), ("2023", num(97.0))]),
            row(&[("Site", text("B")), ("2023", num(3.0))]),
        ];
        let t = table(&["Site", "2023"], rows);
        let c = classify(&t.headers, &t.rows);

        let data = derive(&t, &c, &DeriveOptions::default());
        let b = data.donut.iter().find(|s| s.name == "B").unwrap();
        assert!(!b.label_visible);

        let focused = derive(
            &t,
            &c,
            &DeriveOptions {
                focused_slice: Some("B".to_string()),
                ..DeriveOptions::default()
            },
        );
        assert!(focused.donut.iter().find(|s| s.name == "B").unwrap().label_visible);
    }

    #[test]
    fn test_donut_accumulates_duplicates_and_skips_negatives() {
        let t = table(
            &["Site", "2023"],
            vec![
                row(&[("Site", text("A")), ("2023", num(10.0))]),
                row(&[("Site", text("A")), ("2023", num(5.0))]),
                row(&[("Site", text("B")), ("2023", num(-2.0))]),
            ],
        );
        let data = derive_default(&t);
        assert_eq!(data.donut.len(), 1);
        assert_eq!(data.donut[0].name, "A");
        assert!((data.donut[0].value - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_scatter_skips_rows_with_missing_coordinates() {
        let t = table(
            &["Month", "2022", "2023"],
            vec![
                row(&[("Month", text("Jan")), ("2022", num(1.0)), ("2023", num(2.0))]),
                row(&[("Month", text("Feb")), ("2022", CellValue::Null), ("2023", num(3.0))]),
                row(&[("Month", text("Mar")), ("2022", num(4.0)), ("2023", text("-"))]),
            ],
        );
        let data = derive_default(&t);
        assert_eq!(data.scatter, vec![ScatterPoint { x: 1.0, y: 2.0 }]);
        assert!(data.availability.scatter);
    }

    #[test]
    fn test_empty_table_unavailable_everywhere() {
        let t = table(&[], vec![]);
        let data = derive_default(&t);
        assert!(!data.availability.bar);
        assert!(!data.availability.line);
        assert!(!data.availability.donut);
        assert!(!data.availability.scatter);
        assert!(data.series.is_empty());
    }

    #[test]
    fn test_availability_false_when_every_series_is_null() {
        let t = table(
            &["Month", "2023"],
            vec![row(&[("Month", text("Jan")), ("2023", CellValue::Null)])],
        );
        let data = derive_default(&t);
        assert!(data.series.is_empty());
        assert!(!data.availability.bar);
        assert!(!data.availability.line);
    }
}
