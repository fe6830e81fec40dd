//! Column classification: which columns are numeric, what role their header
//! implies, and which axes a chart should default to.

use crate::config::DeriveConfig;
use crate::core::types::ColumnTag;
use crate::core::value::{looks_like_date, CellValue};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref YEAR_RE: Regex = Regex::new(r"^(19|20)\d{2}$").expect("static regex");
}

/// Headers containing any of these (case-insensitive) are tagged as
/// projection columns. Non-English equivalents match what the extraction
/// service has been seen to emit.
const PROJECTION_KEYWORDS: &[&str] = &[
    "forecast",
    "projection",
    "estimate",
    "target",
    "plan",
    "capacity",
    "prognose",
    "prognos",
    "prévision",
    "prevision",
    "proyección",
    "proyeccion",
    "previsão",
    "previsao",
    "objetivo",
    "kapazität",
    "kapazitat",
    "capacité",
    "capacite",
    "capacidad",
];

/// Per-column classification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnProfile {
    pub is_numeric: bool,
    pub tag: ColumnTag,
}

/// Full classification of one table's columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub profiles: HashMap<String, ColumnProfile>,
    /// Non-numeric headers, in table order.
    pub categorical: Vec<String>,
    /// Numeric headers, in table order.
    pub numerical: Vec<String>,
    /// Non-numeric headers whose sampled values parse as dates.
    pub date_columns: Vec<String>,
    /// Default X axis: first non-numeric header, or the first header.
    pub default_x: Option<String>,
    /// Default Y axes: up to two numeric headers, year > projection > other.
    pub default_y: Vec<String>,
}

impl Classification {
    pub fn tag_of(&self, header: &str) -> Option<ColumnTag> {
        self.profiles.get(header).map(|p| p.tag)
    }

    pub fn is_numeric(&self, header: &str) -> bool {
        self.profiles.get(header).is_some_and(|p| p.is_numeric)
    }
}

/// Classify a table's columns with default tuning.
pub fn classify(headers: &[String], rows: &[HashMap<String, CellValue>]) -> Classification {
    classify_with(headers, rows, &DeriveConfig::default())
}

/// Classify a table's columns.
///
/// A column is numeric when at least one sampled value parses as a number;
/// sampling stops after `config.sample_limit` rows. Tagging is header-text
/// only, first match wins: year regex, then projection keywords, then other.
/// Never errors: an empty or fully-non-numeric table yields empty tag sets
/// and empty default axes.
pub fn classify_with(
    headers: &[String],
    rows: &[HashMap<String, CellValue>],
    config: &DeriveConfig,
) -> Classification {
    let sample = &rows[..rows.len().min(config.sample_limit)];

    let mut result = Classification::default();
    for header in headers {
        let mut saw_number = false;
        let mut saw_text = false;
        let mut date_hits = 0usize;
        for row in sample {
            match row.get(header) {
                Some(cell) if cell.as_number().is_some() => saw_number = true,
                Some(CellValue::Text(s)) if !s.trim().is_empty() => {
                    saw_text = true;
                    if looks_like_date(s) {
                        date_hits += 1;
                    }
                }
                _ => {}
            }
            if saw_number {
                break;
            }
        }

        let is_numeric = saw_number;
        let tag = tag_header(header, config);
        result
            .profiles
            .insert(header.clone(), ColumnProfile { is_numeric, tag });
        if is_numeric {
            result.numerical.push(header.clone());
        } else {
            result.categorical.push(header.clone());
            if saw_text && date_hits > 0 {
                result.date_columns.push(header.clone());
            }
        }
    }

    result.default_x = result
        .categorical
        .first()
        .cloned()
        .or_else(|| headers.first().cloned());
    if headers.is_empty() {
        result.default_x = None;
    }
    result.default_y = default_y_axes(&result, headers);
    result
}

/// Header text rules, first match wins.
fn tag_header(header: &str, config: &DeriveConfig) -> ColumnTag {
    let trimmed = header.trim();
    if YEAR_RE.is_match(trimmed) {
        return ColumnTag::Year;
    }
    let lower = trimmed.to_lowercase();
    let keyword_hit = PROJECTION_KEYWORDS
        .iter()
        .any(|kw| lower.contains(kw))
        || config
            .extra_projection_keywords
            .iter()
            .any(|kw| !kw.is_empty() && lower.contains(&kw.to_lowercase()));
    if keyword_hit {
        return ColumnTag::Projection;
    }
    ColumnTag::Other
}

/// Up to two numeric headers in priority order year > projection > other,
/// preserving table order within each tier.
fn default_y_axes(classification: &Classification, headers: &[String]) -> Vec<String> {
    let mut axes: Vec<String> = Vec::new();
    for wanted in [ColumnTag::Year, ColumnTag::Projection, ColumnTag::Other] {
        for header in headers {
            if axes.len() == 2 {
                return axes;
            }
            let Some(profile) = classification.profiles.get(header) else {
                continue;
            };
            if profile.is_numeric && profile.tag == wanted && !axes.contains(header) {
                axes.push(header.clone());
            }
        }
    }
    axes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, CellValue)]) -> HashMap<String, CellValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_year_headers_tagged_year() {
        for h in ["1999", "2023", "2099"] {
            assert_eq!(tag_header(h, &DeriveConfig::default()), ColumnTag::Year);
        }
        for h in ["1899", "2123", "202", "20234"] {
            assert_ne!(tag_header(h, &DeriveConfig::default()), ColumnTag::Year);
        }
    }

    #[test]
    fn test_projection_keywords_case_insensitive() {
        let cfg = DeriveConfig::default();
        assert_eq!(tag_header("FORECAST 2030", &cfg), ColumnTag::Projection);
        assert_eq!(tag_header("Installed Capacity", &cfg), ColumnTag::Projection);
        assert_eq!(tag_header("Proyección", &cfg), ColumnTag::Projection);
        assert_eq!(tag_header("Revenue", &cfg), ColumnTag::Other);
    }

    #[test]
    fn test_year_regex_beats_keyword() {
        // a bare year header never falls through to keyword matching
        assert_eq!(tag_header("2024", &DeriveConfig::default()), ColumnTag::Year);
    }

    #[test]
    fn test_extra_keywords_from_config() {
        let cfg = DeriveConfig {
            extra_projection_keywords: vec!["outlook".to_string()],
            ..DeriveConfig::default()
        };
        assert_eq!(tag_header("Outlook FY30", &cfg), ColumnTag::Projection);
    }

    #[test]
    fn test_numeric_detection_through_formatting() {
        let hs = headers(&["Region", "Spend"]);
        let rows = vec![
            row(&[("Region", CellValue::Text("EU".into())), ("Spend", CellValue::Text("$1,200".into()))]),
        ];
        let c = classify(&hs, &rows);
        assert!(!c.is_numeric("Region"));
        assert!(c.is_numeric("Spend"));
        assert_eq!(c.categorical, vec!["Region"]);
        assert_eq!(c.numerical, vec!["Spend"]);
    }

    #[test]
    fn test_default_axes_priority() {
        let hs = headers(&["Month", "Growth Target", "2023", "Other Metric"]);
        let rows = vec![row(&[
            ("Month", CellValue::Text("Jan".into())),
            ("Growth Target", CellValue::Number(1.0)),
            ("2023", CellValue::Number(2.0)),
            ("Other Metric", CellValue::Number(3.0)),
        ])];
        let c = classify(&hs, &rows);
        assert_eq!(c.default_x.as_deref(), Some("Month"));
        // year first, then projection, capped at two
        assert_eq!(c.default_y, vec!["2023", "Growth Target"]);
    }

    #[test]
    fn test_all_numeric_table_defaults_x_to_first_header() {
        let hs = headers(&["2022", "2023"]);
        let rows = vec![row(&[
            ("2022", CellValue::Number(1.0)),
            ("2023", CellValue::Number(2.0)),
        ])];
        let c = classify(&hs, &rows);
        assert_eq!(c.default_x.as_deref(), Some("2022"));
        assert_eq!(c.default_y, vec!["2022", "2023"]);
    }

    #[test]
    fn test_empty_table_yields_empty_classification() {
        let c = classify(&[], &[]);
        assert!(c.profiles.is_empty());
        assert!(c.default_x.is_none());
        assert!(c.default_y.is_empty());
    }

    #[test]
    fn test_date_columns_detected() {
        let hs = headers(&["Reported", "Value"]);
        let rows = vec![
            row(&[("Reported", CellValue::Text("2023-01-31".into())), ("Value", CellValue::Number(4.0))]),
        ];
        let c = classify(&hs, &rows);
        assert_eq!(c.date_columns, vec!["Reported"]);
    }

    #[test]
    fn test_all_null_column_is_categorical() {
        let hs = headers(&["Notes"]);
        let rows = vec![row(&[("Notes", CellValue::Null)])];
        let c = classify(&hs, &rows);
        assert!(!c.is_numeric("Notes"));
        assert_eq!(c.tag_of("Notes"), Some(ColumnTag::Other));
    }
}
