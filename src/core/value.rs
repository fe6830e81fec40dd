use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell as received from the extraction service.
///
/// Extraction output is loosely typed: the same column can carry native
/// numbers, formatted strings ("$1,200"), booleans or nulls. All downstream
/// numeric logic goes through [`CellValue::as_number`], which maps anything
/// unparseable to `None`. `None` is the "no data" marker and is distinct
/// from zero everywhere in the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl CellValue {
    /// Numeric view of the cell. Strings are cleaned of currency symbols,
    /// thousands separators and a trailing percent sign before parsing;
    /// parenthesized amounts parse as negatives.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Number(_) => None,
            CellValue::Text(s) => parse_numeric(s),
            CellValue::Bool(_) | CellValue::Null => None,
        }
    }

    /// True when the cell holds nothing renderable.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Label form of the cell, used for category axes and donut slice names.
    pub fn label(&self) -> String {
        match self {
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            CellValue::Bool(b) => b.to_string(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Null => String::new(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

lazy_static! {
    static ref STRIP_RE: Regex = Regex::new(r"[$€£¥,\s]").expect("static regex");
}

/// Parse a formatted string into a number.
///
/// Handles currency prefixes, thousands separators, a trailing `%` and
/// accountant-style negatives: `"(1,200)"` → `-1200`.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (body, negative) = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        (&trimmed[1..trimmed.len() - 1], true)
    } else {
        (trimmed, false)
    };

    let mut cleaned = STRIP_RE.replace_all(body, "").into_owned();
    if cleaned.ends_with('%') {
        cleaned.pop();
    }
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().and_then(|n| {
        if !n.is_finite() {
            return None;
        }
        Some(if negative { -n } else { n })
    })
}

/// Date formats the extraction service is known to emit.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%b %d, %Y", "%B %d, %Y"];

/// True when the string parses as a calendar date in any known format.
pub fn looks_like_date(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(trimmed, fmt).is_ok())
}
