use crate::core::types::ResponseId;
use crate::core::value::CellValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

/// Errors raised at the ingress boundary.
///
/// Past this boundary nothing in the derivation layer fails: malformed
/// tables become empty bundles with a message, never errors.
#[derive(Debug, Error)]
pub enum IngressError {
    #[error("failed to decode extraction response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("extraction response is not a JSON object")]
    NotAnObject,
}

/// Column classification metadata for a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableMetadata {
    pub categorical_columns: Vec<String>,
    pub numerical_columns: Vec<String>,
    pub date_columns: Vec<String>,
}

/// Size summary for a table, recomputed at ingress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableStats {
    pub row_count: usize,
    pub column_count: usize,
}

/// One self-contained tabular block detected on a sheet.
///
/// Invariant: every row key appears in `headers`. Ingress normalization
/// drops keys that do not and logs how many were dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, CellValue>>,
    pub metadata: TableMetadata,
    pub stats: TableStats,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<HashMap<String, CellValue>>) -> Self {
        let stats = TableStats {
            row_count: rows.len(),
            column_count: headers.len(),
        };
        Self {
            headers,
            rows,
            metadata: TableMetadata::default(),
            stats,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }
}

/// A named group of tables extracted from one page/tab of a source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sheet {
    pub name: String,
    pub tables: Vec<Table>,
    pub table_count: usize,
    pub error: bool,
    pub message: Option<String>,
}

impl Sheet {
    /// Why this sheet cannot render charts, if it cannot.
    pub fn unavailable_reason(&self) -> Option<String> {
        if self.error {
            return Some(
                self.message
                    .clone()
                    .unwrap_or_else(|| format!("Extraction failed for sheet '{}'", self.name)),
            );
        }
        if self.tables.is_empty() {
            return Some(format!("No tables were detected on sheet '{}'", self.name));
        }
        None
    }
}

/// The full extraction result for one document.
///
/// `sheet_order` is authoritative for display and iteration order; map
/// iteration order is never used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSheetResponse {
    pub id: ResponseId,
    pub fetched_at: DateTime<Utc>,
    pub sheets: HashMap<String, Sheet>,
    pub sheet_order: Vec<String>,
    pub error: bool,
    pub message: Option<String>,
    pub error_type: Option<String>,
}

impl MultiSheetResponse {
    /// Decode and normalize a raw extraction document.
    pub fn from_json(raw: &str) -> Result<Self, IngressError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    /// Normalize a decoded document into the engine's schema.
    ///
    /// Tolerates missing fields, recomputes counts, and enforces the
    /// `sheet_order`/`sheets` invariant by dropping unresolved order
    /// entries and appending sheets the order missed.
    pub fn from_value(value: serde_json::Value) -> Result<Self, IngressError> {
        if !value.is_object() {
            return Err(IngressError::NotAnObject);
        }
        let wire: WireResponse = serde_json::from_value(value)?;

        let mut sheets: HashMap<String, Sheet> = HashMap::new();
        for (name, wire_sheet) in wire.sheets {
            sheets.insert(name.clone(), wire_sheet.normalize(&name));
        }

        let mut sheet_order: Vec<String> = Vec::new();
        for name in wire.sheet_order {
            if sheets.contains_key(&name) {
                if !sheet_order.contains(&name) {
                    sheet_order.push(name);
                }
            } else {
                warn!("dropping sheetOrder entry '{name}' with no matching sheet");
            }
        }
        let mut orphans: Vec<String> = sheets
            .keys()
            .filter(|name| !sheet_order.contains(name))
            .cloned()
            .collect();
        if !orphans.is_empty() {
            orphans.sort();
            warn!("appending {} sheet(s) missing from sheetOrder", orphans.len());
            sheet_order.extend(orphans);
        }

        Ok(Self {
            id: ResponseId::new(),
            fetched_at: Utc::now(),
            sheets,
            sheet_order,
            error: truthy(&wire.error),
            message: wire.message,
            error_type: wire.error_type,
        })
    }

    pub fn sheet_count(&self) -> usize {
        self.sheet_order.len()
    }

    /// Sheet at a display position, following `sheet_order`.
    pub fn sheet_at(&self, index: usize) -> Option<&Sheet> {
        self.sheet_order
            .get(index)
            .and_then(|name| self.sheets.get(name))
    }

    /// Display position of a sheet name, if present.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.sheet_order.iter().position(|n| n == name)
    }

    /// Why this response cannot render anything, if it cannot.
    pub fn unavailable_reason(&self) -> Option<String> {
        if self.error {
            return Some(
                self.message
                    .clone()
                    .unwrap_or_else(|| "Extraction failed for this document".to_string()),
            );
        }
        if self.sheet_order.is_empty() {
            return Some("The extraction result contains no sheets".to_string());
        }
        None
    }
}

/// Loosely-typed wire shapes; normalized into the engine schema above.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireResponse {
    sheets: HashMap<String, WireSheet>,
    sheet_order: Vec<String>,
    error: Option<serde_json::Value>,
    message: Option<String>,
    error_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireSheet {
    tables: Vec<WireTable>,
    error: Option<serde_json::Value>,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireTable {
    table_data: WireTableData,
    meta: TableMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireTableData {
    headers: Vec<String>,
    rows: Vec<HashMap<String, CellValue>>,
}

impl WireSheet {
    fn normalize(self, name: &str) -> Sheet {
        let tables: Vec<Table> = self
            .tables
            .into_iter()
            .map(|t| t.normalize(name))
            .collect();
        let table_count = tables.len();
        Sheet {
            name: name.to_string(),
            tables,
            table_count,
            error: truthy(&self.error),
            message: self.message,
        }
    }
}

impl WireTable {
    fn normalize(self, sheet_name: &str) -> Table {
        let headers = self.table_data.headers;
        let mut dropped = 0usize;
        let rows: Vec<HashMap<String, CellValue>> = self
            .table_data
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .filter(|(key, _)| {
                        let known = headers.iter().any(|h| h == key);
                        if !known {
                            dropped += 1;
                        }
                        known
                    })
                    .collect()
            })
            .collect();
        if dropped > 0 {
            warn!("sheet '{sheet_name}': dropped {dropped} row value(s) with keys not in headers");
        }
        let mut table = Table::new(headers, rows);
        table.metadata = self.meta;
        table
    }
}

/// The wire `error` field shows up as a bool, a string, or not at all.
fn truthy(value: &Option<serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
        Some(serde_json::Value::Null) | None => false,
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> serde_json::Value {
        serde_json::json!({
            "sheets": {
                "Emissions": {
                    "tables": [{
                        "tableData": {
                            "headers": ["Month", "2023"],
                            "rows": [
                                {"Month": "Jan", "2023": 100},
                                {"Month": "Feb", "2023": 110, "Ghost": 1}
                            ]
                        }
                    }]
                },
                "Energy": { "tables": [] }
            },
            "sheetOrder": ["Emissions", "Energy", "Water"]
        })
    }

    #[test]
    fn test_ingress_normalizes_order_and_rows() {
        let resp = MultiSheetResponse::from_value(sample_response()).unwrap();
        // "Water" has no sheet and is dropped
        assert_eq!(resp.sheet_order, vec!["Emissions", "Energy"]);
        let emissions = resp.sheet_at(0).unwrap();
        assert_eq!(emissions.table_count, 1);
        // the "Ghost" key is not in headers and is dropped
        let table = &emissions.tables[0];
        assert!(table.rows[1].get("Ghost").is_none());
        assert_eq!(table.stats.row_count, 2);
        assert_eq!(table.stats.column_count, 2);
    }

    #[test]
    fn test_ingress_appends_orphan_sheets() {
        let resp = MultiSheetResponse::from_value(serde_json::json!({
            "sheets": {"A": {"tables": []}, "B": {"tables": []}},
            "sheetOrder": ["B"]
        }))
        .unwrap();
        assert_eq!(resp.sheet_order, vec!["B", "A"]);
    }

    #[test]
    fn test_sheet_unavailable_reasons() {
        let resp = MultiSheetResponse::from_value(sample_response()).unwrap();
        assert!(resp.sheet_at(0).unwrap().unavailable_reason().is_none());
        let empty = resp.sheet_at(1).unwrap();
        assert!(empty.unavailable_reason().unwrap().contains("Energy"));
    }

    #[test]
    fn test_error_field_shapes() {
        let resp = MultiSheetResponse::from_value(serde_json::json!({
            "sheets": {}, "sheetOrder": [],
            "error": "OCR failed", "message": "Document could not be read", "errorType": "ocr"
        }))
        .unwrap();
        assert!(resp.error);
        assert_eq!(resp.unavailable_reason().unwrap(), "Document could not be read");

        let ok = MultiSheetResponse::from_value(serde_json::json!({
            "sheets": {}, "sheetOrder": [], "error": false
        }))
        .unwrap();
        assert!(!ok.error);
        assert!(ok.unavailable_reason().unwrap().contains("no sheets"));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            MultiSheetResponse::from_value(serde_json::json!([1, 2])),
            Err(IngressError::NotAnObject)
        ));
        assert!(MultiSheetResponse::from_json("not json").is_err());
    }
}
