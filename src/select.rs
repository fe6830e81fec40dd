//! Sheet/table selection: bounds-safe indices into a multi-sheet response
//! and the pure "current table" resolution built on them.

use crate::core::models::{MultiSheetResponse, Sheet, Table};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Active sheet and table indices for one session.
///
/// Both indices silently clamp to the collection they point into; an
/// out-of-range request never errors and never leaves the valid range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub sheet_index: usize,
    pub table_index: usize,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a sheet by name, resolved through `sheet_order`.
    ///
    /// Switching sheets always re-anchors the table selection to 0.
    /// Unknown names are ignored.
    pub fn select_sheet(&mut self, response: &MultiSheetResponse, name: &str) -> bool {
        match response.position_of(name) {
            Some(index) => {
                self.sheet_index = index;
                self.table_index = 0;
                debug!(sheet = name, index, "selected sheet");
                true
            }
            None => {
                debug!(sheet = name, "ignored unknown sheet name");
                false
            }
        }
    }

    /// Select a table within the active sheet. The sheet index is left
    /// untouched; out-of-range indices clamp.
    pub fn select_table(&mut self, response: &MultiSheetResponse, index: usize) {
        let count = response
            .sheet_at(self.sheet_index.min(response.sheet_count().saturating_sub(1)))
            .map(|s| s.tables.len())
            .unwrap_or(0);
        self.table_index = clamp_index(index, count);
    }

    /// Re-clamp both indices after the underlying response shrank or was
    /// replaced.
    pub fn clamp_to(&mut self, response: &MultiSheetResponse) {
        self.sheet_index = clamp_index(self.sheet_index, response.sheet_count());
        let table_count = response
            .sheet_at(self.sheet_index)
            .map(|s| s.tables.len())
            .unwrap_or(0);
        self.table_index = clamp_index(self.table_index, table_count);
    }
}

fn clamp_index(index: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        index.min(count - 1)
    }
}

/// Resolution of the current selection against a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveTable<'a> {
    Ready { sheet: &'a Sheet, table: &'a Table },
    /// Chart rendering is suppressed; the message explains why.
    Unavailable { message: String },
}

impl<'a> ActiveTable<'a> {
    pub fn table(&self) -> Option<&'a Table> {
        match self {
            ActiveTable::Ready { table, .. } => Some(*table),
            ActiveTable::Unavailable { .. } => None,
        }
    }
}

/// Pure resolution of `(response, selection)` to the current table.
///
/// Never cached across a response replacement: callers re-resolve on every
/// derivation. Indices out of range are treated as clamped.
pub fn current_table<'a>(
    response: &'a MultiSheetResponse,
    selection: &SelectionState,
) -> ActiveTable<'a> {
    if let Some(message) = response.unavailable_reason() {
        return ActiveTable::Unavailable { message };
    }
    let sheet_index = clamp_index(selection.sheet_index, response.sheet_count());
    let Some(sheet) = response.sheet_at(sheet_index) else {
        return ActiveTable::Unavailable {
            message: "The extraction result contains no sheets".to_string(),
        };
    };
    if let Some(message) = sheet.unavailable_reason() {
        return ActiveTable::Unavailable { message };
    }
    let table_index = clamp_index(selection.table_index, sheet.tables.len());
    match sheet.tables.get(table_index) {
        Some(table) => ActiveTable::Ready { sheet, table },
        None => ActiveTable::Unavailable {
            message: format!("No tables were detected on sheet '{}'", sheet.name),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response() -> MultiSheetResponse {
        MultiSheetResponse::from_value(serde_json::json!({
            "sheets": {
                "First": {
                    "tables": [
                        {"tableData": {"headers": ["A"], "rows": [{"A": 1}]}},
                        {"tableData": {"headers": ["B"], "rows": [{"B": 2}]}}
                    ]
                },
                "Second": {
                    "tables": [
                        {"tableData": {"headers": ["C"], "rows": [{"C": 3}]}}
                    ]
                },
                "Broken": { "tables": [], "error": true, "message": "extraction failed" }
            },
            "sheetOrder": ["First", "Second", "Broken"]
        }))
        .unwrap()
    }

    #[test]
    fn test_select_sheet_resets_table_index() {
        let resp = response();
        let mut sel = SelectionState::new();
        sel.select_table(&resp, 1);
        assert_eq!(sel.table_index, 1);
        assert!(sel.select_sheet(&resp, "Second"));
        assert_eq!(sel.sheet_index, 1);
        assert_eq!(sel.table_index, 0);
    }

    #[test]
    fn test_unknown_sheet_name_is_ignored() {
        let resp = response();
        let mut sel = SelectionState::new();
        assert!(!sel.select_sheet(&resp, "Nope"));
        assert_eq!(sel.sheet_index, 0);
    }

    #[test]
    fn test_indices_clamp_within_bounds() {
        let resp = response();
        let mut sel = SelectionState::new();
        sel.select_table(&resp, 99);
        assert_eq!(sel.table_index, 1);

        sel.sheet_index = 42;
        sel.table_index = 42;
        sel.clamp_to(&resp);
        assert_eq!(sel.sheet_index, 2);
        assert_eq!(sel.table_index, 0);
    }

    #[test]
    fn test_current_table_resolution() {
        let resp = response();
        let sel = SelectionState { sheet_index: 1, table_index: 0 };
        match current_table(&resp, &sel) {
            ActiveTable::Ready { sheet, table } => {
                assert_eq!(sheet.name, "Second");
                assert_eq!(table.headers, vec!["C"]);
            }
            ActiveTable::Unavailable { message } => panic!("unexpected: {message}"),
        }
    }

    #[test]
    fn test_error_sheet_suppresses_charts() {
        let resp = response();
        let sel = SelectionState { sheet_index: 2, table_index: 0 };
        match current_table(&resp, &sel) {
            ActiveTable::Unavailable { message } => assert_eq!(message, "extraction failed"),
            ActiveTable::Ready { .. } => panic!("expected unavailable"),
        }
    }

    #[test]
    fn test_out_of_range_selection_clamps_in_resolution() {
        let resp = response();
        let sel = SelectionState { sheet_index: 99, table_index: 99 };
        // clamps to the last sheet, which is the broken one
        assert!(matches!(current_table(&resp, &sel), ActiveTable::Unavailable { .. }));

        let sel = SelectionState { sheet_index: 0, table_index: 99 };
        match current_table(&resp, &sel) {
            ActiveTable::Ready { table, .. } => assert_eq!(table.headers, vec!["B"]),
            ActiveTable::Unavailable { message } => panic!("unexpected: {message}"),
        }
    }

    #[test]
    fn test_response_level_error_wins() {
        let resp = MultiSheetResponse::from_value(serde_json::json!({
            "sheets": {}, "sheetOrder": [], "error": true, "message": "document unreadable"
        }))
        .unwrap();
        let sel = SelectionState::new();
        match current_table(&resp, &sel) {
            ActiveTable::Unavailable { message } => assert_eq!(message, "document unreadable"),
            ActiveTable::Ready { .. } => panic!("expected unavailable"),
        }
    }
}
