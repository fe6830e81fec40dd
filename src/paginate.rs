//! Fixed-size column/row windows over a table for paginated display.

use crate::config::DeriveConfig;
use crate::core::models::Table;
use crate::core::value::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pure view state for the paginated table. Derived deterministically from
/// total column/row counts; navigation past either end is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationWindow {
    pub column_page: usize,
    pub row_page: usize,
    pub columns_per_page: usize,
    pub rows_per_page: usize,
}

impl Default for PaginationWindow {
    fn default() -> Self {
        Self {
            column_page: 0,
            row_page: 0,
            columns_per_page: 5,
            rows_per_page: 10,
        }
    }
}

impl PaginationWindow {
    pub fn from_config(config: &DeriveConfig) -> Self {
        Self {
            column_page: 0,
            row_page: 0,
            columns_per_page: config.columns_per_page.max(1),
            rows_per_page: config.rows_per_page.max(1),
        }
    }

    pub fn total_column_pages(&self, header_count: usize) -> usize {
        header_count.div_ceil(self.columns_per_page)
    }

    pub fn total_row_pages(&self, row_count: usize) -> usize {
        row_count.div_ceil(self.rows_per_page)
    }

    /// Advance the column window; a no-op on the last page.
    pub fn next_columns(&mut self, header_count: usize) {
        let total = self.total_column_pages(header_count);
        if self.column_page + 1 < total {
            self.column_page += 1;
        }
    }

    /// Step the column window back; a no-op on the first page.
    pub fn prev_columns(&mut self) {
        self.column_page = self.column_page.saturating_sub(1);
    }

    pub fn next_rows(&mut self, row_count: usize) {
        let total = self.total_row_pages(row_count);
        if self.row_page + 1 < total {
            self.row_page += 1;
        }
    }

    pub fn prev_rows(&mut self) {
        self.row_page = self.row_page.saturating_sub(1);
    }

    /// Re-clamp both pages after the table shrank or was replaced.
    pub fn clamp_to(&mut self, header_count: usize, row_count: usize) {
        let col_total = self.total_column_pages(header_count);
        let row_total = self.total_row_pages(row_count);
        self.column_page = self.column_page.min(col_total.saturating_sub(1));
        self.row_page = self.row_page.min(row_total.saturating_sub(1));
    }

    /// The headers visible in the current column window.
    pub fn current_columns<'a>(&self, headers: &'a [String]) -> &'a [String] {
        slice_page(headers, self.column_page, self.columns_per_page)
    }

    /// The table rows visible in the current row window.
    pub fn current_rows<'a>(&self, table: &'a Table) -> &'a [HashMap<String, CellValue>] {
        slice_page(&table.rows, self.row_page, self.rows_per_page)
    }
}

fn slice_page<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    let start = page.saturating_mul(per_page).min(items.len());
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}
