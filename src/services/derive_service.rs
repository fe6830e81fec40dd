use crate::chart::{self, ChartData, DeriveOptions};
use crate::classify::{classify_with, Classification};
use crate::config::DeriveConfig;
use crate::core::models::{Table, TableMetadata};
use crate::core::types::ResponseId;
use crate::core::value::CellValue;
use crate::projection::{self, ProjectionSeries};
use crate::select::{current_table, ActiveTable};
use crate::session::Session;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Everything the display layer needs for the currently selected table:
/// the raw rows for the paginated table, the classification metadata, the
/// chart datasets and the computed projection series.
///
/// Serializes to a flat JSON document for the "download as file" export;
/// `export_json`/`import_json` round-trip it losslessly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DerivedBundle {
    pub sheet: String,
    pub table_index: usize,
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, CellValue>>,
    pub metadata: TableMetadata,
    pub chart: ChartData,
    pub projections: Vec<ProjectionSeries>,
    /// Present when derivation was suppressed; explains why the bundle is
    /// empty instead of erroring.
    pub message: Option<String>,
}

impl DerivedBundle {
    fn unavailable(message: String) -> Self {
        Self {
            message: Some(message),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CacheKey {
    response: ResponseId,
    sheet_index: usize,
    table_index: usize,
    projections_revision: u64,
    options: DeriveOptions,
}

/// The explicit derivation entry point.
///
/// `bundle` is a pure function of `(response, selection, projections,
/// options)`; results are memoized by input identity, so repeated calls for
/// an unchanged session are free and a replaced response can never serve a
/// stale bundle.
#[derive(Debug, Default)]
pub struct DeriveService {
    config: DeriveConfig,
    cache: Option<(CacheKey, Arc<DerivedBundle>)>,
}

impl DeriveService {
    pub fn new(config: DeriveConfig) -> Self {
        Self {
            config,
            cache: None,
        }
    }

    pub fn config(&self) -> &DeriveConfig {
        &self.config
    }

    /// Derive the bundle for the session's current selection.
    pub fn bundle(&mut self, session: &Session, options: &DeriveOptions) -> Arc<DerivedBundle> {
        let Some(response) = session.response() else {
            return Arc::new(DerivedBundle::unavailable(
                "No extraction result loaded".to_string(),
            ));
        };

        let key = CacheKey {
            response: response.id,
            sheet_index: session.selection.sheet_index,
            table_index: session.selection.table_index,
            projections_revision: session.projections.revision(),
            options: options.clone(),
        };
        if let Some((cached_key, cached)) = &self.cache {
            if *cached_key == key {
                debug!("serving memoized bundle");
                return cached.clone();
            }
        }

        let bundle = match current_table(response, &session.selection) {
            ActiveTable::Unavailable { message } => DerivedBundle::unavailable(message),
            ActiveTable::Ready { sheet, table } => {
                self.derive_ready(sheet.name.clone(), session, table, options)
            }
        };
        let bundle = Arc::new(bundle);
        self.cache = Some((key, bundle.clone()));
        bundle
    }

    fn derive_ready(
        &self,
        sheet: String,
        session: &Session,
        table: &Table,
        options: &DeriveOptions,
    ) -> DerivedBundle {
        let classification = classify_with(&table.headers, &table.rows, &self.config);
        let chart = chart::derive_with(table, &classification, options, &self.config);
        let projections = self.compute_projections(session, table, &classification, options, &chart);
        let message = table
            .is_empty()
            .then(|| format!("The selected table on sheet '{sheet}' contains no data"));

        DerivedBundle {
            sheet,
            table_index: session.selection.table_index,
            headers: table.headers.clone(),
            rows: table.rows.clone(),
            metadata: metadata_from(&classification),
            chart,
            projections,
            message,
        }
    }

    /// Projections run over the same deduplicated category axis the line
    /// chart uses, but may target any column of the table.
    fn compute_projections(
        &self,
        session: &Session,
        table: &Table,
        classification: &Classification,
        options: &DeriveOptions,
        chart: &ChartData,
    ) -> Vec<ProjectionSeries> {
        if session.projections.is_empty() {
            return Vec::new();
        }
        let xs: Vec<String> = chart.line.iter().map(|r| r.x.clone()).collect();
        let x_column = options
            .x_column
            .clone()
            .or_else(|| classification.default_x.clone());

        let rows_by_label: Vec<&HashMap<String, CellValue>> = match x_column.as_deref() {
            Some(x) => {
                let mut seen = std::collections::HashSet::new();
                table
                    .rows
                    .iter()
                    .filter(|row| {
                        row.get(x)
                            .filter(|cell| !cell.is_empty())
                            .is_some_and(|cell| seen.insert(cell.label()))
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        projection::compute_all(&session.projections, &xs, |column| {
            if !table.headers.iter().any(|h| h == column) {
                return None;
            }
            Some(
                rows_by_label
                    .iter()
                    .map(|row| row.get(column).and_then(|cell| cell.as_number()))
                    .collect(),
            )
        })
    }
}

/// Serialize a bundle to the flat export document.
pub fn export_json(bundle: &DerivedBundle) -> Result<String> {
    Ok(serde_json::to_string_pretty(bundle)?)
}

/// Parse a previously exported bundle.
pub fn import_json(raw: &str) -> Result<DerivedBundle> {
    Ok(serde_json::from_str(raw)?)
}

fn metadata_from(classification: &Classification) -> TableMetadata {
    TableMetadata {
        categorical_columns: classification.categorical.clone(),
        numerical_columns: classification.numerical.clone(),
        date_columns: classification.date_columns.clone(),
    }
}
