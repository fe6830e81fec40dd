pub mod chart;
pub mod classify;
pub mod config;
pub mod core;
pub mod logging;
pub mod paginate;
pub mod projection;
pub mod providers;
pub mod select;
pub mod services;
pub mod session;

// Re-export commonly used types
pub use chart::{ChartData, DeriveOptions};
pub use classify::{classify, Classification};
pub use config::{Config, DeriveConfig};
pub use core::{CellValue, ChartKind, ColumnTag, MultiSheetResponse, Scenario, SeriesStatus, Sheet, Table};
pub use paginate::PaginationWindow;
pub use projection::{Projection, ProjectionSet};
pub use providers::ExtractionClient;
pub use select::{current_table, ActiveTable, SelectionState};
pub use services::{DeriveService, DerivedBundle};
pub use session::Session;
