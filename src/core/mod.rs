pub mod models;
pub mod types;
pub mod value;

pub use models::{IngressError, MultiSheetResponse, Sheet, Table, TableMetadata, TableStats};
pub use types::{ChartKind, ColumnTag, ProjectionId, ResponseId, Scenario, SeriesStatus};
pub use value::CellValue;
