pub mod analyzer;
pub mod config;
pub mod error;
pub mod export;
pub mod parser;
pub mod state;

pub use analyzer::{
    aggregate_category, apply_filters, extract_unique_values, select_tickets, CategoryDatum,
    FilterOutcome, FilterState, Selection,
};
pub use config::EngineConfig;
pub use error::AppError;
pub use parser::{
    normalize_rows, read_csv, resolve_columns, CanonicalField, CellValue, ColumnLabel,
    ColumnMapping, RawRow, TicketRecord,
};
pub use state::{Dashboard, FilterPatch, MemoryPreferences, Notice, PreferenceStore};
