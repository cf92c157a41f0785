pub mod columns;
pub mod deserializers;
pub mod fields;
pub mod normalizer;
pub mod pipeline;
pub mod types;

pub use columns::{resolve_columns, ColumnLabel, ColumnMapping, ColumnResolution};
pub use fields::{CanonicalField, TicketAttribute, ALL};
pub use normalizer::normalize_rows;
pub use pipeline::{ingest, read_csv, read_csv_reader, Ingested, RawTable};
pub use types::{CellValue, LoadWarning, RawRow, TicketRecord};
