pub mod category;
pub mod filter;
pub mod metrics;
pub mod selection;
pub mod temporal;
pub mod unique;

pub use category::{aggregate_category, CategoryDatum};
pub use filter::{apply_filters, normalize_value, FilterOutcome, FilterState};
pub use metrics::{compute_metrics, TicketMetrics};
pub use selection::{display_columns, select_tickets, DisplayColumn, Selection};
pub use temporal::{auto_granularity, time_series, Granularity, TimePoint};
pub use unique::{extract_unique_values, UniqueValues};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::parser::{ingest, Ingested, RawRow};

    /// Ingest a small table given as headers + rows of text cells.
    pub fn table(headers: &[&str], rows: &[&[&str]]) -> Ingested {
        let raw: Vec<RawRow> = rows
            .iter()
            .map(|cells| {
                headers
                    .iter()
                    .zip(cells.iter())
                    .map(|(h, v)| (*h, *v))
                    .collect()
            })
            .collect();
        ingest(&raw)
    }
}
