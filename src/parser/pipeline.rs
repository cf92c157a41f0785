use std::io::Read;
use std::path::Path;
use std::time::Instant;

use crate::error::AppError;
use crate::parser::columns::{resolve_columns, ColumnResolution};
use crate::parser::normalizer::normalize_rows;
use crate::parser::types::{CellValue, LoadWarning, RawRow, TicketRecord};

/// Rows decoded from a delimited export, before any interpretation.
#[derive(Debug)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub warnings: Vec<LoadWarning>,
    pub skipped_rows: usize,
    pub parse_duration_ms: u64,
}

/// Read a CSV export from `path`.
/// `progress_cb(rows_processed)` is called every 500 rows.
pub fn read_csv(
    path: impl AsRef<Path>,
    delimiter: u8,
    progress_cb: impl Fn(usize),
) -> Result<RawTable, AppError> {
    let file = std::fs::File::open(path)?;
    read_csv_reader(std::io::BufReader::new(file), delimiter, progress_cb)
}

/// Core reading logic — accepts any `Read` source, useful for tests.
pub fn read_csv_reader<R: Read>(
    reader: R,
    delimiter: u8,
    progress_cb: impl Fn(usize),
) -> Result<RawTable, AppError> {
    let start = Instant::now();

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .double_quote(true)
        .quoting(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(AppError::EmptyFile);
    }

    let mut rows: Vec<RawRow> = Vec::new();
    let mut warnings: Vec<LoadWarning> = Vec::new();
    let mut skipped = 0usize;
    let mut row_idx = 0usize;

    for result in rdr.records() {
        row_idx += 1;
        if row_idx % 500 == 0 {
            progress_cb(row_idx);
        }

        match result {
            Ok(record) => {
                let row: RawRow = headers
                    .iter()
                    .enumerate()
                    .filter(|(_, h)| !h.is_empty())
                    .map(|(i, h)| {
                        let cell = match record.get(i) {
                            Some(v) if !v.is_empty() => CellValue::Text(v.to_string()),
                            _ => CellValue::Null,
                        };
                        (h.clone(), cell)
                    })
                    .collect();
                rows.push(row);
            }
            Err(err) => {
                log::warn!("Skipping CSV record {}: {}", row_idx + 1, err);
                warnings.push(LoadWarning {
                    line: row_idx + 1, // +1 for the header row
                    message: err.to_string(),
                });
                skipped += 1;
            }
        }
    }

    log::info!(
        "Read {} rows ({} skipped) across {} columns",
        rows.len(),
        skipped,
        headers.len()
    );

    Ok(RawTable {
        headers,
        rows,
        warnings,
        skipped_rows: skipped,
        parse_duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Header set of a row sequence: the keys of its first row.
pub fn headers_of(rows: &[RawRow]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().map(str::to_string).collect())
        .unwrap_or_default()
}

/// A dataset after header resolution and normalization.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub headers: Vec<String>,
    pub resolution: ColumnResolution,
    pub tickets: Vec<TicketRecord>,
}

/// Resolve the columns of `rows` and normalize them into tickets.
pub fn ingest(rows: &[RawRow]) -> Ingested {
    let headers = headers_of(rows);
    let resolution = resolve_columns(&headers);
    let tickets = normalize_rows(rows, &resolution.mapping);
    Ingested {
        headers,
        resolution,
        tickets,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
