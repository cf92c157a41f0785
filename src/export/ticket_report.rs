use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

use crate::analyzer::category::CategoryDatum;
use crate::analyzer::selection::DisplayColumn;
use crate::error::AppError;
use crate::export::{
    create_date_format, create_header_format, create_integer_format, create_percent_format,
};
use crate::parser::types::TicketRecord;

const DATE_KEY: &str = "date";

fn xlsx_err(e: XlsxError) -> AppError {
    AppError::Custom(e.to_string())
}

/// Builds a two-sheet workbook for a ticket list: "Tickets" with one row per
/// ticket under `columns`, and "Summary" with `breakdown` and each entry's
/// share of the total. Returns the XLSX bytes.
pub fn generate_ticket_report(
    tickets: &[TicketRecord],
    columns: &[DisplayColumn],
    breakdown: &[CategoryDatum],
) -> Result<Vec<u8>, AppError> {
    let mut wb = Workbook::new();
    write_tickets(&mut wb, tickets, columns).map_err(xlsx_err)?;
    write_summary(&mut wb, breakdown).map_err(xlsx_err)?;
    log::info!(
        "Exported {} tickets across {} columns",
        tickets.len(),
        columns.len()
    );
    wb.save_to_buffer().map_err(xlsx_err)
}

// ── Tickets ──────────────────────────────────────────────────────────────────

fn write_tickets(
    wb: &mut Workbook,
    tickets: &[TicketRecord],
    columns: &[DisplayColumn],
) -> Result<(), XlsxError> {
    let ws = wb.add_worksheet();
    ws.set_name("Tickets")?;

    let hdr = create_header_format();
    let date = create_date_format();

    for (col, c) in columns.iter().enumerate() {
        ws.write_with_format(0, col as u16, c.label.as_str(), &hdr)?;
        ws.set_column_width(col as u16, column_width(&c.label))?;
    }

    for (i, t) in tickets.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, c) in columns.iter().enumerate() {
            let col = col as u16;
            if c.key == DATE_KEY {
                if let Some(serial) = t.date_value().and_then(|dt| excel_serial(&dt)) {
                    ws.write_with_format(row, col, serial, &date)?;
                    continue;
                }
            }
            if let Some(value) = t.lookup(c.key) {
                ws.write(row, col, value.as_ref())?;
            }
        }
    }

    if !tickets.is_empty() && !columns.is_empty() {
        ws.set_freeze_panes(1, 0)?;
        ws.autofilter(0, 0, tickets.len() as u32, (columns.len() - 1) as u16)?;
    }

    Ok(())
}

fn column_width(label: &str) -> f64 {
    (label.chars().count().max(10) + 4) as f64
}

/// Day number in the 1900 date system, fraction included.
fn excel_serial(dt: &NaiveDateTime) -> Option<f64> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = dt.signed_duration_since(epoch).num_seconds();
    (seconds > 0).then(|| seconds as f64 / 86_400.0)
}

// ── Summary ──────────────────────────────────────────────────────────────────

fn write_summary(wb: &mut Workbook, breakdown: &[CategoryDatum]) -> Result<(), XlsxError> {
    let ws = wb.add_worksheet();
    ws.set_name("Summary")?;

    let hdr = create_header_format();
    let int = create_integer_format();
    let pct = create_percent_format();

    ws.write_with_format(0, 0, "Category", &hdr)?;
    ws.write_with_format(0, 1, "Tickets", &hdr)?;
    ws.write_with_format(0, 2, "%", &hdr)?;
    write_breakdown(ws, 1, breakdown, &int, &pct)?;

    let total_row = (breakdown.len() + 1) as u32;
    let total: usize = breakdown.iter().map(|d| d.value).sum();
    ws.write_with_format(total_row, 0, "Total", &hdr)?;
    ws.write_with_format(total_row, 1, total as f64, &int)?;

    ws.set_column_width(0, 30)?;
    ws.set_column_width(1, 12)?;
    ws.set_column_width(2, 10)?;

    Ok(())
}

fn write_breakdown(
    ws: &mut Worksheet,
    start_row: u32,
    breakdown: &[CategoryDatum],
    int: &rust_xlsxwriter::Format,
    pct: &rust_xlsxwriter::Format,
) -> Result<(), XlsxError> {
    let total: usize = breakdown.iter().map(|d| d.value).sum();
    for (i, d) in breakdown.iter().enumerate() {
        let row = start_row + i as u32;
        ws.write(row, 0, d.name.as_str())?;
        ws.write_with_format(row, 1, d.value as f64, int)?;
        let share = if total == 0 {
            0.0
        } else {
            d.value as f64 / total as f64
        };
        ws.write_with_format(row, 2, share, pct)?;
    }
    Ok(())
}
