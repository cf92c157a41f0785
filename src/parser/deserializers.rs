use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use crate::parser::types::CellValue;

/// Datetime layouts seen in ticket exports, tried in order. `%d-%m-%Y %H:%M`
/// is the GLPI export layout.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// Display layout shared by chart axis labels and drill-down matching.
pub const US_DATE_FMT: &str = "%m/%d/%Y";

/// Parse a date or datetime string in any of the supported layouts.
/// Offsets are dropped without conversion (wall-clock time is kept).
/// Returns None for empty or unparseable strings.
pub fn parse_ticket_date(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Excel serial day number (1900 date system) → NaiveDateTime.
/// Values outside 1..=9999-12-31 are rejected.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let seconds = (serial.fract() * 86_400.0).round() as i64;
    epoch
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(seconds))
}

/// Interpret a raw cell as a datetime: dates as-is, text through
/// `parse_ticket_date`, numbers as Excel serials.
pub fn cell_to_datetime(cell: &CellValue) -> Option<NaiveDateTime> {
    match cell {
        CellValue::Date(dt) => Some(*dt),
        CellValue::Text(s) => parse_ticket_date(s),
        CellValue::Number(n) => excel_serial_to_datetime(*n),
        CellValue::Null | CellValue::Bool(_) => None,
    }
}

pub fn format_us_date(dt: &NaiveDateTime) -> String {
    dt.format(US_DATE_FMT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hm(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_ticket_date("2024-01-05"), Some(ymd_hm(2024, 1, 5, 0, 0)));
        assert_eq!(
            parse_ticket_date("2024-01-05T10:30:00"),
            Some(ymd_hm(2024, 1, 5, 10, 30))
        );
        assert_eq!(
            parse_ticket_date("2024-01-05 10:30"),
            Some(ymd_hm(2024, 1, 5, 10, 30))
        );
    }

    #[test]
    fn test_parse_rfc3339_keeps_wall_clock() {
        assert_eq!(
            parse_ticket_date("2024-01-05T10:30:00+02:00"),
            Some(ymd_hm(2024, 1, 5, 10, 30))
        );
    }

    #[test]
    fn test_parse_slash_layouts() {
        assert_eq!(parse_ticket_date("2024/01/05"), Some(ymd_hm(2024, 1, 5, 0, 0)));
        assert_eq!(parse_ticket_date("01/05/2024"), Some(ymd_hm(2024, 1, 5, 0, 0)));
        assert_eq!(
            parse_ticket_date("01/05/2024 08:15"),
            Some(ymd_hm(2024, 1, 5, 8, 15))
        );
    }

    #[test]
    fn test_parse_glpi_layout() {
        assert_eq!(
            parse_ticket_date("05-01-2026 16:24"),
            Some(ymd_hm(2026, 1, 5, 16, 24))
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_ticket_date("").is_none());
        assert!(parse_ticket_date("   ").is_none());
        assert!(parse_ticket_date("Unknown").is_none());
        assert!(parse_ticket_date("2024-13-45").is_none());
    }

    #[test]
    fn test_excel_serial() {
        // 45296 = 2024-01-05
        assert_eq!(excel_serial_to_datetime(45296.0), Some(ymd_hm(2024, 1, 5, 0, 0)));
        assert_eq!(excel_serial_to_datetime(45296.5), Some(ymd_hm(2024, 1, 5, 12, 0)));
        assert!(excel_serial_to_datetime(0.0).is_none());
        assert!(excel_serial_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn test_cell_to_datetime() {
        let dt = ymd_hm(2024, 1, 5, 0, 0);
        assert_eq!(cell_to_datetime(&CellValue::Date(dt)), Some(dt));
        assert_eq!(cell_to_datetime(&CellValue::from("2024-01-05")), Some(dt));
        assert_eq!(cell_to_datetime(&CellValue::Number(45296.0)), Some(dt));
        assert_eq!(cell_to_datetime(&CellValue::Null), None);
        assert_eq!(cell_to_datetime(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_format_us_date() {
        assert_eq!(format_us_date(&ymd_hm(2025, 5, 6, 9, 0)), "05/06/2025");
    }
}
