pub mod ticket_report;

pub use ticket_report::generate_ticket_report;

use rust_xlsxwriter::{Format, FormatBorder};

/// Header row: white bold text on dark blue, thin border.
pub fn create_header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color("2C5F8A")
        .set_font_color("FFFFFF")
        .set_font_size(11)
        .set_border(FormatBorder::Thin)
        .set_text_wrap()
}

/// Dates as shown on the dashboard: mm/dd/yyyy.
pub fn create_date_format() -> Format {
    Format::new().set_num_format("mm/dd/yyyy")
}

pub fn create_integer_format() -> Format {
    Format::new().set_num_format("#,##0")
}

pub fn create_percent_format() -> Format {
    Format::new().set_num_format("0.0%")
}
