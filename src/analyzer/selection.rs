use std::collections::HashSet;

use serde::Serialize;

use crate::analyzer::filter::normalize_value;
use crate::parser::columns::{ColumnLabel, ColumnMapping};
use crate::parser::deserializers::{cell_to_datetime, format_us_date, parse_ticket_date};
use crate::parser::fields::CanonicalField;
use crate::parser::types::{CellValue, TicketRecord};

const DATE_CATEGORY: &str = "date";
const CONFIGURATION_ITEM: &str = "configurationItem";
const LEGACY_CONFIGURATION_ITEM: &str = "Configuration Item";

/// Matching key for a drill-down value. Under the `date` category both sides
/// are read as dates and rendered `MM/DD/YYYY`, since chart axis labels and
/// stored dates do not share a format; unparseable dates become `""`.
fn selection_key(category: &str, value: &str) -> String {
    if category != DATE_CATEGORY {
        return normalize_value(value);
    }
    date_key(value)
}

/// Same layouts as filtering and the time series, then the value with `-`
/// read as `/`.
fn date_key(value: &str) -> String {
    if value.trim().is_empty() {
        return String::new();
    }
    parse_ticket_date(value)
        .or_else(|| parse_ticket_date(&value.replace('-', "/")))
        .map(|dt| format_us_date(&dt))
        .unwrap_or_default()
}

fn record_key(ticket: &TicketRecord, category: &str) -> Option<String> {
    match category {
        DATE_CATEGORY => Some(match cell_to_datetime(&ticket.date) {
            Some(dt) => format_us_date(&dt),
            None => match &ticket.date {
                CellValue::Text(s) => date_key(s),
                _ => String::new(),
            },
        }),
        CONFIGURATION_ITEM => {
            let canonical = normalize_value(&ticket.configuration_item);
            if !canonical.is_empty() {
                return Some(canonical);
            }
            let legacy = ticket
                .raw
                .get(LEGACY_CONFIGURATION_ITEM)
                .map(|v| normalize_value(&v.as_text()))
                .unwrap_or_default();
            Some(if legacy.is_empty() {
                "unknown".to_string()
            } else {
                legacy
            })
        }
        _ => ticket.lookup(category).map(|v| normalize_value(&v)),
    }
}

/// Tickets of the current filtered view whose `category` value is one of
/// `values`, compared case-insensitively, in view order.
///
/// An empty category selects nothing. Tickets with no value under the
/// category never match.
pub fn select_tickets<S: AsRef<str>>(
    filtered: &[TicketRecord],
    category: &str,
    values: &[S],
) -> Vec<TicketRecord> {
    if category.is_empty() {
        return Vec::new();
    }
    let wanted: HashSet<String> = values
        .iter()
        .map(|v| selection_key(category, v.as_ref()))
        .collect();

    filtered
        .iter()
        .filter(|t| record_key(t, category).is_some_and(|k| wanted.contains(&k)))
        .cloned()
        .collect()
}

/// Active drill-down: the clicked category, the clicked value(s) joined with
/// `", "`, and the matching tickets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub category: String,
    pub value: String,
    pub tickets: Vec<TicketRecord>,
}

impl Selection {
    pub fn new<S: AsRef<str>>(filtered: &[TicketRecord], category: &str, values: &[S]) -> Self {
        let tickets = select_tickets(filtered, category, values);
        log::debug!(
            "Selected {} of {} tickets for {}",
            tickets.len(),
            filtered.len(),
            category
        );
        Selection {
            category: category.to_string(),
            value: values
                .iter()
                .map(|v| v.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            tickets,
        }
    }

    /// Panel heading, e.g. `Open status Tickets`.
    pub fn title(&self) -> String {
        if self.category.is_empty() || self.value.is_empty() {
            return "Selected Tickets".to_string();
        }
        format!("{} {} Tickets", self.value, self.category)
    }
}

/// A column of the drill-down ticket table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayColumn {
    /// Record key read for each row (`TicketRecord::lookup`).
    pub key: &'static str,
    pub label: String,
}

const PANEL_COLUMNS: &[(&str, CanonicalField, &str)] = &[
    ("ticketNumber", CanonicalField::TicketNumber, "Ticket Number"),
    ("date", CanonicalField::StartDate, "Date"),
    ("client", CanonicalField::Customer, "Client"),
    ("technology", CanonicalField::Technology, "Technology"),
    ("ticketType", CanonicalField::TicketType, "Ticket Type"),
    ("status", CanonicalField::State, "Status"),
    ("assignedTo", CanonicalField::AssignedTo, "Assigned To"),
    ("assignmentGroup", CanonicalField::AssignmentGroup, "Assignment Group"),
    ("createdBy", CanonicalField::CreatedBy, "Created By"),
    ("priority", CanonicalField::Priority, "Priority"),
];

/// Columns shown for a selection: only fields the dataset maps, labelled by
/// their source header, without the column the selection was made on.
pub fn display_columns(
    mapping: &ColumnMapping,
    labels: &ColumnLabel,
    category: Option<&str>,
) -> Vec<DisplayColumn> {
    let excluded = category.map(str::to_lowercase);
    PANEL_COLUMNS
        .iter()
        .filter(|(_, field, _)| mapping.is_supported(*field))
        .filter(|(key, _, _)| excluded.as_deref() != Some(key.to_lowercase().as_str()))
        .map(|&(key, field, default)| DisplayColumn {
            key,
            label: labels.get(field).unwrap_or(default).to_string(),
        })
        .collect()
}
