use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::parser::deserializers::US_DATE_FMT;
use crate::parser::fields::{CanonicalField, ALL};
use crate::parser::types::TicketRecord;

/// Matching key for categorical values: lower-cased and trimmed.
pub fn normalize_value(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Current filter selection: an inclusive day range plus one selection list per
/// filterable field. A list containing `"All"` does not restrict its field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(flatten)]
    selections: BTreeMap<CanonicalField, Vec<String>>,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            start_date: None,
            end_date: None,
            selections: CanonicalField::FILTERABLE
                .iter()
                .map(|f| (*f, vec![ALL.to_string()]))
                .collect(),
        }
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_selection<S: Into<String>>(
        mut self,
        field: CanonicalField,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.set_selection(field, values);
        self
    }

    /// Replace a field's selection. An empty list resets it to `["All"]`;
    /// date fields are ignored (they are filtered through the date range).
    pub fn set_selection<S: Into<String>>(
        &mut self,
        field: CanonicalField,
        values: impl IntoIterator<Item = S>,
    ) {
        if field.is_date() {
            return;
        }
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            values.push(ALL.to_string());
        }
        self.selections.insert(field, values);
    }

    pub fn selection(&self, field: CanonicalField) -> &[String] {
        match self.selections.get(&field) {
            Some(values) if !values.is_empty() => values.as_slice(),
            _ => &[],
        }
    }

    /// True when the field's selection narrows the record set.
    pub fn is_restricted(&self, field: CanonicalField) -> bool {
        let values = self.selection(field);
        !values.is_empty() && !values.iter().any(|v| v == ALL)
    }

    /// Fields with a restricting selection, in canonical order.
    pub fn active_filters(&self) -> Vec<(CanonicalField, &[String])> {
        CanonicalField::FILTERABLE
            .into_iter()
            .filter(|f| self.is_restricted(*f))
            .map(|f| (f, self.selection(f)))
            .collect()
    }

    /// Reset every categorical selection to `"All"`, keeping the date range.
    pub fn reset_selections(&mut self) {
        for field in CanonicalField::FILTERABLE {
            self.selections.insert(field, vec![ALL.to_string()]);
        }
    }

    pub fn date_range_label(&self) -> String {
        let fmt = |d: NaiveDate| d.format(US_DATE_FMT).to_string();
        match (self.start_date, self.end_date) {
            (Some(s), Some(e)) => format!("{} - {}", fmt(s), fmt(e)),
            (Some(s), None) => format!("from {}", fmt(s)),
            (None, Some(e)) => format!("until {}", fmt(e)),
            (None, None) => "all dates".to_string(),
        }
    }

    /// Human-readable description of the active constraints, e.g.
    /// `01/01/2024 - 01/31/2024 and filters: Technology: SAP, Client: Acme`.
    pub fn summary(&self) -> String {
        let active: Vec<String> = self
            .active_filters()
            .into_iter()
            .map(|(field, values)| format!("{}: {}", field.display_name(), values.join(", ")))
            .collect();
        let mut summary = self.date_range_label();
        if !active.is_empty() {
            summary.push_str(" and filters: ");
            summary.push_str(&active.join(", "));
        }
        summary
    }

    /// Precompute normalized selection sets for repeated matching.
    pub fn predicate(&self) -> FilterPredicate {
        FilterPredicate {
            start: self.start_date,
            end: self.end_date,
            fields: self
                .active_filters()
                .into_iter()
                .map(|(field, values)| {
                    let set = values.iter().map(|v| normalize_value(v)).collect();
                    (field, set)
                })
                .collect(),
        }
    }

    pub fn matches(&self, ticket: &TicketRecord) -> bool {
        self.predicate().matches(ticket)
    }
}

/// A compiled `FilterState`.
#[derive(Debug, Clone)]
pub struct FilterPredicate {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    fields: Vec<(CanonicalField, HashSet<String>)>,
}

impl FilterPredicate {
    pub fn matches(&self, ticket: &TicketRecord) -> bool {
        self.date_matches(ticket)
            && self
                .fields
                .iter()
                .all(|(field, allowed)| allowed.contains(&normalize_value(&ticket.field(*field))))
    }

    /// A missing bound leaves that side open. With any bound set, tickets whose
    /// date cannot be read are excluded.
    fn date_matches(&self, ticket: &TicketRecord) -> bool {
        if self.start.is_none() && self.end.is_none() {
            return true;
        }
        let Some(day) = ticket.date_value().map(|dt| dt.date()) else {
            return false;
        };
        self.start.map_or(true, |s| day >= s) && self.end.map_or(true, |e| day <= e)
    }
}

/// Result of filtering plus what a host needs to report an empty result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOutcome {
    pub tickets: Vec<TicketRecord>,
    /// A non-empty input was filtered down to nothing.
    pub empty: bool,
    pub active_filter_summary: String,
}

/// Apply `filters` to `records`, returning a fresh view in input order.
pub fn apply_filters(records: &[TicketRecord], filters: &FilterState) -> FilterOutcome {
    let predicate = filters.predicate();
    let tickets: Vec<TicketRecord> = records
        .iter()
        .filter(|t| predicate.matches(t))
        .cloned()
        .collect();
    let empty = tickets.is_empty() && !records.is_empty();
    let active_filter_summary = filters.summary();

    if empty {
        log::warn!("No tickets match {}", active_filter_summary);
    } else {
        log::info!("Filtered {} of {} tickets", tickets.len(), records.len());
    }

    FilterOutcome {
        tickets,
        empty,
        active_filter_summary,
    }
}
