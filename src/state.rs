use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analyzer::category::{aggregate_category, CategoryDatum};
use crate::analyzer::filter::{self, FilterState};
use crate::analyzer::metrics::{compute_metrics, TicketMetrics};
use crate::analyzer::selection::{display_columns, DisplayColumn, Selection};
use crate::analyzer::temporal::{self, Granularity, TimePoint};
use crate::analyzer::unique::{extract_unique_values, UniqueValues};
use crate::config::EngineConfig;
use crate::error::AppError;
use crate::export::generate_ticket_report;
use crate::parser::columns::{ColumnLabel, ColumnMapping, ColumnResolution};
use crate::parser::fields::CanonicalField;
use crate::parser::pipeline::{ingest, read_csv};
use crate::parser::types::{LoadWarning, RawRow, TicketRecord};

const NO_VALID_DATA: &str = "No Valid Data Found";
const NO_DATA_AVAILABLE: &str = "No Data Available";

/// Advisory message for the user. Never an error: the session stays usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

/// Partial filter update. Unset members leave the current value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub selections: BTreeMap<CanonicalField, Vec<String>>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_date(mut self, date: Option<NaiveDate>) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: Option<NaiveDate>) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn select<S: Into<String>>(
        mut self,
        field: CanonicalField,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.selections
            .insert(field, values.into_iter().map(Into::into).collect());
        self
    }

    fn merge_into(self, filters: &mut FilterState) {
        if let Some(start) = self.start_date {
            filters.start_date = start;
        }
        if let Some(end) = self.end_date {
            filters.end_date = end;
        }
        for (field, values) in self.selections {
            filters.set_selection(field, values);
        }
    }
}

/// One loaded dataset and everything derived from it for display: the
/// filtered view, filter options, and the current drill-down.
///
/// Derived views are rebuilt wholesale; the loaded tickets are never mutated.
#[derive(Debug)]
pub struct Dashboard {
    config: EngineConfig,
    loaded: bool,
    headers: Vec<String>,
    resolution: ColumnResolution,
    tickets: Vec<TicketRecord>,
    filtered: Vec<TicketRecord>,
    unique_values: UniqueValues,
    filters: FilterState,
    selection: Option<Selection>,
    panel_open: bool,
    notices: Vec<Notice>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Dashboard::new(EngineConfig::default())
    }
}

impl Dashboard {
    pub fn new(config: EngineConfig) -> Self {
        Dashboard {
            config,
            loaded: false,
            headers: Vec::new(),
            resolution: ColumnResolution::default(),
            tickets: Vec::new(),
            filtered: Vec::new(),
            unique_values: extract_unique_values(&[]),
            filters: FilterState::default(),
            selection: None,
            panel_open: false,
            notices: Vec::new(),
        }
    }

    // ─── Loading ─────────────────────────────────────────────────────────────

    /// Replace the dataset. Categorical filters are reset, the date range is
    /// kept, and the new tickets are filtered right away.
    pub fn load_rows(&mut self, rows: &[RawRow]) {
        let ingested = ingest(rows);
        log::info!(
            "Loaded {} tickets, {} of {} fields mapped",
            ingested.tickets.len(),
            ingested.resolution.mapping.resolved_count(),
            CanonicalField::ALL.len()
        );

        self.headers = ingested.headers;
        self.resolution = ingested.resolution;
        self.tickets = ingested.tickets;
        self.loaded = true;
        self.unique_values = extract_unique_values(&self.tickets);

        if self.tickets.is_empty() {
            log::warn!("Loaded file has no ticket rows");
            self.notices.push(Notice {
                title: NO_VALID_DATA.to_string(),
                description: "The uploaded file contains no valid ticket data. \
                              Please check your file format and try again."
                    .to_string(),
            });
        }

        self.filters.reset_selections();
        self.apply_filters();
    }

    /// Read a CSV export with the configured delimiter and load it. Returns
    /// the warnings for records that could not be read.
    pub fn load_csv(&mut self, path: impl AsRef<Path>) -> Result<Vec<LoadWarning>, AppError> {
        let table = read_csv(path, self.config.delimiter_byte(), |n| {
            log::debug!("Read {} rows", n)
        })?;
        self.load_rows(&table.rows);
        Ok(table.warnings)
    }

    // ─── Filtering ───────────────────────────────────────────────────────────

    /// Recompute the filtered view and its option lists from the current
    /// filters. Clears the drill-down. No-op before a dataset is loaded.
    pub fn apply_filters(&mut self) {
        if !self.loaded {
            return;
        }
        let outcome = filter::apply_filters(&self.tickets, &self.filters);
        self.filtered = outcome.tickets;
        self.selection = None;
        self.unique_values = extract_unique_values(&self.filtered);

        if outcome.empty {
            self.notices.push(Notice {
                title: NO_DATA_AVAILABLE.to_string(),
                description: format!(
                    "No data found for the selected date range: {}. \
                     Please adjust your filters or date range.",
                    outcome.active_filter_summary
                ),
            });
        }
    }

    pub fn update_filters(&mut self, patch: FilterPatch, apply_now: bool) {
        patch.merge_into(&mut self.filters);
        if apply_now {
            self.apply_filters();
        }
    }

    /// Clear every filter, dates included, and show the whole dataset.
    pub fn reset_filters(&mut self) {
        self.filters = FilterState::default();
        self.filtered = self.tickets.clone();
        self.unique_values = extract_unique_values(&self.filtered);
    }

    // ─── Drill-down ──────────────────────────────────────────────────────────

    /// Select the filtered tickets behind a chart element and open the panel.
    pub fn select_by_category<S: AsRef<str>>(
        &mut self,
        category: &str,
        values: &[S],
    ) -> Option<&Selection> {
        if !self.loaded {
            return None;
        }
        self.selection = Some(Selection::new(&self.filtered, category, values));
        self.panel_open = true;
        self.selection.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.panel_open = false;
    }

    pub fn toggle_panel(&mut self) {
        self.panel_open = !self.panel_open;
    }

    /// Panel columns for the current selection.
    pub fn selection_columns(&self) -> Vec<DisplayColumn> {
        let category = self.selection.as_ref().map(|s| s.category.as_str());
        display_columns(self.mapping(), self.labels(), category)
    }

    // ─── Charts ──────────────────────────────────────────────────────────────

    pub fn category_data(&self, field_or_label: &str) -> Vec<CategoryDatum> {
        aggregate_category(&self.filtered, field_or_label, self.labels(), self.mapping())
    }

    /// Ticket counts over time. Without an explicit granularity one is picked
    /// from the filter date range, or monthly when the range is open.
    pub fn time_series(&self, granularity: Option<Granularity>) -> Vec<TimePoint> {
        let granularity = granularity.unwrap_or_else(|| {
            match (self.filters.start_date, self.filters.end_date) {
                (Some(s), Some(e)) => temporal::auto_granularity((e - s).num_days()),
                _ => Granularity::Month,
            }
        });
        temporal::time_series(&self.filtered, granularity)
    }

    pub fn metrics(&self) -> TicketMetrics {
        compute_metrics(&self.filtered, &self.config)
    }

    // ─── Export ──────────────────────────────────────────────────────────────

    /// XLSX of the current selection, summarised by its category.
    pub fn export_selection(&self) -> Result<Vec<u8>, AppError> {
        let selection = self
            .selection
            .as_ref()
            .ok_or_else(|| AppError::Custom("No tickets selected".to_string()))?;
        let breakdown = aggregate_category(
            &selection.tickets,
            &selection.category,
            self.labels(),
            self.mapping(),
        );
        generate_ticket_report(&selection.tickets, &self.selection_columns(), &breakdown)
    }

    /// XLSX of the filtered view, summarised by `breakdown_by`.
    pub fn export_filtered(&self, breakdown_by: &str) -> Result<Vec<u8>, AppError> {
        let columns = display_columns(self.mapping(), self.labels(), None);
        generate_ticket_report(&self.filtered, &columns, &self.category_data(breakdown_by))
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.resolution.mapping
    }

    pub fn labels(&self) -> &ColumnLabel {
        &self.resolution.labels
    }

    pub fn tickets(&self) -> &[TicketRecord] {
        &self.tickets
    }

    pub fn filtered(&self) -> &[TicketRecord] {
        &self.filtered
    }

    pub fn unique_values(&self) -> &UniqueValues {
        &self.unique_values
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    /// Drain pending notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

// ─── Preferences ─────────────────────────────────────────────────────────────

const DARK_MODE_KEY: &str = "darkMode";

/// Key/value storage for user preferences, supplied by the host.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

/// Stored theme, or the system preference when nothing valid is stored.
pub fn dark_mode(store: &impl PreferenceStore, system_prefers_dark: bool) -> bool {
    store
        .get(DARK_MODE_KEY)
        .and_then(|v| serde_json::from_str::<bool>(&v).ok())
        .unwrap_or(system_prefers_dark)
}

/// Flip the theme and persist it. Returns the new value.
pub fn toggle_dark_mode(store: &mut impl PreferenceStore, current: bool) -> bool {
    let next = !current;
    store.set(DARK_MODE_KEY, next.to_string());
    next
}
