use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parser::fields::{CanonicalField, CUSTOMER_PREFERRED_HEADERS, HEADER_ALIASES};

/// Lower-case, collapse inner whitespace, trim.
pub fn normalize_header(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalized header → original header, in header order.
/// The first header wins when two normalize to the same key.
struct HeaderIndex<'a> {
    entries: Vec<(String, &'a str)>,
}

impl<'a> HeaderIndex<'a> {
    fn new<S: AsRef<str>>(headers: &'a [S]) -> Self {
        let mut entries: Vec<(String, &'a str)> = Vec::with_capacity(headers.len());
        for header in headers {
            let original = header.as_ref();
            let key = normalize_header(original);
            if key.is_empty() || entries.iter().any(|(k, _)| *k == key) {
                continue;
            }
            entries.push((key, original));
        }
        HeaderIndex { entries }
    }

    fn exact(&self, alias: &str) -> Option<&'a str> {
        self.entries
            .iter()
            .find(|(k, _)| k == alias)
            .map(|(_, original)| *original)
    }

    fn containing(&self, alias: &str) -> Option<&'a str> {
        self.entries
            .iter()
            .find(|(k, _)| k.contains(alias))
            .map(|(_, original)| *original)
    }
}

/// Canonical field → column name (or display label). Every field has an
/// entry; `None` marks a field the dataset does not carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldColumns(BTreeMap<CanonicalField, Option<String>>);

/// Canonical field → source column name, used to read values from raw rows.
pub type ColumnMapping = FieldColumns;

/// Canonical field → label shown in the UI for that field.
pub type ColumnLabel = FieldColumns;

impl FieldColumns {
    /// All fields unresolved.
    pub fn unresolved() -> Self {
        FieldColumns(CanonicalField::ALL.into_iter().map(|f| (f, None)).collect())
    }

    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.0.get(&field).and_then(|v| v.as_deref())
    }

    pub fn is_supported(&self, field: CanonicalField) -> bool {
        self.get(field).is_some()
    }

    /// The field whose value equals `name` exactly, in canonical order.
    pub fn field_named(&self, name: &str) -> Option<CanonicalField> {
        self.0
            .iter()
            .find(|(_, v)| v.as_deref() == Some(name))
            .map(|(f, _)| *f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, Option<&str>)> {
        self.0.iter().map(|(f, v)| (*f, v.as_deref()))
    }

    pub fn resolved_count(&self) -> usize {
        self.0.values().filter(|v| v.is_some()).count()
    }

    pub(crate) fn set(&mut self, field: CanonicalField, value: Option<String>) {
        self.0.insert(field, value);
    }
}

impl Default for FieldColumns {
    fn default() -> Self {
        Self::unresolved()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnResolution {
    pub mapping: ColumnMapping,
    pub labels: ColumnLabel,
}

/// Map spreadsheet headers onto the canonical fields.
///
/// For each field every alias is first tried as an exact match against the
/// normalized headers, then as a substring of them (first header in header
/// order). Earlier aliases win. `customer` is then overridden by a header
/// literally named `Client`, `Customer` or `Site`, in that preference.
pub fn resolve_columns<S: AsRef<str>>(headers: &[S]) -> ColumnResolution {
    let index = HeaderIndex::new(headers);
    let mut resolution = ColumnResolution::default();

    for (field, aliases) in HEADER_ALIASES {
        let mut found = aliases
            .iter()
            .find_map(|alias| index.exact(alias))
            .or_else(|| aliases.iter().find_map(|alias| index.containing(alias)));

        if *field == CanonicalField::Customer {
            let preferred = CUSTOMER_PREFERRED_HEADERS
                .iter()
                .find_map(|p| headers.iter().map(|h| h.as_ref()).find(|h| *h == *p));
            if preferred.is_some() {
                found = preferred;
            }
        }

        let found = found.map(str::to_string);
        resolution.mapping.set(*field, found.clone());
        resolution.labels.set(*field, found);
    }

    log::debug!(
        "Column mapping resolved {}/{} fields: {:?}",
        resolution.mapping.resolved_count(),
        CanonicalField::ALL.len(),
        resolution.mapping
    );

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Assigned   To "), "assigned to");
        assert_eq!(normalize_header("Ticket\tNumber"), "ticket number");
        assert_eq!(normalize_header(""), "");
    }

    #[test]
    fn test_resolve_reference_headers() {
        let headers = [
            "Ticket Number",
            "Created",
            "Technology/Platform",
            "Client",
            "Priority",
        ];
        let r = resolve_columns(&headers);
        let m = &r.mapping;
        assert_eq!(m.get(CanonicalField::TicketNumber), Some("Ticket Number"));
        assert_eq!(m.get(CanonicalField::StartDate), Some("Created"));
        assert_eq!(m.get(CanonicalField::Technology), Some("Technology/Platform"));
        assert_eq!(m.get(CanonicalField::Customer), Some("Client"));
        assert_eq!(m.get(CanonicalField::Priority), Some("Priority"));
        assert_eq!(m.get(CanonicalField::EndDate), None);
        assert_eq!(m.get(CanonicalField::State), None);
        assert_eq!(r.labels, r.mapping);
    }

    #[test]
    fn test_every_field_has_an_entry() {
        let r = resolve_columns::<&str>(&[]);
        assert_eq!(r.mapping.iter().count(), CanonicalField::ALL.len());
        assert_eq!(r.mapping.resolved_count(), 0);
        assert_eq!(r.labels.iter().count(), CanonicalField::ALL.len());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let headers = ["Number", "Status", "Assignment group", "Opened by", "CI name"];
        assert_eq!(resolve_columns(&headers), resolve_columns(&headers));
    }

    #[test]
    fn test_exact_match_beats_substring() {
        // "start date" is a substring of "planned start date", but "created" is
        // an exact header.
        let headers = ["Planned Start Date", "Created"];
        let r = resolve_columns(&headers);
        assert_eq!(r.mapping.get(CanonicalField::StartDate), Some("Created"));
    }

    #[test]
    fn test_substring_match() {
        let headers = ["Created Date", "Current State"];
        let r = resolve_columns(&headers);
        assert_eq!(r.mapping.get(CanonicalField::StartDate), Some("Created Date"));
        assert_eq!(r.mapping.get(CanonicalField::State), Some("Current State"));
    }

    #[test]
    fn test_substring_first_header_wins() {
        let headers = ["Primary Group", "Assignment Group Name"];
        let r = resolve_columns(&headers);
        // "assignment group" is tried before "group" across the whole header list
        assert_eq!(
            r.mapping.get(CanonicalField::AssignmentGroup),
            Some("Assignment Group Name")
        );
        let r = resolve_columns(&["Primary Group", "Secondary Group"]);
        assert_eq!(
            r.mapping.get(CanonicalField::AssignmentGroup),
            Some("Primary Group")
        );
    }

    #[test]
    fn test_earlier_alias_wins() {
        let headers = ["Status", "State"];
        let r = resolve_columns(&headers);
        assert_eq!(r.mapping.get(CanonicalField::State), Some("State"));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let headers = ["ASSIGNED   TO", "ticket  NUMBER"];
        let r = resolve_columns(&headers);
        assert_eq!(r.mapping.get(CanonicalField::AssignedTo), Some("ASSIGNED   TO"));
        assert_eq!(
            r.mapping.get(CanonicalField::TicketNumber),
            Some("ticket  NUMBER")
        );
    }

    #[test]
    fn test_customer_prefers_client() {
        let r = resolve_columns(&["Customer", "Site", "Client"]);
        assert_eq!(r.mapping.get(CanonicalField::Customer), Some("Client"));
        let r = resolve_columns(&["Site", "Customer"]);
        assert_eq!(r.mapping.get(CanonicalField::Customer), Some("Customer"));
        let r = resolve_columns(&["Site"]);
        assert_eq!(r.mapping.get(CanonicalField::Customer), Some("Site"));
    }

    #[test]
    fn test_customer_generic_search_without_literal_header() {
        let r = resolve_columns(&["Customer Name"]);
        assert_eq!(r.mapping.get(CanonicalField::Customer), Some("Customer Name"));
        assert_eq!(r.labels.get(CanonicalField::Customer), Some("Customer Name"));
    }

    #[test]
    fn test_duplicate_normalized_headers_first_wins() {
        let headers = ["Status", "status "];
        let r = resolve_columns(&headers);
        assert_eq!(r.mapping.get(CanonicalField::State), Some("Status"));
    }

    #[test]
    fn test_field_named() {
        let r = resolve_columns(&["Technology/Platform", "Client"]);
        assert_eq!(
            r.labels.field_named("Technology/Platform"),
            Some(CanonicalField::Technology)
        );
        assert_eq!(r.labels.field_named("Nope"), None);
    }

    #[test]
    fn test_mapping_serializes_with_nulls() {
        let r = resolve_columns(&["Priority"]);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["mapping"]["priority"], "Priority");
        assert!(json["mapping"]["endDate"].is_null());
        assert!(json["labels"]["customer"].is_null());
    }
}
