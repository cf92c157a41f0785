use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::parser::columns::{ColumnLabel, ColumnMapping};
use crate::parser::fields::{attribute_default, category_aliases, CanonicalField, TicketAttribute};
use crate::parser::types::TicketRecord;

const UNKNOWN: &str = "Unknown";

/// One bar or slice: a category value and how many tickets carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDatum {
    pub name: String,
    pub value: usize,
}

/// Where a chart category reads its value from: record keys probed in order,
/// the first present and non-empty one wins. A record attribute still holding
/// its normalization default only wins when no later key has a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAccessor {
    pub field: Option<CanonicalField>,
    pub keys: Vec<String>,
}

impl CategoryAccessor {
    pub fn value_of(&self, ticket: &TicketRecord) -> String {
        let mut placeholder: Option<Cow<'_, str>> = None;
        for key in &self.keys {
            let Some(value) = ticket.lookup(key).filter(|v| !v.is_empty()) else {
                continue;
            };
            let is_default = TicketAttribute::from_key(key)
                .is_some_and(|attr| value == attribute_default(attr));
            if !is_default {
                return value.into_owned();
            }
            placeholder.get_or_insert(value);
        }
        placeholder
            .map(Cow::into_owned)
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// Resolve the record keys behind a chart category given either a canonical
/// key (`technology`) or a display label (`Technology/Platform`).
///
/// Order: the mapped column of the field whose label matches, or of the
/// canonical field itself; the category name as a record key; the legacy
/// aliases of the field; then lowercase, Title Case and camelCase spellings.
pub fn resolve_accessor(
    field_or_label: &str,
    labels: &ColumnLabel,
    mapping: &ColumnMapping,
) -> CategoryAccessor {
    let by_label = labels
        .field_named(field_or_label)
        .filter(|f| mapping.is_supported(*f));
    let field = by_label.or_else(|| canonical_for(field_or_label));
    let name = by_label.map(CanonicalField::key).unwrap_or(field_or_label);

    let mut keys: Vec<String> = Vec::new();
    let mut push = |key: String| {
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    };

    let mapped = by_label
        .or_else(|| CanonicalField::from_key(field_or_label))
        .and_then(|f| mapping.get(f));
    if let Some(column) = mapped {
        push(column.to_string());
    }
    push(name.to_string());
    if let Some(f) = field {
        for alias in category_aliases(f) {
            push(alias.to_string());
        }
    }
    push(name.to_lowercase());
    push(title_spaced(name));
    if name.contains(' ') {
        push(camel_case(name));
    }

    CategoryAccessor { field, keys }
}

/// Group `records` by the value of a chart category.
///
/// Buckets are keyed by the raw string value, case-sensitive, in order of
/// first appearance. Tickets without a value count as `"Unknown"`.
pub fn aggregate_category(
    records: &[TicketRecord],
    field_or_label: &str,
    labels: &ColumnLabel,
    mapping: &ColumnMapping,
) -> Vec<CategoryDatum> {
    if records.is_empty() {
        return Vec::new();
    }

    let accessor = resolve_accessor(field_or_label, labels, mapping);
    log::debug!(
        "Category {:?} reads keys {:?}",
        field_or_label,
        accessor.keys
    );

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut data: Vec<CategoryDatum> = Vec::new();
    for ticket in records {
        let name = accessor.value_of(ticket);
        match positions.get(&name) {
            Some(&i) => data[i].value += 1,
            None => {
                positions.insert(name.clone(), data.len());
                data.push(CategoryDatum { name, value: 1 });
            }
        }
    }
    data
}

fn canonical_for(name: &str) -> Option<CanonicalField> {
    match name {
        "type" => Some(CanonicalField::TicketType),
        _ => CanonicalField::from_key(name),
    }
}

/// `assignedTo` → `Assigned To`.
fn title_spaced(name: &str) -> String {
    let mut spaced = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            spaced.push(' ');
        }
        spaced.push(c);
    }
    let trimmed = spaced.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `assigned to` → `assignedTo`: a space followed by a lowercase letter
/// becomes that letter upper-cased.
fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' {
            if let Some(next) = chars.peek().copied().filter(|n| n.is_ascii_lowercase()) {
                out.push(next.to_ascii_uppercase());
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::test_support::table;
    use crate::parser::normalizer::normalize_rows;
    use crate::parser::types::RawRow;

    #[test]
    fn test_empty_records() {
        let m = ColumnMapping::unresolved();
        assert!(aggregate_category(&[], "technology", &m, &m).is_empty());
    }

    #[test]
    fn test_groups_by_mapped_column() {
        let data = table(
            &["Technology/Platform", "Status"],
            &[&["SAP"], &["Oracle"], &["SAP"]],
        );
        let r = &data.resolution;
        let chart = aggregate_category(&data.tickets, "technology", &r.labels, &r.mapping);
        assert_eq!(
            chart,
            vec![
                CategoryDatum { name: "SAP".into(), value: 2 },
                CategoryDatum { name: "Oracle".into(), value: 1 },
            ]
        );
    }

    #[test]
    fn test_label_and_key_resolve_to_same_accessor() {
        let data = table(&["Technology/Platform"], &[&["SAP"], &["Oracle"]]);
        let r = &data.resolution;
        let by_key = aggregate_category(&data.tickets, "technology", &r.labels, &r.mapping);
        let by_label =
            aggregate_category(&data.tickets, "Technology/Platform", &r.labels, &r.mapping);
        assert_eq!(by_key, by_label);
        let accessor = resolve_accessor("Technology/Platform", &r.labels, &r.mapping);
        assert_eq!(accessor.field, Some(CanonicalField::Technology));
        assert_eq!(accessor.keys[0], "Technology/Platform");
    }

    #[test]
    fn test_case_sensitive_buckets() {
        let data = table(&["Status"], &[&["Open"], &["open"], &["Open"]]);
        let r = &data.resolution;
        let chart = aggregate_category(&data.tickets, "state", &r.labels, &r.mapping);
        assert_eq!(chart.len(), 2);
        assert_eq!(chart[0], CategoryDatum { name: "Open".into(), value: 2 });
        assert_eq!(chart[1], CategoryDatum { name: "open".into(), value: 1 });
    }

    #[test]
    fn test_sum_equals_record_count() {
        let data = table(
            &["Priority"],
            &[&["P1"], &["P2"], &[""], &["P1"], &["P3"]],
        );
        let r = &data.resolution;
        let chart = aggregate_category(&data.tickets, "priority", &r.labels, &r.mapping);
        let total: usize = chart.iter().map(|d| d.value).sum();
        assert_eq!(total, data.tickets.len());
        assert!(chart.iter().any(|d| d.name == "Unknown" && d.value == 1));
    }

    #[test]
    fn test_unresolvable_category_is_unknown() {
        let data = table(&["Status"], &[&["Open"], &["Closed"]]);
        let r = &data.resolution;
        let chart = aggregate_category(&data.tickets, "nonexistent", &r.labels, &r.mapping);
        assert_eq!(chart, vec![CategoryDatum { name: "Unknown".into(), value: 2 }]);
    }

    #[test]
    fn test_legacy_alias_without_mapping() {
        let rows: Vec<RawRow> = vec![
            vec![("Closed by", "bob")].into_iter().collect(),
            vec![("Closed by", "carol")].into_iter().collect(),
        ];
        let mapping = ColumnMapping::unresolved();
        let tickets = normalize_rows(&rows, &mapping);
        let chart = aggregate_category(&tickets, "closedBy", &mapping, &mapping);
        let names: Vec<&str> = chart.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "carol"]);
    }

    #[test]
    fn test_type_synonym_uses_ticket_type_aliases() {
        let rows: Vec<RawRow> = vec![vec![("Issue Type", "Bug")].into_iter().collect()];
        let mapping = ColumnMapping::unresolved();
        let tickets = normalize_rows(&rows, &mapping);
        let chart = aggregate_category(&tickets, "type", &mapping, &mapping);
        assert_eq!(chart[0].name, "Bug");
    }

    #[test]
    fn test_defaulted_attribute_yields_to_raw_column() {
        let rows: Vec<RawRow> = vec![
            vec![("Category", "Hardware")].into_iter().collect(),
            vec![("Other", "x")].into_iter().collect(),
            vec![("Ticket Type", "Unknown")].into_iter().collect(),
        ];
        let mapping = ColumnMapping::unresolved();
        let tickets = normalize_rows(&rows, &mapping);
        assert_eq!(tickets[0].ticket_type, "Unknown");

        let chart = aggregate_category(&tickets, "type", &mapping, &mapping);
        assert_eq!(
            chart,
            vec![
                CategoryDatum {
                    name: "Hardware".into(),
                    value: 1
                },
                CategoryDatum {
                    name: "Unknown".into(),
                    value: 2
                },
            ]
        );
    }

    #[test]
    fn test_spelling_transforms() {
        let rows: Vec<RawRow> = vec![
            vec![("Short Description", "Printer")].into_iter().collect(),
            vec![("rootCause", "Network")].into_iter().collect(),
        ];
        let mapping = ColumnMapping::unresolved();
        let tickets = normalize_rows(&rows, &mapping);
        let chart = aggregate_category(&tickets, "shortDescription", &mapping, &mapping);
        assert_eq!(chart[0].name, "Printer");
        let chart = aggregate_category(&tickets, "root cause", &mapping, &mapping);
        assert_eq!(chart[1].name, "Network");
    }

    #[test]
    fn test_numeric_cells_stringified() {
        let mut row = RawRow::new();
        row.push("Severity", 3.0);
        let mapping = ColumnMapping::unresolved();
        let tickets = normalize_rows(&[row], &mapping);
        let chart = aggregate_category(&tickets, "Severity", &mapping, &mapping);
        assert_eq!(chart[0].name, "3");
    }

    #[test]
    fn test_title_and_camel() {
        assert_eq!(title_spaced("assignedTo"), "Assigned To");
        assert_eq!(title_spaced("status"), "Status");
        assert_eq!(camel_case("assigned to"), "assignedTo");
        assert_eq!(camel_case("Assigned To"), "Assigned To");
    }
}
