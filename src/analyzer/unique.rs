use std::collections::{BTreeMap, HashSet};

use crate::parser::fields::{CanonicalField, ALL};
use crate::parser::types::TicketRecord;

/// Filter option lists: `"All"` first, then distinct values in first-seen order.
pub type UniqueValues = BTreeMap<CanonicalField, Vec<String>>;

/// Collect the distinct trimmed values of every filterable field.
///
/// Values are compared case-sensitively, so `"Open"` and `"open"` are two
/// options even though filtering treats them as the same value.
pub fn extract_unique_values(records: &[TicketRecord]) -> UniqueValues {
    let mut unique: UniqueValues = CanonicalField::FILTERABLE
        .iter()
        .map(|f| (*f, vec![ALL.to_string()]))
        .collect();
    let mut seen: BTreeMap<CanonicalField, HashSet<String>> = CanonicalField::FILTERABLE
        .iter()
        .map(|f| (*f, HashSet::from([ALL.to_string()])))
        .collect();

    for ticket in records {
        for field in CanonicalField::FILTERABLE {
            let value = option_value(ticket, field);
            if value.is_empty() {
                continue;
            }
            let Some(seen) = seen.get_mut(&field) else {
                continue;
            };
            if seen.insert(value.clone()) {
                if let Some(list) = unique.get_mut(&field) {
                    list.push(value);
                }
            }
        }
    }

    unique
}

/// Normalized attribute, or the raw cell under the capitalized attribute key
/// (`Technology`, `Client`, ...) when the attribute is empty.
fn option_value(ticket: &TicketRecord, field: CanonicalField) -> String {
    let value = ticket.field(field);
    let value = value.trim();
    if !value.is_empty() {
        return value.to_string();
    }
    let key = field.attribute().key();
    let mut chars = key.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => return String::new(),
    };
    ticket
        .raw
        .get(&capitalized)
        .map(|v| v.as_text().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::test_support::table;

    #[test]
    fn test_empty_records_only_all() {
        let unique = extract_unique_values(&[]);
        assert_eq!(unique.len(), CanonicalField::FILTERABLE.len());
        for values in unique.values() {
            assert_eq!(values, &vec![ALL.to_string()]);
        }
        assert!(!unique.contains_key(&CanonicalField::StartDate));
    }

    #[test]
    fn test_first_seen_order_and_dedup() {
        let data = table(
            &["Technology", "Status"],
            &[&["SAP", "Open"], &["Oracle", "Closed"], &["SAP", "Open"]],
        );
        let unique = extract_unique_values(&data.tickets);
        assert_eq!(
            unique[&CanonicalField::Technology],
            vec!["All".to_string(), "SAP".into(), "Oracle".into()]
        );
        assert_eq!(
            unique[&CanonicalField::State],
            vec!["All".to_string(), "Open".into(), "Closed".into()]
        );
    }

    #[test]
    fn test_case_variants_are_distinct() {
        let data = table(&["Status"], &[&["Open"], &["open"], &["OPEN "]]);
        let unique = extract_unique_values(&data.tickets);
        assert_eq!(
            unique[&CanonicalField::State],
            vec!["All".to_string(), "Open".into(), "open".into(), "OPEN".into()]
        );
    }

    #[test]
    fn test_empty_values_skipped_and_defaults_listed() {
        let data = table(&["Status", "Priority"], &[&["Open", ""]]);
        let unique = extract_unique_values(&data.tickets);
        // priority defaults to "" and is skipped
        assert_eq!(unique[&CanonicalField::Priority], vec!["All".to_string()]);
        // assignedTo defaults to "Unassigned"
        assert_eq!(
            unique[&CanonicalField::AssignedTo],
            vec!["All".to_string(), "Unassigned".into()]
        );
    }

    #[test]
    fn test_customer_options_come_from_client() {
        let data = table(&["Client"], &[&["Acme"], &["Globex"]]);
        let unique = extract_unique_values(&data.tickets);
        assert_eq!(
            unique[&CanonicalField::Customer],
            vec!["All".to_string(), "Acme".into(), "Globex".into()]
        );
    }
}
