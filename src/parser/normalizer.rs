use crate::parser::columns::ColumnMapping;
use crate::parser::fields::{AttributeRule, DATE_RULE, ID_RULE, TEXT_RULES};
use crate::parser::types::{CellValue, RawRow, TicketRecord};

/// Normalize every raw row into a ticket record. Never drops, reorders or
/// duplicates rows.
pub fn normalize_rows(rows: &[RawRow], mapping: &ColumnMapping) -> Vec<TicketRecord> {
    let tickets: Vec<TicketRecord> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| normalize_row(index, row, mapping))
        .collect();
    log::info!("Normalized {} tickets", tickets.len());
    tickets
}

/// Build one ticket. Total: any row shape yields a record, with defaults for
/// whatever the row does not carry.
pub fn normalize_row(index: usize, row: &RawRow, mapping: &ColumnMapping) -> TicketRecord {
    let id = source_value(row, mapping, &ID_RULE)
        .map(|v| v.as_text().trim().to_string())
        .unwrap_or_else(|| format!("ticket-{index}"));

    let date = source_value(row, mapping, &DATE_RULE)
        .cloned()
        .unwrap_or_else(|| CellValue::Text(DATE_RULE.default.to_string()));

    let mut ticket = TicketRecord::new(id, date, row.clone());
    for rule in TEXT_RULES {
        let value = source_value(row, mapping, rule)
            .map(|v| v.as_text().trim().to_string())
            .unwrap_or_else(|| rule.default.to_string());
        ticket.set_attribute(rule.attribute, value);
    }
    ticket
}

/// First non-blank cell among the mapped column and the rule's literal
/// fallbacks.
fn source_value<'r>(
    row: &'r RawRow,
    mapping: &ColumnMapping,
    rule: &AttributeRule,
) -> Option<&'r CellValue> {
    let mapped = rule.source.and_then(|field| mapping.get(field));
    mapped
        .into_iter()
        .chain(rule.fallbacks.iter().copied())
        .find_map(|key| row.non_blank(key))
}
