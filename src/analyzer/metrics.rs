use serde::Serialize;

use crate::analyzer::filter::normalize_value;
use crate::config::EngineConfig;
use crate::parser::types::TicketRecord;

/// Headline counters shown above the charts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketMetrics {
    pub total_tickets: usize,
    pub open_tickets: usize,
    pub resolved_tickets: usize,
}

/// Status of a ticket for counting, trimmed and lower-cased: the raw `Status`
/// cell when the export has one, else the normalized status.
fn status_of(ticket: &TicketRecord) -> String {
    ticket
        .raw
        .non_blank("Status")
        .map(|v| normalize_value(&v.as_text()))
        .unwrap_or_else(|| normalize_value(&ticket.status))
}

fn listed(statuses: &[String], status: &str) -> bool {
    statuses.iter().any(|s| normalize_value(s) == status)
}

pub fn compute_metrics(records: &[TicketRecord], config: &EngineConfig) -> TicketMetrics {
    let mut metrics = TicketMetrics {
        total_tickets: records.len(),
        ..TicketMetrics::default()
    };
    for ticket in records {
        let status = status_of(ticket);
        if listed(&config.open_statuses, &status) {
            metrics.open_tickets += 1;
        }
        if listed(&config.resolved_statuses, &status) {
            metrics.resolved_tickets += 1;
        }
    }
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::test_support::table;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(
            compute_metrics(&[], &EngineConfig::default()),
            TicketMetrics::default()
        );
    }

    #[test]
    fn test_counts_with_default_statuses() {
        let data = table(
            &["Status"],
            &[&["Open"], &["In Progress"], &["Closed"], &["CLOSED"], &["Cancelled"], &["hold"]],
        );
        let m = compute_metrics(&data.tickets, &EngineConfig::default());
        assert_eq!(m.total_tickets, 6);
        assert_eq!(m.open_tickets, 3);
        assert_eq!(m.resolved_tickets, 2);
    }

    #[test]
    fn test_custom_statuses_and_mapped_state_column() {
        let data = table(&["State"], &[&["New"], &["Resolved"], &["Closed"]]);
        let config = EngineConfig {
            open_statuses: vec!["new".into()],
            resolved_statuses: vec!["resolved".into(), "closed".into()],
            ..EngineConfig::default()
        };
        let m = compute_metrics(&data.tickets, &config);
        assert_eq!((m.open_tickets, m.resolved_tickets), (1, 2));
    }

    #[test]
    fn test_padded_cells_and_capitalized_config() {
        let data = table(&["Status"], &[&["Closed "], &[" open"], &["Open"]]);
        let config = EngineConfig {
            open_statuses: vec!["Open".into()],
            resolved_statuses: vec![" Closed".into()],
            ..EngineConfig::default()
        };
        let m = compute_metrics(&data.tickets, &config);
        assert_eq!((m.open_tickets, m.resolved_tickets), (2, 1));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(TicketMetrics {
            total_tickets: 3,
            open_tickets: 1,
            resolved_tickets: 2,
        })
        .unwrap();
        assert_eq!(json["totalTickets"], 3);
        assert_eq!(json["resolvedTickets"], 2);
    }
}
