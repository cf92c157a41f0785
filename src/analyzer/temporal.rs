use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::parser::deserializers::US_DATE_FMT;
use crate::parser::types::TicketRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

/// Picks a granularity from the number of days covered.
/// ≤ 14 days → day, < 30 days → week, else → month.
pub fn auto_granularity(days: i64) -> Granularity {
    if days <= 14 {
        Granularity::Day
    } else if days < 30 {
        Granularity::Week
    } else {
        Granularity::Month
    }
}

/// Ticket count for one period of a time-series chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePoint {
    /// Sortable key: `2024-01-05`, `2024-W01` or `2024-01`.
    pub period: String,
    pub label: String,
    pub tickets: usize,
}

/// Gap filling stops beyond this many periods (ten years of days); a mistyped
/// year would otherwise expand to hundreds of thousands of empty points.
const MAX_FILLED_PERIODS: i64 = 3660;

/// Count tickets per period, from the earliest to the latest dated ticket.
/// Periods in between with no tickets are listed with a zero count, unless
/// the span covers more than `MAX_FILLED_PERIODS` periods, in which case only
/// periods holding tickets are listed. Tickets whose date cannot be read are
/// skipped.
pub fn time_series(records: &[TicketRecord], granularity: Granularity) -> Vec<TimePoint> {
    let mut counts: BTreeMap<String, (String, usize)> = BTreeMap::new();
    let mut span: Option<(NaiveDate, NaiveDate)> = None;
    let mut undated = 0usize;

    for ticket in records {
        let Some(day) = ticket.date_value().map(|dt| dt.date()) else {
            undated += 1;
            continue;
        };
        let (period, label) = period_of(day, granularity);
        counts.entry(period).or_insert((label, 0)).1 += 1;
        span = Some(match span {
            Some((lo, hi)) => (lo.min(day), hi.max(day)),
            None => (day, day),
        });
    }

    if undated > 0 {
        log::debug!("{} tickets without a readable date left out of the series", undated);
    }
    let Some((from, to)) = span else {
        return Vec::new();
    };

    let periods = period_count(from, to, granularity);
    if periods > MAX_FILLED_PERIODS {
        log::warn!(
            "Series from {} to {} spans {} periods, listing only the {} with tickets",
            from,
            to,
            periods,
            counts.len()
        );
        return counts
            .into_iter()
            .map(|(period, (label, tickets))| TimePoint {
                period,
                label,
                tickets,
            })
            .collect();
    }

    period_keys(from, to, granularity)
        .into_iter()
        .map(|(period, label)| {
            let tickets = counts.get(&period).map(|(_, n)| *n).unwrap_or(0);
            TimePoint {
                period,
                label,
                tickets,
            }
        })
        .collect()
}

fn monday_of(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// (key, label) of the period holding `day`.
fn period_of(day: NaiveDate, granularity: Granularity) -> (String, String) {
    match granularity {
        Granularity::Day => (
            day.format("%Y-%m-%d").to_string(),
            day.format(US_DATE_FMT).to_string(),
        ),
        Granularity::Week => {
            let iw = day.iso_week();
            (
                format!("{:04}-W{:02}", iw.year(), iw.week()),
                format!("Week of {}", monday_of(day).format(US_DATE_FMT)),
            )
        }
        Granularity::Month => (
            format!("{:04}-{:02}", day.year(), day.month()),
            day.with_day(1)
                .map(|d| d.format("%B %Y").to_string())
                .unwrap_or_default(),
        ),
    }
}

/// Number of periods between `from` and `to`, inclusive.
fn period_count(from: NaiveDate, to: NaiveDate, granularity: Granularity) -> i64 {
    match granularity {
        Granularity::Day => (to - from).num_days() + 1,
        Granularity::Week => (monday_of(to) - monday_of(from)).num_days() / 7 + 1,
        Granularity::Month => {
            (to.year() - from.year()) as i64 * 12 + to.month() as i64 - from.month() as i64 + 1
        }
    }
}

/// (key, label) for every period between `from` and `to`, inclusive.
fn period_keys(from: NaiveDate, to: NaiveDate, granularity: Granularity) -> Vec<(String, String)> {
    let mut result = Vec::new();
    match granularity {
        Granularity::Day => {
            let mut current = from;
            while current <= to {
                result.push(period_of(current, granularity));
                current += Duration::days(1);
            }
        }
        Granularity::Week => {
            let mut monday = monday_of(from);
            while monday <= to {
                result.push(period_of(monday, granularity));
                monday += Duration::days(7);
            }
        }
        Granularity::Month => {
            let mut current = from.with_day(1);
            while let Some(first) = current.filter(|d| *d <= to) {
                result.push(period_of(first, granularity));
                current = first.checked_add_months(Months::new(1));
            }
        }
    }
    result
}
