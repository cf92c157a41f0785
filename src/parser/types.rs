use std::borrow::Cow;
use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::parser::deserializers::cell_to_datetime;
use crate::parser::fields::{CanonicalField, TicketAttribute};

/// One spreadsheet cell as handed over by the decoding layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl CellValue {
    /// Null, or text that is empty once trimmed.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Spreadsheet-style rendering: integral numbers lose their fraction,
    /// midnight dates lose their time.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed(""),
            CellValue::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            CellValue::Number(n) => Cow::Owned(format_number(*n)),
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
            CellValue::Date(dt) => {
                if dt.num_seconds_from_midnight() == 0 {
                    Cow::Owned(dt.format("%Y-%m-%d").to_string())
                } else {
                    Cow::Owned(dt.format("%Y-%m-%d %H:%M:%S").to_string())
                }
            }
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::Date(dt)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A spreadsheet row keyed by its literal column headers, in header order.
/// Duplicate headers are kept; lookups see the first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        self.fields.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Value under `key` unless absent or blank.
    pub fn non_blank(&self, key: &str) -> Option<&CellValue> {
        self.get(key).filter(|v| !v.is_blank())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries with later duplicate keys skipped.
    pub fn distinct(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(i, (k, _))| !self.fields[..*i].iter().any(|(prev, _)| prev == k))
            .map(|(_, (k, v))| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RawRow {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (k, v) in self.distinct() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RawRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = RawRow;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column header to cell value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawRow, A::Error> {
                let mut row = RawRow::new();
                while let Some((key, value)) = access.next_entry::<String, CellValue>()? {
                    row.fields.push((key, value));
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

// ─── Normalized tickets ──────────────────────────────────────────────────────

/// One normalized ticket. Canonical attributes are always populated; `raw`
/// keeps every original cell for passthrough.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketRecord {
    pub id: String,
    pub ticket_number: String,
    /// Raw cell, interpreted as a date only on demand.
    pub date: CellValue,
    pub technology: String,
    pub client: String,
    pub ticket_type: String,
    pub assigned_to: String,
    pub status: String,
    pub site: String,
    pub configuration_item: String,
    pub created_by: String,
    pub assignment_group: String,
    pub priority: String,
    pub closed_by: String,
    pub raw: RawRow,
}

impl TicketRecord {
    pub fn new(id: impl Into<String>, date: CellValue, raw: RawRow) -> Self {
        TicketRecord {
            id: id.into(),
            ticket_number: String::new(),
            date,
            technology: String::new(),
            client: String::new(),
            ticket_type: String::new(),
            assigned_to: String::new(),
            status: String::new(),
            site: String::new(),
            configuration_item: String::new(),
            created_by: String::new(),
            assignment_group: String::new(),
            priority: String::new(),
            closed_by: String::new(),
            raw,
        }
    }

    pub fn attribute(&self, attr: TicketAttribute) -> Cow<'_, str> {
        let s = match attr {
            TicketAttribute::Date => return self.date.as_text(),
            TicketAttribute::Id => &self.id,
            TicketAttribute::TicketNumber => &self.ticket_number,
            TicketAttribute::Technology => &self.technology,
            TicketAttribute::Client => &self.client,
            TicketAttribute::TicketType => &self.ticket_type,
            TicketAttribute::AssignedTo => &self.assigned_to,
            TicketAttribute::Status => &self.status,
            TicketAttribute::Site => &self.site,
            TicketAttribute::ConfigurationItem => &self.configuration_item,
            TicketAttribute::CreatedBy => &self.created_by,
            TicketAttribute::AssignmentGroup => &self.assignment_group,
            TicketAttribute::Priority => &self.priority,
            TicketAttribute::ClosedBy => &self.closed_by,
        };
        Cow::Borrowed(s.as_str())
    }

    pub(crate) fn set_attribute(&mut self, attr: TicketAttribute, value: String) {
        let slot = match attr {
            TicketAttribute::Date => {
                self.date = CellValue::Text(value);
                return;
            }
            TicketAttribute::Id => &mut self.id,
            TicketAttribute::TicketNumber => &mut self.ticket_number,
            TicketAttribute::Technology => &mut self.technology,
            TicketAttribute::Client => &mut self.client,
            TicketAttribute::TicketType => &mut self.ticket_type,
            TicketAttribute::AssignedTo => &mut self.assigned_to,
            TicketAttribute::Status => &mut self.status,
            TicketAttribute::Site => &mut self.site,
            TicketAttribute::ConfigurationItem => &mut self.configuration_item,
            TicketAttribute::CreatedBy => &mut self.created_by,
            TicketAttribute::AssignmentGroup => &mut self.assignment_group,
            TicketAttribute::Priority => &mut self.priority,
            TicketAttribute::ClosedBy => &mut self.closed_by,
        };
        *slot = value;
    }

    /// Normalized value held for a canonical field.
    pub fn field(&self, field: CanonicalField) -> Cow<'_, str> {
        self.attribute(field.attribute())
    }

    /// Looks `key` up the way chart and drill-down code addresses a record:
    /// canonical attribute names first, then the raw cells. Absent and null
    /// values are `None`.
    pub fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        if let Some(attr) = TicketAttribute::from_key(key) {
            if attr == TicketAttribute::Date && self.date == CellValue::Null {
                return None;
            }
            return Some(self.attribute(attr));
        }
        match self.raw.get(key) {
            None | Some(CellValue::Null) => None,
            Some(v) => Some(v.as_text()),
        }
    }

    pub fn date_value(&self) -> Option<NaiveDateTime> {
        cell_to_datetime(&self.date)
    }
}

impl Serialize for TicketRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for attr in TicketAttribute::ALL {
            if attr == TicketAttribute::Date {
                map.serialize_entry(attr.key(), &self.date)?;
            } else {
                map.serialize_entry(attr.key(), &self.attribute(attr))?;
            }
        }
        for (k, v) in self.raw.distinct() {
            if TicketAttribute::from_key(k).is_none() {
                map.serialize_entry(k, v)?;
            }
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadWarning {
    pub line: usize,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_cell_as_text() {
        assert_eq!(CellValue::Number(42.0).as_text(), "42");
        assert_eq!(CellValue::Number(1.5).as_text(), "1.5");
        assert_eq!(CellValue::Null.as_text(), "");
        assert_eq!(CellValue::Bool(true).as_text(), "true");
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(CellValue::Date(midnight).as_text(), "2024-01-05");
        let afternoon = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(CellValue::Date(afternoon).as_text(), "2024-01-05 14:30:00");
    }

    #[test]
    fn test_cell_is_blank() {
        assert!(CellValue::Null.is_blank());
        assert!(CellValue::from("   ").is_blank());
        assert!(!CellValue::from("x").is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_raw_row_first_duplicate_wins() {
        let row: RawRow = vec![("Status", "Open"), ("Status", "Closed")]
            .into_iter()
            .collect();
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("Status"), Some(&CellValue::from("Open")));
        assert_eq!(row.distinct().count(), 1);
    }

    #[test]
    fn test_raw_row_deserialize_keeps_document_order() {
        let row: RawRow =
            serde_json::from_str(r#"{"Zeta": "z", "Alpha": 1, "Mid": null}"#).unwrap();
        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(row.get("Alpha"), Some(&CellValue::Number(1.0)));
        assert_eq!(row.get("Mid"), Some(&CellValue::Null));
    }

    #[test]
    fn test_lookup_prefers_canonical_attribute() {
        let raw: RawRow = vec![("status", "raw status"), ("Extra", "x")]
            .into_iter()
            .collect();
        let mut t = TicketRecord::new("1", CellValue::from("2024-01-05"), raw);
        t.status = "Open".into();
        assert_eq!(t.lookup("status").as_deref(), Some("Open"));
        assert_eq!(t.lookup("Extra").as_deref(), Some("x"));
        assert_eq!(t.lookup("Missing"), None);
    }

    #[test]
    fn test_serialize_canonical_takes_precedence() {
        let raw: RawRow = vec![("status", "raw"), ("Team", "Blue")]
            .into_iter()
            .collect();
        let mut t = TicketRecord::new("INC1", CellValue::from("2024-01-05"), raw);
        t.status = "Open".into();
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["status"], "Open");
        assert_eq!(json["Team"], "Blue");
        assert_eq!(json["id"], "INC1");
        assert_eq!(json["date"], "2024-01-05");
    }
}
