//! Canonical field vocabulary and the lookup tables that drive header
//! resolution, record normalization and chart accessors.
//!
//! Everything here is data: the resolver, normalizer and aggregator walk these
//! tables in order instead of hard-coding per-field branches.

use serde::{Deserialize, Serialize};

/// Sentinel selection value meaning "no restriction on this field".
pub const ALL: &str = "All";

/// Fixed set of ticket attributes the engine can map a spreadsheet onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    StartDate,
    EndDate,
    AssignedTo,
    Customer,
    AssignmentGroup,
    State,
    Priority,
    CreatedBy,
    ClosedBy,
    Technology,
    ConfigurationItem,
    TicketType,
    TicketNumber,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 13] = [
        CanonicalField::StartDate,
        CanonicalField::EndDate,
        CanonicalField::AssignedTo,
        CanonicalField::Customer,
        CanonicalField::AssignmentGroup,
        CanonicalField::State,
        CanonicalField::Priority,
        CanonicalField::CreatedBy,
        CanonicalField::ClosedBy,
        CanonicalField::Technology,
        CanonicalField::ConfigurationItem,
        CanonicalField::TicketType,
        CanonicalField::TicketNumber,
    ];

    /// Fields that carry a categorical filter (everything but the two dates).
    pub const FILTERABLE: [CanonicalField; 11] = [
        CanonicalField::AssignedTo,
        CanonicalField::Customer,
        CanonicalField::AssignmentGroup,
        CanonicalField::State,
        CanonicalField::Priority,
        CanonicalField::CreatedBy,
        CanonicalField::ClosedBy,
        CanonicalField::Technology,
        CanonicalField::ConfigurationItem,
        CanonicalField::TicketType,
        CanonicalField::TicketNumber,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CanonicalField::StartDate => "startDate",
            CanonicalField::EndDate => "endDate",
            CanonicalField::AssignedTo => "assignedTo",
            CanonicalField::Customer => "customer",
            CanonicalField::AssignmentGroup => "assignmentGroup",
            CanonicalField::State => "state",
            CanonicalField::Priority => "priority",
            CanonicalField::CreatedBy => "createdBy",
            CanonicalField::ClosedBy => "closedBy",
            CanonicalField::Technology => "technology",
            CanonicalField::ConfigurationItem => "configurationItem",
            CanonicalField::TicketType => "ticketType",
            CanonicalField::TicketNumber => "ticketNumber",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Human name used in notifications ("Client", "Ticket Type", ...).
    pub fn display_name(self) -> &'static str {
        match self {
            CanonicalField::StartDate => "Start Date",
            CanonicalField::EndDate => "End Date",
            CanonicalField::AssignedTo => "Assigned To",
            CanonicalField::Customer => "Client",
            CanonicalField::AssignmentGroup => "Assignment Group",
            CanonicalField::State => "Status",
            CanonicalField::Priority => "Priority",
            CanonicalField::CreatedBy => "Created By",
            CanonicalField::ClosedBy => "Closed By",
            CanonicalField::Technology => "Technology",
            CanonicalField::ConfigurationItem => "Configuration Item",
            CanonicalField::TicketType => "Ticket Type",
            CanonicalField::TicketNumber => "Ticket Number",
        }
    }

    pub fn is_date(self) -> bool {
        matches!(self, CanonicalField::StartDate | CanonicalField::EndDate)
    }

    /// The record attribute that holds this field's normalized value.
    pub fn attribute(self) -> TicketAttribute {
        match self {
            CanonicalField::StartDate | CanonicalField::EndDate => TicketAttribute::Date,
            CanonicalField::AssignedTo => TicketAttribute::AssignedTo,
            CanonicalField::Customer => TicketAttribute::Client,
            CanonicalField::AssignmentGroup => TicketAttribute::AssignmentGroup,
            CanonicalField::State => TicketAttribute::Status,
            CanonicalField::Priority => TicketAttribute::Priority,
            CanonicalField::CreatedBy => TicketAttribute::CreatedBy,
            CanonicalField::ClosedBy => TicketAttribute::ClosedBy,
            CanonicalField::Technology => TicketAttribute::Technology,
            CanonicalField::ConfigurationItem => TicketAttribute::ConfigurationItem,
            CanonicalField::TicketType => TicketAttribute::TicketType,
            CanonicalField::TicketNumber => TicketAttribute::TicketNumber,
        }
    }
}

/// Attributes of a normalized ticket record, keyed the way records are
/// addressed by chart categories (`client`, `status`, `date`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketAttribute {
    Id,
    TicketNumber,
    Date,
    Technology,
    Client,
    TicketType,
    AssignedTo,
    Status,
    Site,
    ConfigurationItem,
    CreatedBy,
    AssignmentGroup,
    Priority,
    ClosedBy,
}

impl TicketAttribute {
    pub const ALL: [TicketAttribute; 14] = [
        TicketAttribute::Id,
        TicketAttribute::TicketNumber,
        TicketAttribute::Date,
        TicketAttribute::Technology,
        TicketAttribute::Client,
        TicketAttribute::TicketType,
        TicketAttribute::AssignedTo,
        TicketAttribute::Status,
        TicketAttribute::Site,
        TicketAttribute::ConfigurationItem,
        TicketAttribute::CreatedBy,
        TicketAttribute::AssignmentGroup,
        TicketAttribute::Priority,
        TicketAttribute::ClosedBy,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TicketAttribute::Id => "id",
            TicketAttribute::TicketNumber => "ticketNumber",
            TicketAttribute::Date => "date",
            TicketAttribute::Technology => "technology",
            TicketAttribute::Client => "client",
            TicketAttribute::TicketType => "ticketType",
            TicketAttribute::AssignedTo => "assignedTo",
            TicketAttribute::Status => "status",
            TicketAttribute::Site => "site",
            TicketAttribute::ConfigurationItem => "configurationItem",
            TicketAttribute::CreatedBy => "createdBy",
            TicketAttribute::AssignmentGroup => "assignmentGroup",
            TicketAttribute::Priority => "priority",
            TicketAttribute::ClosedBy => "closedBy",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == key)
    }
}

// ─── Header aliases ──────────────────────────────────────────────────────────

/// Candidate header spellings per field, lower-cased and whitespace-collapsed.
/// Order matters: earlier aliases win.
pub const HEADER_ALIASES: &[(CanonicalField, &[&str])] = &[
    (CanonicalField::StartDate, &["start date", "created", "planned start date"]),
    (CanonicalField::EndDate, &["end date", "closed", "planned end date"]),
    (CanonicalField::AssignedTo, &["assigned to", "assignedto", "assigned_to"]),
    (CanonicalField::Customer, &["customer", "client", "site"]),
    (CanonicalField::AssignmentGroup, &["assignment group", "group"]),
    (CanonicalField::State, &["state", "status"]),
    (CanonicalField::Priority, &["priority"]),
    (CanonicalField::CreatedBy, &["created by", "creator"]),
    (CanonicalField::ClosedBy, &["closed by", "closer"]),
    (CanonicalField::Technology, &["technology", "technology/platform"]),
    (
        CanonicalField::ConfigurationItem,
        &["configuration item", "configuration", "ci", "config item"],
    ),
    (
        CanonicalField::TicketType,
        &[
            "ticket type",
            "request type",
            "type",
            "incident type",
            "issue type",
            "category",
            "request category",
        ],
    ),
    (CanonicalField::TicketNumber, &["ticket number", "number", "id", "ticket id"]),
];

/// Literal headers that override the generic search for `customer`, most
/// preferred first.
pub const CUSTOMER_PREFERRED_HEADERS: &[&str] = &["Client", "Customer", "Site"];

pub fn header_aliases(field: CanonicalField) -> &'static [&'static str] {
    HEADER_ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}

// ─── Normalization rules ─────────────────────────────────────────────────────

/// How one record attribute is sourced from a raw row: the mapped column of
/// `source` first, then each literal header in `fallbacks`, then `default`.
#[derive(Debug, Clone, Copy)]
pub struct AttributeRule {
    pub attribute: TicketAttribute,
    pub source: Option<CanonicalField>,
    pub fallbacks: &'static [&'static str],
    pub default: &'static str,
}

/// `id`: an empty default means "synthesize `ticket-<row index>`".
pub const ID_RULE: AttributeRule = AttributeRule {
    attribute: TicketAttribute::Id,
    source: Some(CanonicalField::TicketNumber),
    fallbacks: &["ID"],
    default: "",
};

/// `date` keeps the raw cell, so only the lookup part of this rule is string-like.
pub const DATE_RULE: AttributeRule = AttributeRule {
    attribute: TicketAttribute::Date,
    source: Some(CanonicalField::StartDate),
    fallbacks: &["Assigned Date"],
    default: "Unknown",
};

pub const TEXT_RULES: &[AttributeRule] = &[
    AttributeRule {
        attribute: TicketAttribute::TicketNumber,
        source: Some(CanonicalField::TicketNumber),
        fallbacks: &["Ticket Number"],
        default: "Unknown",
    },
    AttributeRule {
        attribute: TicketAttribute::Technology,
        source: Some(CanonicalField::Technology),
        fallbacks: &["Technology/Platform", "Technology"],
        default: "Unknown",
    },
    AttributeRule {
        attribute: TicketAttribute::Client,
        source: Some(CanonicalField::Customer),
        fallbacks: &["Client"],
        default: "Unknown",
    },
    AttributeRule {
        attribute: TicketAttribute::TicketType,
        source: Some(CanonicalField::TicketType),
        fallbacks: &["Ticket Type"],
        default: "Unknown",
    },
    AttributeRule {
        attribute: TicketAttribute::AssignedTo,
        source: Some(CanonicalField::AssignedTo),
        fallbacks: &["Assigned to", "AssignedTo"],
        default: "Unassigned",
    },
    AttributeRule {
        attribute: TicketAttribute::Status,
        source: Some(CanonicalField::State),
        fallbacks: &["Status"],
        default: "Unknown",
    },
    AttributeRule {
        attribute: TicketAttribute::Site,
        source: None,
        fallbacks: &["Site"],
        default: "",
    },
    AttributeRule {
        attribute: TicketAttribute::ConfigurationItem,
        source: Some(CanonicalField::ConfigurationItem),
        fallbacks: &["Configuration Item", "configurationItem"],
        default: "Unknown",
    },
    AttributeRule {
        attribute: TicketAttribute::CreatedBy,
        source: Some(CanonicalField::CreatedBy),
        fallbacks: &["Created By"],
        default: "",
    },
    AttributeRule {
        attribute: TicketAttribute::AssignmentGroup,
        source: Some(CanonicalField::AssignmentGroup),
        fallbacks: &["Assignment Group"],
        default: "",
    },
    AttributeRule {
        attribute: TicketAttribute::Priority,
        source: Some(CanonicalField::Priority),
        fallbacks: &["Priority"],
        default: "",
    },
    AttributeRule {
        attribute: TicketAttribute::ClosedBy,
        source: Some(CanonicalField::ClosedBy),
        fallbacks: &["Closed By"],
        default: "",
    },
];

/// The value normalization writes when no source column has one.
pub fn attribute_default(attribute: TicketAttribute) -> &'static str {
    match attribute {
        TicketAttribute::Id => ID_RULE.default,
        TicketAttribute::Date => DATE_RULE.default,
        _ => TEXT_RULES
            .iter()
            .find(|r| r.attribute == attribute)
            .map(|r| r.default)
            .unwrap_or(""),
    }
}

// ─── Chart accessor aliases ──────────────────────────────────────────────────

/// Legacy spellings probed on a record when a chart category has no mapped
/// column. Exact keys, tried in order.
pub const CATEGORY_ALIASES: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::Technology,
        &["Technology/Platform", "Technology", "technology"],
    ),
    (
        CanonicalField::AssignedTo,
        &["Assigned to", "AssignedTo", "Assigned To", "assignedTo"],
    ),
    (
        CanonicalField::TicketType,
        &[
            "Type",
            "type",
            "Ticket Type",
            "ticketType",
            "Incident Type",
            "Issue Type",
            "Category",
            "Request Category",
            "Request Type",
            "incidentType",
            "issueType",
            "category",
            "requestCategory",
            "requestType",
        ],
    ),
    (
        CanonicalField::ClosedBy,
        &["Closed by", "closedBy", "Closed By", "closed by"],
    ),
    (
        CanonicalField::AssignmentGroup,
        &[
            "Assignment Group",
            "Assignment group",
            "assignmentGroup",
            "assignment group",
        ],
    ),
    (CanonicalField::Priority, &["Priority", "priority"]),
    (
        CanonicalField::Customer,
        &["Client", "Customer", "Site", "client", "customer", "site"],
    ),
    (
        CanonicalField::ConfigurationItem,
        &[
            "Configuration Item",
            "Configuration item",
            "configurationItem",
            "configuration item",
            "CI",
        ],
    ),
];

pub fn category_aliases(field: CanonicalField) -> &'static [&'static str] {
    CATEGORY_ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}
