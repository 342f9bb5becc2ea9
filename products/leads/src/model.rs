use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::Serialize;

use crate::range::DateRange;

pub const UNASSIGNED: &str = "Unassigned";
pub const NO_STATUS: &str = "No Status";
pub const NO_SOURCE: &str = "No Source";
pub const NOT_AVAILABLE: &str = "N/A";

/// Raw field values for a lead, before dashboard defaults are applied.
#[derive(Clone, Debug, Default)]
pub struct LeadFields {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub owner: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub created_time: Option<String>,
    pub rating: Option<String>,
    pub description: Option<String>,
}

/// A normalized CRM lead as shown on the dashboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Lead {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub owner: String,
    pub status: String,
    pub source: String,
    pub created_time: Option<String>,
    pub rating: String,
    pub description: Option<String>,
}

/// Result of interpreting a lead's creation timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreatedOn {
    Missing,
    Unparseable,
    Date(NaiveDate),
}

/// Wall-clock creation time, plus the UTC offset when Zoho sent one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreatedAt {
    pub local: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl CreatedAt {
    /// `now` read off the same wall clock as this timestamp. Timestamps without
    /// an offset are compared against `now`'s own local time.
    pub fn clock_now(&self, now: DateTime<FixedOffset>) -> NaiveDateTime {
        match self.offset {
            Some(offset) => now.with_timezone(&offset).naive_local(),
            None => now.naive_local(),
        }
    }

    /// Key for newest-first ordering across mixed offsets.
    pub fn sort_key(&self) -> NaiveDateTime {
        match self.offset {
            Some(offset) => self.local - TimeDelta::seconds(i64::from(offset.local_minus_utc())),
            None => self.local,
        }
    }
}

impl Lead {
    pub fn from_fields(fields: LeadFields) -> Self {
        let first_name = present(fields.first_name).unwrap_or_default();
        let last_name = present(fields.last_name).unwrap_or_default();
        let full_name = format!("{first_name} {last_name}").trim().to_string();
        Self {
            id: or_na(fields.id),
            full_name,
            first_name,
            last_name,
            email: or_na(fields.email),
            phone: or_na(fields.phone),
            company: or_na(fields.company),
            owner: present(fields.owner).unwrap_or_else(|| UNASSIGNED.into()),
            status: present(fields.status).unwrap_or_else(|| NO_STATUS.into()),
            source: present(fields.source).unwrap_or_else(|| NO_SOURCE.into()),
            created_time: present(fields.created_time),
            rating: or_na(fields.rating),
            description: present(fields.description),
        }
    }

    /// Creation timestamp as displayed in tables.
    pub fn created_display(&self) -> &str {
        self.created_time.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn created_on(&self) -> CreatedOn {
        match self.created_time.as_deref() {
            None => CreatedOn::Missing,
            Some(raw) => parse_created_date(raw).map_or(CreatedOn::Unparseable, CreatedOn::Date),
        }
    }

    /// Parsed creation time; `None` when missing or unparseable.
    pub fn created_at(&self) -> Option<CreatedAt> {
        self.created_time.as_deref().and_then(parse_created_time)
    }
}

/// Calendar date of an ISO 8601 timestamp, taken in the timestamp's own offset.
fn parse_created_date(raw: &str) -> Option<NaiveDate> {
    parse_created_time(raw).map(|created| created.local.date())
}

fn parse_created_time(raw: &str) -> Option<CreatedAt> {
    let raw = raw.trim();
    let with_offset = DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"));
    if let Ok(ts) = with_offset {
        return Some(CreatedAt {
            local: ts.naive_local(),
            offset: Some(*ts.offset()),
        });
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .map(|local| CreatedAt {
            local,
            offset: None,
        })
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn or_na(value: Option<String>) -> String {
    present(value).unwrap_or_else(|| NOT_AVAILABLE.into())
}

/// Every lead fetched from the CRM together with the fetch time.
#[derive(Clone, Debug, Serialize)]
pub struct LeadSnapshot {
    pub leads: Vec<Lead>,
    pub fetched_at: DateTime<Utc>,
}

impl LeadSnapshot {
    pub fn new(leads: Vec<Lead>) -> Self {
        Self {
            leads,
            fetched_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    pub fn in_range(&self, range: &DateRange) -> Vec<&Lead> {
        self.leads.iter().filter(|lead| range.admits(lead)).collect()
    }
}
