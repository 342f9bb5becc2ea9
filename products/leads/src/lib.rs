//! Lead analytics for the marketing dashboard.
//!
//! Everything in this crate works on an in-memory [`LeadSnapshot`]: date range
//! scoping, multi-select filters, the aggregates behind each dashboard tab,
//! follow-up messages for leads created today and each owner's split of new
//! and old leads. Nothing here talks to the network; fetching and caching live
//! in `platform-zoho`.

mod filter;
mod followup;
mod model;
mod owner;
mod range;
mod report;

pub use filter::LeadFilter;
pub use followup::{FollowUp, follow_ups, shareable_message};
pub use model::{
    CreatedAt, CreatedOn, Lead, LeadFields, LeadSnapshot, NO_SOURCE, NO_STATUS, NOT_AVAILABLE,
    UNASSIGNED,
};
pub use owner::{
    MESSAGE_SEPARATOR, MessageStyle, NewLeadWindow, OwnerLeads, outreach_batch, outreach_message,
    owner_leads,
};
pub use range::{DateRange, RangeError, RangePreset};
pub use report::{
    Bucket, LeadField, Metrics, OwnerBreakdown, SourceStats, StatusStats, distinct_values,
    metrics, most_common, owner_breakdown, source_stats, status_stats, value_counts,
};
