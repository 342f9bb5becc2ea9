use chrono::NaiveDate;

use crate::model::{CreatedOn, Lead};

/// A lead created today, with a message ready to paste into SMS or WhatsApp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FollowUp<'a> {
    pub lead: &'a Lead,
    pub message: String,
}

/// Leads created on `today`, optionally narrowed to owners whose name contains
/// `owner_query` (case-insensitive).
pub fn follow_ups<'a>(
    leads: &[&'a Lead],
    today: NaiveDate,
    owner_query: Option<&str>,
) -> Vec<FollowUp<'a>> {
    let needle = owner_query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());
    leads
        .iter()
        .copied()
        .filter(|lead| created_today(lead, today))
        .filter(|lead| match &needle {
            Some(needle) => lead.owner.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .map(|lead| FollowUp {
            lead,
            message: shareable_message(lead),
        })
        .collect()
}

fn created_today(lead: &Lead, today: NaiveDate) -> bool {
    match lead.created_on() {
        CreatedOn::Date(date) => date == today,
        CreatedOn::Unparseable => lead.created_display().contains(&today.to_string()),
        CreatedOn::Missing => false,
    }
}

pub fn shareable_message(lead: &Lead) -> String {
    format!(
        "⚡️ *NEW LEAD ASSIGNED!* ⚡️\n\n\
         👤 *Name:* {name}\n\
         🏢 *Company:* {company}\n\
         📞 *Phone:* {phone}\n\
         📧 *Email:* {email}\n\
         🌐 *Source:* {source}\n\n\
         ✅ *Action: Contact Immediately!* (Owner: {owner})",
        name = lead.full_name,
        company = lead.company,
        phone = lead.phone,
        email = lead.email,
        source = lead.source,
        owner = lead.owner,
    )
}
