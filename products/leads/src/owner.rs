use std::cmp::Reverse;

use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta};

use crate::{model::Lead, range::DateRange};

/// Separator between messages produced in one batch.
pub const MESSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Which leads count as "new" on an owner's personal dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NewLeadWindow {
    /// Created on the current calendar day.
    #[default]
    Today,
    /// Created at or after `now - 24h`.
    Last24Hours,
    /// Created yesterday between 18:00 and midnight; the after-hours batch.
    YesterdayAfter6pm,
    /// Created on a day inside the range.
    Custom(DateRange),
}

impl NewLeadWindow {
    /// Missing or unparseable creation times are never new.
    pub fn admits(&self, lead: &Lead, now: DateTime<FixedOffset>) -> bool {
        let Some(created) = lead.created_at() else {
            return false;
        };
        let now = created.clock_now(now);
        match self {
            NewLeadWindow::Today => created.local.date() == now.date(),
            NewLeadWindow::Last24Hours => created.local >= now - TimeDelta::hours(24),
            NewLeadWindow::YesterdayAfter6pm => {
                let Some(yesterday) = now.date().pred_opt() else {
                    return false;
                };
                created.local.date() == yesterday && created.local.time() >= six_pm()
            }
            NewLeadWindow::Custom(range) => range.contains(created.local.date()),
        }
    }
}

fn six_pm() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// One owner's leads, split by [`NewLeadWindow`], newest first in each half.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnerLeads<'a> {
    pub new: Vec<&'a Lead>,
    pub old: Vec<&'a Lead>,
}

impl OwnerLeads<'_> {
    pub fn total(&self) -> usize {
        self.new.len() + self.old.len()
    }
}

pub fn owner_leads<'a>(
    leads: &[&'a Lead],
    owner: &str,
    window: NewLeadWindow,
    now: DateTime<FixedOffset>,
) -> OwnerLeads<'a> {
    let (mut new, mut old): (Vec<&Lead>, Vec<&Lead>) = leads
        .iter()
        .copied()
        .filter(|lead| lead.owner == owner)
        .partition(|lead| window.admits(lead, now));
    newest_first(&mut new);
    newest_first(&mut old);
    OwnerLeads { new, old }
}

// Leads without a usable timestamp sink to the bottom.
fn newest_first(leads: &mut [&Lead]) {
    leads.sort_by_key(|lead| Reverse(lead.created_at().map(|created| created.sort_key())));
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MessageStyle {
    #[default]
    Short,
    Detailed,
}

/// Personal outreach text sent by `owner` to the lead.
pub fn outreach_message(lead: &Lead, style: MessageStyle, owner: &str) -> String {
    let name = if lead.full_name.is_empty() {
        "Friend"
    } else {
        lead.full_name.as_str()
    };
    match style {
        MessageStyle::Short => format!(
            "Hi {name}, this is {owner} from {company}. Thanks for your interest via {source}! \
             Can we share details on ICF certification?",
            company = lead.company,
            source = lead.source,
        ),
        MessageStyle::Detailed => format!(
            "Hi {name},\n\nThis is {owner} from {company}. Thank you for reaching out through {source}. \
             I saw your message: '{description}'. I'd love to share more on our ICF certification \
             program and how it helps career progression. Could I schedule a 15-minute call? \
             Reply 'Yes' with a time that suits you.\n\nCall/WhatsApp: {phone}\nEmail: {email}",
            company = lead.company,
            source = lead.source,
            description = lead.description.as_deref().unwrap_or_default(),
            phone = lead.phone,
            email = lead.email,
        ),
    }
}

/// Messages for several leads, joined into one pasteable block. Without an
/// explicit `owner` each message is signed by the lead's own owner.
pub fn outreach_batch(leads: &[&Lead], style: MessageStyle, owner: Option<&str>) -> String {
    leads
        .iter()
        .map(|lead| outreach_message(lead, style, owner.unwrap_or(&lead.owner)))
        .collect::<Vec<_>>()
        .join(MESSAGE_SEPARATOR)
}
