use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{Lead, NOT_AVAILABLE};

/// Categorical lead attributes the dashboard groups by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeadField {
    Owner,
    Status,
    Source,
}

impl LeadField {
    pub fn value(self, lead: &Lead) -> &str {
        match self {
            LeadField::Owner => &lead.owner,
            LeadField::Status => &lead.status,
            LeadField::Source => &lead.source,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub key: String,
    pub count: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub total_leads: usize,
    pub owners: usize,
    pub sources: usize,
    pub statuses: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OwnerBreakdown {
    pub owner: String,
    pub total: usize,
    pub statuses: Vec<Bucket>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusStats {
    pub status: String,
    pub total: usize,
    pub top_owner: String,
    pub top_source: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub source: String,
    pub total: usize,
    pub top_owner: String,
    pub top_status: String,
}

pub fn metrics(leads: &[&Lead]) -> Metrics {
    Metrics {
        total_leads: leads.len(),
        owners: distinct_values(leads, LeadField::Owner).len(),
        sources: distinct_values(leads, LeadField::Source).len(),
        statuses: distinct_values(leads, LeadField::Status).len(),
    }
}

/// Sorted distinct values of `field`, used to populate filter choices.
pub fn distinct_values(leads: &[&Lead], field: LeadField) -> Vec<String> {
    leads
        .iter()
        .map(|lead| field.value(lead))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Occurrences per value, largest first. Equal counts keep key order.
pub fn value_counts(leads: &[&Lead], field: LeadField) -> Vec<Bucket> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for lead in leads {
        *counts.entry(field.value(lead)).or_default() += 1;
    }
    let mut buckets: Vec<Bucket> = counts
        .into_iter()
        .map(|(key, count)| Bucket {
            key: key.to_string(),
            count,
        })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets
}

pub fn most_common(leads: &[&Lead], field: LeadField) -> String {
    value_counts(leads, field)
        .into_iter()
        .next()
        .map(|bucket| bucket.key)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn group_by<'a>(leads: &[&'a Lead], field: LeadField) -> Vec<(String, Vec<&'a Lead>)> {
    let mut groups: BTreeMap<&str, Vec<&'a Lead>> = BTreeMap::new();
    for &lead in leads {
        groups.entry(field.value(lead)).or_default().push(lead);
    }
    let mut groups: Vec<(String, Vec<&Lead>)> = groups
        .into_iter()
        .map(|(key, members)| (key.to_string(), members))
        .collect();
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    groups
}

pub fn owner_breakdown(leads: &[&Lead]) -> Vec<OwnerBreakdown> {
    group_by(leads, LeadField::Owner)
        .into_iter()
        .map(|(owner, members)| OwnerBreakdown {
            owner,
            total: members.len(),
            statuses: value_counts(&members, LeadField::Status),
        })
        .collect()
}

pub fn status_stats(leads: &[&Lead]) -> Vec<StatusStats> {
    group_by(leads, LeadField::Status)
        .into_iter()
        .map(|(status, members)| StatusStats {
            status,
            total: members.len(),
            top_owner: most_common(&members, LeadField::Owner),
            top_source: most_common(&members, LeadField::Source),
        })
        .collect()
}

pub fn source_stats(leads: &[&Lead]) -> Vec<SourceStats> {
    group_by(leads, LeadField::Source)
        .into_iter()
        .map(|(source, members)| SourceStats {
            source,
            total: members.len(),
            top_owner: most_common(&members, LeadField::Owner),
            top_status: most_common(&members, LeadField::Status),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::lead;

    fn sample() -> Vec<Lead> {
        vec![
            lead("1", "Kim", "New", "Web", "2024-05-01"),
            lead("2", "Kim", "Contacted", "Web", "2024-05-01"),
            lead("3", "Kim", "New", "Ads", "2024-05-02"),
            lead("4", "Lee", "New", "Ads", "2024-05-02"),
            lead("5", "Lee", "Lost", "Referral", "2024-05-03"),
            lead("6", "Ray", "Contacted", "Web", "2024-05-03"),
        ]
    }

    fn bucket(key: &str, count: usize) -> Bucket {
        Bucket {
            key: key.into(),
            count,
        }
    }

    #[test]
    fn metrics_count_distinct_values() {
        let leads = sample();
        let refs: Vec<&Lead> = leads.iter().collect();
        assert_eq!(
            metrics(&refs),
            Metrics {
                total_leads: 6,
                owners: 3,
                sources: 3,
                statuses: 3,
            }
        );
        assert_eq!(metrics(&[]), Metrics::default());
    }

    #[test]
    fn value_counts_sort_by_count_then_key() {
        let leads = sample();
        let refs: Vec<&Lead> = leads.iter().collect();
        assert_eq!(
            value_counts(&refs, LeadField::Source),
            vec![bucket("Web", 3), bucket("Ads", 2), bucket("Referral", 1)]
        );
        assert_eq!(
            value_counts(&refs, LeadField::Owner),
            vec![bucket("Kim", 3), bucket("Lee", 2), bucket("Ray", 1)]
        );
    }

    #[test]
    fn most_common_breaks_ties_alphabetically() {
        let leads = sample();
        let lee: Vec<&Lead> = leads.iter().filter(|l| l.owner == "Lee").collect();
        assert_eq!(most_common(&lee, LeadField::Status), "Lost");
        assert_eq!(most_common(&[], LeadField::Status), NOT_AVAILABLE);
    }

    #[test]
    fn owner_breakdown_orders_owners_and_statuses() {
        let leads = sample();
        let refs: Vec<&Lead> = leads.iter().collect();
        let breakdown = owner_breakdown(&refs);
        let owners: Vec<_> = breakdown.iter().map(|b| (b.owner.as_str(), b.total)).collect();
        assert_eq!(owners, vec![("Kim", 3), ("Lee", 2), ("Ray", 1)]);
        assert_eq!(
            breakdown[0].statuses,
            vec![bucket("New", 2), bucket("Contacted", 1)]
        );
    }

    #[test]
    fn status_and_source_stats_report_top_values() {
        let leads = sample();
        let refs: Vec<&Lead> = leads.iter().collect();

        let statuses = status_stats(&refs);
        assert_eq!(statuses[0].status, "New");
        assert_eq!(statuses[0].total, 3);
        assert_eq!(statuses[0].top_owner, "Kim");
        assert_eq!(statuses[0].top_source, "Ads");

        let sources = source_stats(&refs);
        assert_eq!(sources[0].source, "Web");
        assert_eq!(sources[0].top_owner, "Kim");
        assert_eq!(sources[0].top_status, "Contacted");
        assert_eq!(sources.last().map(|s| s.source.as_str()), Some("Referral"));
    }

    #[test]
    fn reports_are_deterministic() {
        let leads = sample();
        let forward: Vec<&Lead> = leads.iter().collect();
        let reversed: Vec<&Lead> = leads.iter().rev().collect();
        assert_eq!(status_stats(&forward), status_stats(&reversed));
        assert_eq!(owner_breakdown(&forward), owner_breakdown(&reversed));
    }
}
