use std::sync::Arc;

use anyhow::anyhow;
use async_graphql::{Context, Enum, ErrorExtensions, InputObject, Object, SimpleObject};
use chrono::{DateTime, NaiveDate, Utc};
use platform_api::{ApiError, ApiResult, internal_error};
use platform_zoho::LeadCache;
use products_leads::{
    Bucket, DateRange, Lead, LeadField, LeadFilter, LeadSnapshot, MessageStyle, Metrics,
    NewLeadWindow, RangeError, RangePreset, distinct_values, follow_ups, metrics, outreach_batch,
    outreach_message, owner_breakdown, owner_leads, source_stats, status_stats, value_counts,
};
use tracing::{debug, instrument};

use super::Clock;

#[derive(Enum, Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DatePreset {
    #[default]
    #[graphql(name = "TODAY")]
    Today,
    #[graphql(name = "THIS_WEEK")]
    ThisWeek,
    #[graphql(name = "ALL_TIME")]
    AllTime,
    #[graphql(name = "LAST_30_DAYS")]
    Last30Days,
    #[graphql(name = "LAST_90_DAYS")]
    Last90Days,
    #[graphql(name = "CUSTOM")]
    Custom,
}

impl From<DatePreset> for RangePreset {
    fn from(value: DatePreset) -> Self {
        match value {
            DatePreset::Today => RangePreset::Today,
            DatePreset::ThisWeek => RangePreset::ThisWeek,
            DatePreset::AllTime => RangePreset::AllTime,
            DatePreset::Last30Days => RangePreset::Last30Days,
            DatePreset::Last90Days => RangePreset::Last90Days,
            DatePreset::Custom => RangePreset::Custom,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum LeadWindow {
    #[default]
    #[graphql(name = "TODAY")]
    Today,
    #[graphql(name = "LAST_24_HOURS")]
    Last24Hours,
    #[graphql(name = "YESTERDAY_AFTER_6PM")]
    YesterdayAfter6pm,
    #[graphql(name = "CUSTOM")]
    Custom,
}

/// CUSTOM defaults to yesterday through today.
fn new_lead_window(
    window: LeadWindow,
    today: NaiveDate,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<NewLeadWindow, RangeError> {
    Ok(match window {
        LeadWindow::Today => NewLeadWindow::Today,
        LeadWindow::Last24Hours => NewLeadWindow::Last24Hours,
        LeadWindow::YesterdayAfter6pm => NewLeadWindow::YesterdayAfter6pm,
        LeadWindow::Custom => NewLeadWindow::Custom(DateRange::new(
            from.unwrap_or_else(|| today.pred_opt().unwrap_or(today)),
            to.unwrap_or(today),
        )?),
    })
}

#[derive(Enum, Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum OutreachStyle {
    #[default]
    Short,
    Detailed,
}

impl From<OutreachStyle> for MessageStyle {
    fn from(value: OutreachStyle) -> Self {
        match value {
            OutreachStyle::Short => MessageStyle::Short,
            OutreachStyle::Detailed => MessageStyle::Detailed,
        }
    }
}

/// `from`/`to` are only read for the CUSTOM preset.
#[derive(InputObject, Clone, Debug, Default)]
pub struct DateRangeInput {
    #[graphql(default)]
    pub preset: DatePreset,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct BucketNode {
    pub key: String,
    pub count: i32,
}

impl From<Bucket> for BucketNode {
    fn from(bucket: Bucket) -> Self {
        Self {
            key: bucket.key,
            count: count(bucket.count),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct MetricsNode {
    pub total_leads: i32,
    pub owners: i32,
    pub sources: i32,
    pub statuses: i32,
}

impl From<Metrics> for MetricsNode {
    fn from(m: Metrics) -> Self {
        Self {
            total_leads: count(m.total_leads),
            owners: count(m.owners),
            sources: count(m.sources),
            statuses: count(m.statuses),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct Overview {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Every lead held in the cache, regardless of range.
    pub total_in_crm: i32,
    pub metrics: MetricsNode,
    pub by_owner: Vec<BucketNode>,
    pub by_status: Vec<BucketNode>,
    pub by_source: Vec<BucketNode>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct FollowUpNode {
    pub id: String,
    pub full_name: String,
    pub owner: String,
    pub company: String,
    pub phone: String,
    pub email: String,
    pub source: String,
    pub created_time: String,
    pub message: String,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct OwnerBreakdownNode {
    pub owner: String,
    pub total: i32,
    pub statuses: Vec<BucketNode>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct StatusStatsNode {
    pub status: String,
    pub total: i32,
    pub top_owner: String,
    pub top_source: String,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct SourceStatsNode {
    pub source: String,
    pub total: i32,
    pub top_owner: String,
    pub top_status: String,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct LeadRow {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub company: String,
    pub owner: String,
    pub status: String,
    pub source: String,
    pub created_time: String,
}

impl From<&Lead> for LeadRow {
    fn from(lead: &Lead) -> Self {
        Self {
            id: lead.id.clone(),
            full_name: lead.full_name.clone(),
            email: lead.email.clone(),
            company: lead.company.clone(),
            owner: lead.owner.clone(),
            status: lead.status.clone(),
            source: lead.source.clone(),
            created_time: lead.created_display().to_string(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct LeadTable {
    pub rows: Vec<LeadRow>,
    /// Rows left after the multi-select filters.
    pub shown: i32,
    /// Rows in the date range before filtering.
    pub total: i32,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct OwnerLeadNode {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub status: String,
    pub source: String,
    pub created_time: String,
    pub description: Option<String>,
    pub is_new: bool,
}

impl OwnerLeadNode {
    fn new(lead: &Lead, is_new: bool) -> Self {
        Self {
            id: lead.id.clone(),
            full_name: lead.full_name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            company: lead.company.clone(),
            status: lead.status.clone(),
            source: lead.source.clone(),
            created_time: lead.created_display().to_string(),
            description: lead.description.clone(),
            is_new,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct OwnerDashboard {
    pub owner: String,
    pub total: i32,
    /// Leads inside the window, newest first.
    pub new: Vec<OwnerLeadNode>,
    pub old: Vec<OwnerLeadNode>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct OutreachNode {
    pub id: String,
    pub full_name: String,
    pub message: String,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct OutreachBatch {
    pub messages: Vec<OutreachNode>,
    /// All messages in one block, separated by `---` lines.
    pub combined: String,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct FilterOptions {
    pub owners: Vec<String>,
    pub statuses: Vec<String>,
    pub sources: Vec<String>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct RefreshPayload {
    pub total: i32,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct LeadsQuery;

#[derive(Default)]
pub struct LeadsMutation;

#[Object]
impl LeadsQuery {
    /// Headline metrics and distributions for the selected range.
    #[instrument(name = "graphql.leads.overview", skip_all)]
    async fn overview(
        &self,
        ctx: &Context<'_>,
        range: Option<DateRangeInput>,
    ) -> async_graphql::Result<Overview> {
        let scope = load_scope(ctx, range).await?;
        let leads = scope.leads().map_err(|e| e.extend())?;
        Ok(Overview {
            from: scope.range.from,
            to: scope.range.to,
            total_in_crm: count(scope.snapshot.len()),
            metrics: metrics(&leads).into(),
            by_owner: buckets(&leads, LeadField::Owner),
            by_status: buckets(&leads, LeadField::Status),
            by_source: buckets(&leads, LeadField::Source),
            fetched_at: scope.snapshot.fetched_at,
        })
    }

    /// Leads created today, ready to share with the assigned owner.
    #[instrument(name = "graphql.leads.follow_up", skip_all)]
    async fn follow_up(
        &self,
        ctx: &Context<'_>,
        range: Option<DateRangeInput>,
        #[graphql(desc = "Case-insensitive part of the owner's name")] owner: Option<String>,
    ) -> async_graphql::Result<Vec<FollowUpNode>> {
        let scope = load_scope(ctx, range).await?;
        let leads = scope.leads().map_err(|e| e.extend())?;
        let today = clock(ctx)?.today();
        let nodes = follow_ups(&leads, today, owner.as_deref())
            .into_iter()
            .map(|item| FollowUpNode {
                id: item.lead.id.clone(),
                full_name: item.lead.full_name.clone(),
                owner: item.lead.owner.clone(),
                company: item.lead.company.clone(),
                phone: item.lead.phone.clone(),
                email: item.lead.email.clone(),
                source: item.lead.source.clone(),
                created_time: item.lead.created_display().to_string(),
                message: item.message,
            })
            .collect::<Vec<_>>();
        debug!(today = %today, matches = nodes.len(), "follow-up leads selected");
        Ok(nodes)
    }

    #[instrument(name = "graphql.leads.owner_breakdown", skip_all)]
    async fn owner_breakdown(
        &self,
        ctx: &Context<'_>,
        range: Option<DateRangeInput>,
        #[graphql(default)] sources: Vec<String>,
    ) -> async_graphql::Result<Vec<OwnerBreakdownNode>> {
        let scope = load_scope(ctx, range).await?;
        let leads = scope.leads().map_err(|e| e.extend())?;
        let filtered = LeadFilter::default().sources(sources).apply(&leads);
        Ok(owner_breakdown(&filtered)
            .into_iter()
            .map(|row| OwnerBreakdownNode {
                owner: row.owner,
                total: count(row.total),
                statuses: row.statuses.into_iter().map(BucketNode::from).collect(),
            })
            .collect())
    }

    #[instrument(name = "graphql.leads.status_stats", skip_all)]
    async fn status_stats(
        &self,
        ctx: &Context<'_>,
        range: Option<DateRangeInput>,
        #[graphql(default)] owners: Vec<String>,
        #[graphql(default)] sources: Vec<String>,
    ) -> async_graphql::Result<Vec<StatusStatsNode>> {
        let scope = load_scope(ctx, range).await?;
        let leads = scope.leads().map_err(|e| e.extend())?;
        let filtered = LeadFilter::default()
            .owners(owners)
            .sources(sources)
            .apply(&leads);
        Ok(status_stats(&filtered)
            .into_iter()
            .map(|row| StatusStatsNode {
                status: row.status,
                total: count(row.total),
                top_owner: row.top_owner,
                top_source: row.top_source,
            })
            .collect())
    }

    #[instrument(name = "graphql.leads.source_stats", skip_all)]
    async fn source_stats(
        &self,
        ctx: &Context<'_>,
        range: Option<DateRangeInput>,
        #[graphql(default)] owners: Vec<String>,
        #[graphql(default)] statuses: Vec<String>,
    ) -> async_graphql::Result<Vec<SourceStatsNode>> {
        let scope = load_scope(ctx, range).await?;
        let leads = scope.leads().map_err(|e| e.extend())?;
        let filtered = LeadFilter::default()
            .owners(owners)
            .statuses(statuses)
            .apply(&leads);
        Ok(source_stats(&filtered)
            .into_iter()
            .map(|row| SourceStatsNode {
                source: row.source,
                total: count(row.total),
                top_owner: row.top_owner,
                top_status: row.top_status,
            })
            .collect())
    }

    /// The full lead table for the range, narrowed by the multi-selects.
    #[instrument(name = "graphql.leads.table", skip_all)]
    async fn table(
        &self,
        ctx: &Context<'_>,
        range: Option<DateRangeInput>,
        #[graphql(default)] owners: Vec<String>,
        #[graphql(default)] statuses: Vec<String>,
        #[graphql(default)] sources: Vec<String>,
    ) -> async_graphql::Result<LeadTable> {
        let scope = load_scope(ctx, range).await?;
        let leads = scope.leads().map_err(|e| e.extend())?;
        let filter = LeadFilter {
            owners,
            statuses,
            sources,
        };
        let rows: Vec<LeadRow> = filter
            .apply(&leads)
            .into_iter()
            .map(LeadRow::from)
            .collect();
        Ok(LeadTable {
            shown: count(rows.len()),
            total: count(leads.len()),
            rows,
        })
    }

    /// Choices for the owner / status / source multi-selects.
    #[instrument(name = "graphql.leads.filter_options", skip_all)]
    async fn filter_options(
        &self,
        ctx: &Context<'_>,
        range: Option<DateRangeInput>,
    ) -> async_graphql::Result<FilterOptions> {
        let scope = load_scope(ctx, range).await?;
        let leads = scope.leads().map_err(|e| e.extend())?;
        Ok(FilterOptions {
            owners: distinct_values(&leads, LeadField::Owner),
            statuses: distinct_values(&leads, LeadField::Status),
            sources: distinct_values(&leads, LeadField::Source),
        })
    }

    /// One owner's leads in the range, split into new and old by `window`.
    #[instrument(name = "graphql.leads.owner_dashboard", skip_all)]
    async fn owner_dashboard(
        &self,
        ctx: &Context<'_>,
        range: Option<DateRangeInput>,
        owner: String,
        #[graphql(default)] window: LeadWindow,
        #[graphql(desc = "Start of a CUSTOM window")] from: Option<NaiveDate>,
        #[graphql(desc = "End of a CUSTOM window")] to: Option<NaiveDate>,
    ) -> async_graphql::Result<OwnerDashboard> {
        let scope = load_scope(ctx, range).await?;
        let leads = scope.leads().map_err(|e| e.extend())?;
        let clock = clock(ctx)?;
        let window = new_lead_window(window, clock.today(), from, to)
            .map_err(|err| ApiError::invalid(err.to_string()).extend())?;
        let split = owner_leads(&leads, &owner, window, clock.now());
        debug!(owner = %owner, new = split.new.len(), old = split.old.len(), "owner dashboard");
        Ok(OwnerDashboard {
            total: count(split.total()),
            new: split.new.iter().map(|lead| OwnerLeadNode::new(lead, true)).collect(),
            old: split.old.iter().map(|lead| OwnerLeadNode::new(lead, false)).collect(),
            owner,
        })
    }

    /// Outreach messages for the given lead ids, in the order requested.
    #[instrument(name = "graphql.leads.messages", skip_all)]
    async fn messages(
        &self,
        ctx: &Context<'_>,
        ids: Vec<String>,
        #[graphql(default)] style: OutreachStyle,
        #[graphql(desc = "Sender name; defaults to each lead's owner")] owner: Option<String>,
    ) -> async_graphql::Result<OutreachBatch> {
        let snapshot = lead_cache(ctx)?
            .snapshot()
            .await
            .map_err(|err| ApiError::upstream(err).extend())?;
        let selected = ids
            .iter()
            .map(|id| {
                snapshot
                    .leads
                    .iter()
                    .find(|lead| &lead.id == id)
                    .ok_or_else(|| ApiError::invalid(format!("unknown lead id {id}")).extend())
            })
            .collect::<async_graphql::Result<Vec<&Lead>>>()?;
        let style = MessageStyle::from(style);
        let owner = owner.as_deref();
        let messages = selected
            .iter()
            .map(|lead| OutreachNode {
                id: lead.id.clone(),
                full_name: lead.full_name.clone(),
                message: outreach_message(lead, style, owner.unwrap_or(&lead.owner)),
            })
            .collect();
        Ok(OutreachBatch {
            messages,
            combined: outreach_batch(&selected, style, owner),
        })
    }
}

#[Object]
impl LeadsMutation {
    /// Discard the cached dataset and fetch every lead again.
    #[instrument(name = "graphql.leads.refresh", skip_all)]
    async fn refresh(&self, ctx: &Context<'_>) -> async_graphql::Result<RefreshPayload> {
        let snapshot = lead_cache(ctx)?
            .refresh()
            .await
            .map_err(|err| ApiError::upstream(err).extend())?;
        Ok(RefreshPayload {
            total: count(snapshot.len()),
            fetched_at: snapshot.fetched_at,
        })
    }
}

/// Cached dataset plus the resolved date range for one request.
struct Scope {
    snapshot: Arc<LeadSnapshot>,
    range: DateRange,
}

impl Scope {
    fn leads(&self) -> ApiResult<Vec<&Lead>> {
        let leads = self.snapshot.in_range(&self.range);
        if leads.is_empty() {
            return Err(ApiError::no_data(
                "no leads found for the selected date range",
            ));
        }
        Ok(leads)
    }
}

async fn load_scope(
    ctx: &Context<'_>,
    input: Option<DateRangeInput>,
) -> async_graphql::Result<Scope> {
    let input = input.unwrap_or_default();
    let today = clock(ctx)?.today();
    let range = DateRange::resolve(input.preset.into(), today, input.from, input.to)
        .map_err(|err| ApiError::invalid(err.to_string()).extend())?;
    let snapshot = lead_cache(ctx)?
        .snapshot()
        .await
        .map_err(|err| ApiError::upstream(err).extend())?;
    if snapshot.is_empty() {
        return Err(ApiError::no_data("no leads found").extend());
    }
    Ok(Scope { snapshot, range })
}

fn lead_cache<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a LeadCache> {
    ctx.data::<LeadCache>().map_err(|err| internal_error(anyhow!(err.message)))
}

fn clock(ctx: &Context<'_>) -> async_graphql::Result<Clock> {
    ctx.data::<Clock>()
        .copied()
        .map_err(|err| internal_error(anyhow!(err.message)))
}

fn buckets(leads: &[&Lead], field: LeadField) -> Vec<BucketNode> {
    value_counts(leads, field)
        .into_iter()
        .map(BucketNode::from)
        .collect()
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
