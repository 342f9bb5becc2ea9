mod leads;

use async_graphql::{EmptySubscription, Object, Schema};
use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use platform_zoho::LeadCache;

pub use leads::{LeadsMutation, LeadsQuery};

pub type SchemaType = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Source of "now" for date presets, follow-ups and new-lead windows.
#[derive(Clone, Copy, Debug, Default)]
pub struct Clock {
    fixed: Option<DateTime<FixedOffset>>,
}

impl Clock {
    pub fn fixed(now: DateTime<FixedOffset>) -> Self {
        Self { fixed: Some(now) }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.fixed.unwrap_or_else(|| Local::now().fixed_offset())
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Clone)]
pub struct GraphqlData {
    pub leads: LeadCache,
    pub clock: Clock,
}

pub fn build_schema(data: GraphqlData) -> SchemaType {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(data.leads)
        .data(data.clock)
        .finish()
}

/// SDL of the public schema; needs no runtime data.
pub fn sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .finish()
        .sdl()
}

#[derive(Default)]
pub struct QueryRoot;

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl QueryRoot {
    async fn leads(&self) -> LeadsQuery {
        LeadsQuery
    }

    async fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[Object]
impl MutationRoot {
    async fn leads(&self) -> LeadsMutation {
        LeadsMutation
    }
}
