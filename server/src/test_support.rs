//! Mock Zoho CRM shared by the GraphQL and router tests.

use chrono::{DateTime, FixedOffset};
use platform_zoho::{CacheSettings, LeadCache, ZohoClient, ZohoConfig};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const LEADS_PATH: &str = "/crm/v2/Leads";

/// Thursday 2024-05-16, mid-afternoon UTC.
pub fn now() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-05-16T15:00:00Z").unwrap()
}

fn lead(id: &str, owner: Option<&str>, status: &str, source: &str, created: &str) -> Value {
    json!({
        "id": id,
        "First_Name": "Lead",
        "Last_Name": id,
        "Email": format!("lead{id}@example.com"),
        "Phone": "555-0100",
        "Company": "Acme",
        "Owner": owner.map(|name| json!({ "name": name, "id": "1" })),
        "Lead_Status": status,
        "Lead_Source": source,
        "Created_Time": created
    })
}

/// Six leads around Thursday 2024-05-16: three today, two earlier this week,
/// one in April.
pub fn sample_leads() -> Vec<Value> {
    vec![
        lead("1", Some("Priya Shah"), "New", "Web", "2024-05-16T09:00:00+05:30"),
        lead("2", Some("Priya Shah"), "Contacted", "Web", "2024-05-16T11:00:00+05:30"),
        lead("3", Some("Marco Ruiz"), "New", "Ads", "2024-05-16T12:00:00Z"),
        lead("4", Some("Priya Shah"), "New", "Referral", "2024-05-14T10:00:00Z"),
        lead("5", None, "Lost", "Web", "2024-05-13T08:00:00Z"),
        lead("6", Some("Marco Ruiz"), "Contacted", "Ads", "2024-04-02T10:00:00Z"),
    ]
}

pub struct MockCrm {
    server: MockServer,
}

impl MockCrm {
    /// A CRM that serves `leads` as a single page.
    pub async fn start(leads: Vec<Value>) -> Self {
        let crm = Self::with_token().await;
        let response = if leads.is_empty() {
            ResponseTemplate::new(204)
        } else {
            ResponseTemplate::new(200).set_body_json(json!({
                "data": leads,
                "info": { "per_page": 200, "page": 1, "more_records": false }
            }))
        };
        Mock::given(method("GET"))
            .and(path(LEADS_PATH))
            .respond_with(response)
            .mount(&crm.server)
            .await;
        crm
    }

    /// A CRM whose Leads endpoint always answers with `status`.
    pub async fn failing(status: u16) -> Self {
        let crm = Self::with_token().await;
        Mock::given(method("GET"))
            .and(path(LEADS_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string("backend down"))
            .mount(&crm.server)
            .await;
        crm
    }

    async fn with_token() -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "1000.test" })),
            )
            .mount(&server)
            .await;
        Self { server }
    }

    pub fn lead_cache(&self) -> LeadCache {
        let config = ZohoConfig::new("client", "secret")
            .with_refresh_token("1000.refresh")
            .with_accounts_url(self.server.uri())
            .with_api_base_url(format!("{}/crm/v2", self.server.uri()));
        let client = ZohoClient::new(config).expect("zoho client");
        LeadCache::new(client, CacheSettings::default())
    }

    pub async fn lead_requests(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| req.url.path() == LEADS_PATH)
            .count()
    }
}
