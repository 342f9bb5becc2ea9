use std::sync::Arc;

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::{
    auth::AccessToken,
    config::{LEAD_FIELDS, ZohoConfig},
    error::{ZohoError, ZohoResult},
    records::{LeadsPage, ZohoLead},
};

/// HTTP client for one Zoho CRM organisation.
#[derive(Clone, Debug)]
pub struct ZohoClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: Arc<ZohoConfig>,
}

impl ZohoClient {
    pub fn new(config: ZohoConfig) -> ZohoResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("lead-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// Walk the Leads list page by page until Zoho reports no more records.
    ///
    /// A 204 response means the module has nothing (more) to return. Any other
    /// non-200 status aborts the whole fetch.
    pub async fn fetch_all_leads(&self, token: &AccessToken) -> ZohoResult<Vec<ZohoLead>> {
        let url = self.config.leads_url();
        let fields = LEAD_FIELDS.join(",");
        let per_page = self.config.page_size.to_string();
        let mut leads = Vec::new();
        let mut page: u32 = 1;

        loop {
            let response = self
                .http
                .get(&url)
                .bearer_auth(token.secret())
                .query(&[
                    ("per_page", per_page.as_str()),
                    ("page", page.to_string().as_str()),
                    ("fields", fields.as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::NO_CONTENT {
                debug!(page, "leads endpoint returned no content");
                break;
            }
            if status != StatusCode::OK {
                let body = response.text().await.unwrap_or_default();
                warn!(page, status = status.as_u16(), "leads request failed");
                return Err(ZohoError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let body: LeadsPage = response.json().await?;
            if body.data.is_empty() {
                break;
            }
            leads.extend(body.data);
            info!(page, fetched = leads.len(), "fetched leads page");

            if !body.info.more_records {
                break;
            }
            page += 1;
        }

        Ok(leads)
    }
}
