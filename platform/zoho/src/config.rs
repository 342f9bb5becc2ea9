use std::{fmt, time::Duration};

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.zoho.com";
pub const DEFAULT_API_BASE_URL: &str = "https://www.zohoapis.com/crm/v2";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:7860";
pub const DEFAULT_SCOPE: &str = "ZohoCRM.modules.leads.READ";

/// Largest page the Leads endpoint serves.
pub const PAGE_SIZE: u32 = 200;

/// Field projection requested from the Leads endpoint.
pub const LEAD_FIELDS: &[&str] = &[
    "id",
    "First_Name",
    "Last_Name",
    "Email",
    "Phone",
    "Company",
    "Owner",
    "Lead_Status",
    "Lead_Source",
    "Created_Time",
    "Rating",
    "Description",
];

/// Credentials and endpoints for one Zoho CRM organisation.
#[derive(Clone)]
pub struct ZohoConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: Option<String>,
    pub redirect_uri: String,
    pub accounts_url: String,
    pub api_base_url: String,
    pub page_size: u32,
    pub request_timeout: Duration,
}

impl ZohoConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: None,
            redirect_uri: DEFAULT_REDIRECT_URI.into(),
            accounts_url: DEFAULT_ACCOUNTS_URL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            page_size: PAGE_SIZE,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    pub fn with_accounts_url(mut self, url: impl Into<String>) -> Self {
        self.accounts_url = url.into();
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub(crate) fn token_url(&self) -> String {
        format!("{}/oauth/v2/token", self.accounts_url.trim_end_matches('/'))
    }

    pub(crate) fn auth_url(&self) -> String {
        format!("{}/oauth/v2/auth", self.accounts_url.trim_end_matches('/'))
    }

    pub(crate) fn leads_url(&self) -> String {
        format!("{}/Leads", self.api_base_url.trim_end_matches('/'))
    }
}

impl fmt::Debug for ZohoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZohoConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("accounts_url", &self.accounts_url)
            .field("api_base_url", &self.api_base_url)
            .field("page_size", &self.page_size)
            .finish()
    }
}
