//! Zoho CRM access for the lead dashboard.
//!
//! [`ZohoClient`] speaks the vendor API: the OAuth 2.0 refresh-token grant and
//! the paginated `Leads` list endpoint. [`TokenCache`] and [`LeadCache`] keep
//! the access token and the fetched lead snapshot in memory for a fixed
//! time-to-live so that dashboard queries never hit the CRM directly.

mod auth;
mod cache;
mod client;
mod config;
mod error;
mod records;

pub use auth::{AccessToken, CodeGrant, TokenCache};
pub use cache::{CacheSettings, LeadCache};
pub use client::ZohoClient;
pub use config::{
    DEFAULT_ACCOUNTS_URL, DEFAULT_API_BASE_URL, DEFAULT_REDIRECT_URI, DEFAULT_SCOPE, LEAD_FIELDS,
    PAGE_SIZE, ZohoConfig,
};
pub use error::{ZohoError, ZohoResult};
pub use records::{LeadsPage, OwnerField, PageInfo, ZohoLead};
