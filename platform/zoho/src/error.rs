use std::sync::Arc;

use thiserror::Error;

pub type ZohoResult<T> = Result<T, ZohoError>;

/// Failures talking to Zoho. Cloneable so a cached load can hand the same
/// error to every waiting caller.
#[derive(Debug, Error, Clone)]
pub enum ZohoError {
    #[error("refresh token not configured")]
    MissingRefreshToken,
    #[error("Zoho rejected the token request: {0}")]
    Token(String),
    #[error("Zoho API error: {status} - {body}")]
    Status { status: u16, body: String },
    #[error("invalid Zoho URL: {0}")]
    InvalidUrl(String),
    #[error("request to Zoho failed: {0}")]
    Http(Arc<reqwest::Error>),
}

impl ZohoError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ZohoError::Status { status: 401, .. })
    }
}

impl From<reqwest::Error> for ZohoError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(Arc::new(value))
    }
}

impl From<url::ParseError> for ZohoError {
    fn from(value: url::ParseError) -> Self {
        Self::InvalidUrl(value.to_string())
    }
}
