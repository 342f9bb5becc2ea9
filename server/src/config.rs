use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use platform_zoho::{
    CacheSettings, DEFAULT_ACCOUNTS_URL, DEFAULT_API_BASE_URL, DEFAULT_REDIRECT_URI, ZohoConfig,
};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub zoho: ZohoConfig,
    pub cache: CacheSettings,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("missing env {}", key));
        let seconds = |key: &str, default: u64| -> Result<Duration> {
            match get(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("invalid {key}: expected whole seconds")),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let mut zoho = ZohoConfig::new(required("ZOHO_CLIENT_ID")?, required("ZOHO_CLIENT_SECRET")?)
            .with_redirect_uri(get("ZOHO_REDIRECT_URI").unwrap_or_else(|| DEFAULT_REDIRECT_URI.into()))
            .with_accounts_url(get("ZOHO_ACCOUNTS_URL").unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.into()))
            .with_api_base_url(
                get("ZOHO_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into()),
            );
        zoho.refresh_token = get("ZOHO_REFRESH_TOKEN");

        let cache = CacheSettings {
            leads_ttl: seconds("LEADS_CACHE_TTL_SECS", 3600)?,
            token_ttl: seconds("TOKEN_CACHE_TTL_SECS", 1800)?,
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            zoho,
            cache,
            cors_allowed_origins,
        })
    }

    /// Commands that read leads cannot run without a refresh token.
    pub fn require_refresh_token(&self) -> Result<()> {
        if self.zoho.refresh_token.is_none() {
            return Err(anyhow!(
                "missing env ZOHO_REFRESH_TOKEN; run `lead-dashboard auth-url` to obtain one"
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config = load(&[
            ("ZOHO_CLIENT_ID", "id"),
            ("ZOHO_CLIENT_SECRET", "secret"),
            ("ZOHO_REFRESH_TOKEN", "1000.refresh"),
        ])
        .unwrap();
        assert_eq!(config.zoho.redirect_uri, DEFAULT_REDIRECT_URI);
        assert_eq!(config.zoho.accounts_url, DEFAULT_ACCOUNTS_URL);
        assert_eq!(config.zoho.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.cache, CacheSettings::default());
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:5173"]);
        assert!(config.require_refresh_token().is_ok());
    }

    #[test]
    fn missing_credentials_are_reported_by_name() {
        let err = load(&[("ZOHO_CLIENT_ID", "id")]).unwrap_err();
        assert!(err.to_string().contains("ZOHO_CLIENT_SECRET"));

        let config = load(&[
            ("ZOHO_CLIENT_ID", "id"),
            ("ZOHO_CLIENT_SECRET", "secret"),
            ("ZOHO_REFRESH_TOKEN", "  "),
        ])
        .unwrap();
        let err = config.require_refresh_token().unwrap_err();
        assert!(err.to_string().contains("ZOHO_REFRESH_TOKEN"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("ZOHO_CLIENT_ID", "id"),
            ("ZOHO_CLIENT_SECRET", "secret"),
            ("ZOHO_ACCOUNTS_URL", "https://accounts.zoho.eu"),
            ("LEADS_CACHE_TTL_SECS", "600"),
            ("TOKEN_CACHE_TTL_SECS", "300"),
            ("CORS_ALLOWED_ORIGINS", "https://a.test, ,https://b.test"),
        ])
        .unwrap();
        assert_eq!(config.zoho.accounts_url, "https://accounts.zoho.eu");
        assert_eq!(config.cache.leads_ttl, Duration::from_secs(600));
        assert_eq!(config.cache.token_ttl, Duration::from_secs(300));
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.test", "https://b.test"]
        );
    }

    #[test]
    fn malformed_ttl_is_rejected() {
        let err = load(&[
            ("ZOHO_CLIENT_ID", "id"),
            ("ZOHO_CLIENT_SECRET", "secret"),
            ("LEADS_CACHE_TTL_SECS", "an hour"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("LEADS_CACHE_TTL_SECS"));
    }
}
