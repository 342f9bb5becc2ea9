use std::{sync::Arc, time::Duration};

use platform_zoho::{
    AccessToken, CacheSettings, LEAD_FIELDS, LeadCache, ZohoClient, ZohoConfig, ZohoError,
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path, query_param},
};

fn config_for(server: &MockServer) -> ZohoConfig {
    ZohoConfig::new("client-1", "secret-1")
        .with_refresh_token("1000.refresh")
        .with_accounts_url(server.uri())
        .with_api_base_url(format!("{}/crm/v2", server.uri()))
}

fn client_for(server: &MockServer) -> ZohoClient {
    ZohoClient::new(config_for(server)).expect("client")
}

fn lead_json(id: u32, owner: &str) -> Value {
    json!({
        "id": id.to_string(),
        "First_Name": "Lead",
        "Last_Name": id.to_string(),
        "Owner": { "name": owner, "id": "99" },
        "Lead_Status": "New",
        "Lead_Source": "Web",
        "Created_Time": "2024-05-16T09:00:00+00:00"
    })
}

fn page(leads: Vec<Value>, more_records: bool) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": leads,
        "info": { "per_page": 200, "count": 0, "page": 1, "more_records": more_records }
    }))
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "1000.access",
            "api_domain": "https://www.zohoapis.com",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_single_page(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/crm/v2/Leads"))
        .respond_with(page(vec![lead_json(1, "Kim"), lead_json(2, "Lee")], false))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn refresh_token_grant_posts_form_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("client_id=client-1"))
        .and(body_string_contains("client_secret=secret-1"))
        .and(body_string_contains("refresh_token=1000.refresh"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access_token": "1000.access" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let token = client_for(&server).refresh_access_token().await.unwrap();
    assert_eq!(token, AccessToken::new("1000.access"));
}

#[tokio::test]
async fn token_error_payload_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "invalid_code" })))
        .mount(&server)
        .await;

    let err = client_for(&server).refresh_access_token().await.unwrap_err();
    assert!(matches!(err, ZohoError::Token(ref msg) if msg == "invalid_code"), "{err:?}");
}

#[tokio::test]
async fn missing_refresh_token_fails_before_any_request() {
    let server = MockServer::start().await;
    let mut config = config_for(&server);
    config.refresh_token = None;
    let client = ZohoClient::new(config).unwrap();
    let err = client.refresh_access_token().await.unwrap_err();
    assert!(matches!(err, ZohoError::MissingRefreshToken));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn fetch_walks_pages_until_more_records_is_false() {
    let server = MockServer::start().await;
    let fields = LEAD_FIELDS.join(",");
    Mock::given(method("GET"))
        .and(path("/crm/v2/Leads"))
        .and(header("authorization", "Bearer 1000.access"))
        .and(query_param("per_page", "200"))
        .and(query_param("fields", fields.as_str()))
        .and(query_param("page", "1"))
        .respond_with(page(vec![lead_json(1, "Kim"), lead_json(2, "Lee")], true))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/crm/v2/Leads"))
        .and(query_param("page", "2"))
        .respond_with(page(vec![lead_json(3, "Kim")], false))
        .expect(1)
        .mount(&server)
        .await;

    let leads = client_for(&server)
        .fetch_all_leads(&AccessToken::new("1000.access"))
        .await
        .unwrap();
    let ids: Vec<_> = leads.iter().filter_map(|l| l.id.as_deref()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn no_content_response_ends_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/crm/v2/Leads"))
        .and(query_param("page", "1"))
        .respond_with(page(vec![lead_json(1, "Kim")], true))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/crm/v2/Leads"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let leads = client_for(&server)
        .fetch_all_leads(&AccessToken::new("t"))
        .await
        .unwrap();
    assert_eq!(leads.len(), 1);
}

#[tokio::test]
async fn error_status_fails_the_whole_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/crm/v2/Leads"))
        .and(query_param("page", "1"))
        .respond_with(page(vec![lead_json(1, "Kim")], true))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/crm/v2/Leads"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_all_leads(&AccessToken::new("t"))
        .await
        .unwrap_err();
    match err {
        ZohoError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "backend down");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn snapshot_is_served_from_memory_within_ttl() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_single_page(&server, 1).await;

    let cache = LeadCache::new(client_for(&server), CacheSettings::default());
    assert!(cache.peek().await.is_none());
    let first = cache.snapshot().await.unwrap();
    let second = cache.snapshot().await.unwrap();
    assert!(!first.is_empty());
    assert!(Arc::ptr_eq(&first, &second));
    assert!(cache.peek().await.is_some());
}

#[tokio::test]
async fn expired_snapshot_requeries_the_api() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_single_page(&server, 2).await;

    let settings = CacheSettings {
        leads_ttl: Duration::from_millis(200),
        token_ttl: Duration::from_secs(60),
    };
    let cache = LeadCache::new(client_for(&server), settings);
    let first = cache.snapshot().await.unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    let second = cache.snapshot().await.unwrap();
    assert_eq!(first.len(), second.len());
    assert!(!Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn expired_access_token_is_requested_again() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;
    mount_single_page(&server, 2).await;

    let settings = CacheSettings {
        leads_ttl: Duration::from_millis(100),
        token_ttl: Duration::from_millis(150),
    };
    let cache = LeadCache::new(client_for(&server), settings);
    cache.snapshot().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    cache.snapshot().await.unwrap();
}

#[tokio::test]
async fn refresh_bypasses_a_live_snapshot() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_single_page(&server, 2).await;

    let cache = LeadCache::new(client_for(&server), CacheSettings::default());
    cache.snapshot().await.unwrap();
    let refreshed = cache.refresh().await.unwrap();
    assert_eq!(refreshed.len(), 2);
}

#[tokio::test]
async fn concurrent_misses_share_one_fetch() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_single_page(&server, 1).await;

    let cache = LeadCache::new(client_for(&server), CacheSettings::default());
    let (a, b) = tokio::join!(cache.snapshot(), cache.snapshot());
    assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
}

#[tokio::test]
async fn rejected_token_is_not_reused() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/crm/v2/Leads"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "code": "INVALID_TOKEN" })))
        .expect(2)
        .mount(&server)
        .await;

    let cache = LeadCache::new(client_for(&server), CacheSettings::default());
    assert!(cache.snapshot().await.unwrap_err().is_unauthorized());
    assert!(cache.snapshot().await.unwrap_err().is_unauthorized());
    assert!(cache.peek().await.is_none());
}

#[tokio::test]
async fn authorization_url_carries_offline_consent_params() {
    let server = MockServer::start().await;
    let client = ZohoClient::new(config_for(&server).with_redirect_uri("http://localhost:7860"))
        .unwrap();
    let url = client.authorization_url("ZohoCRM.modules.leads.READ").unwrap();
    assert_eq!(url.path(), "/oauth/v2/auth");
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let get = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };
    assert_eq!(get("scope"), Some("ZohoCRM.modules.leads.READ"));
    assert_eq!(get("client_id"), Some("client-1"));
    assert_eq!(get("access_type"), Some("offline"));
    assert_eq!(get("redirect_uri"), Some("http://localhost:7860"));
}

#[tokio::test]
async fn authorization_code_exchange_returns_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=1000.code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "1000.access",
            "refresh_token": "1000.new-refresh",
            "api_domain": "https://www.zohoapis.com",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client_for(&server).exchange_code("1000.code").await.unwrap();
    assert_eq!(grant.refresh_token.as_deref(), Some("1000.new-refresh"));
    assert_eq!(grant.expires_in, Some(3600));
}
