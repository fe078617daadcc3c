use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use portal_client::config::{ApiSettings, Settings};
use portal_client::models::{AccessDecision, SessionRecord};
use portal_client::Portal;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_settings(base_url: &str, permission_ttl_secs: u64) -> Settings {
    Settings {
        api: ApiSettings {
            base_url: base_url.to_string(),
            logout_path: "/api/auth/logout".to_string(),
            fallback_logout_path: "/api/logout".to_string(),
            rbac_users_path: "/api/rbac/users".to_string(),
            access_check_path: "/api/rbac/check-access".to_string(),
            redirect_delay_ms: 20,
            permission_ttl_secs,
        },
    }
}

fn valid_token() -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD
        .encode(format!(r#"{{"exp":{}}}"#, Utc::now().timestamp() + 3600));
    format!("{}.{}.signature", header, payload)
}

fn signed_in_portal(base_url: &str, ttl: u64, email: &str) -> Portal {
    let portal = Portal::new(test_settings(base_url, ttl)).unwrap();
    portal.session.set_token(valid_token());
    portal.session.set_session(SessionRecord::new(email));
    portal
}

fn rbac_listing(email: &str, permissions: Value) -> Value {
    json!({
        "success": true,
        "data": {
            "users": [
                { "email": "someone.else@solsticehq.com", "permissions": [] },
                { "email": email, "permissions": permissions }
            ]
        }
    })
}

#[tokio::test]
async fn permission_cache_serves_repeat_checks_without_refetching() {
    let server = MockServer::start().await;
    let listing = rbac_listing(
        "newhire@solsticehq.com",
        json!([{ "id": "p1", "action": "access", "resource": "tasks", "isActive": true }]),
    );
    Mock::given(method("GET"))
        .and(path("/api/rbac/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .expect(1)
        .mount(&server)
        .await;

    let portal = signed_in_portal(&server.uri(), 300, "newhire@solsticehq.com");

    let first = portal.permissions.fetch_user_permissions().await;
    let second = portal.permissions.fetch_user_permissions().await;

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    // expect(1) verified on drop: the second call was a cache hit.
}

#[tokio::test]
async fn permission_cache_refetches_after_ttl() {
    let server = MockServer::start().await;
    let listing = rbac_listing(
        "newhire@solsticehq.com",
        json!([{ "id": "p1", "action": "access", "resource": "tasks", "isActive": true }]),
    );
    Mock::given(method("GET"))
        .and(path("/api/rbac/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .expect(2)
        .mount(&server)
        .await;

    let portal = signed_in_portal(&server.uri(), 1, "newhire@solsticehq.com");

    portal.permissions.fetch_user_permissions().await;
    portal.permissions.fetch_user_permissions().await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    portal.permissions.fetch_user_permissions().await;
    // expect(2): one fetch inside the window, one after expiry.
}

#[tokio::test]
async fn clear_cache_forces_immediate_refetch() {
    let server = MockServer::start().await;
    let listing = rbac_listing("newhire@solsticehq.com", json!([]));
    Mock::given(method("GET"))
        .and(path("/api/rbac/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .expect(2)
        .mount(&server)
        .await;

    let portal = signed_in_portal(&server.uri(), 300, "newhire@solsticehq.com");

    portal.permissions.fetch_user_permissions().await;
    portal.permissions.clear_cache();
    portal.permissions.fetch_user_permissions().await;
}

#[tokio::test]
async fn super_admin_short_circuits_without_network_call() {
    let server = MockServer::start().await;
    let portal = Portal::new(test_settings(&server.uri(), 300)).unwrap();

    let decision = portal
        .permissions
        .check_has_access("arjun@solsticehq.com", "whatsapp", "irrelevant", true)
        .await;

    assert_eq!(decision, AccessDecision::super_admin());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_only_resource_denies_non_admin_without_rbac_lookup() {
    let server = MockServer::start().await;
    let portal = Portal::new(test_settings(&server.uri(), 300)).unwrap();

    let decision = portal
        .permissions
        .check_has_access("newhire@solsticehq.com", "qr-codes", "tok", true)
        .await;

    assert_eq!(decision, AccessDecision::no_permission());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn backend_access_check_verdict_is_authoritative() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rbac/check-access"))
        .and(query_param("email", "newhire@solsticehq.com"))
        .and(query_param("resource", "referrals"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "hasAccess": true, "reason": "granted" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let portal = Portal::new(test_settings(&server.uri(), 300)).unwrap();

    let decision = portal
        .permissions
        .check_has_access("newhire@solsticehq.com", "referrals", "tok", false)
        .await;

    assert!(decision.has_access);
    assert_eq!(decision.reason, "granted");
}

#[tokio::test]
async fn failed_access_check_denies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rbac/check-access"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let portal = Portal::new(test_settings(&server.uri(), 300)).unwrap();

    let decision = portal
        .permissions
        .check_has_access("newhire@solsticehq.com", "referrals", "tok", false)
        .await;

    assert_eq!(decision, AccessDecision::no_permission());
}

#[tokio::test]
async fn empty_grant_fetch_falls_back_to_static_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rbac/users"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let portal = signed_in_portal(&server.uri(), 300, "newhire@solsticehq.com");

    // tasks has a wildcard allow: fail-open grants it during the outage.
    assert!(portal.permissions.can_access_rbac("tasks").await);
    // whatsapp's static allow-list does not include this user.
    assert!(!portal.permissions.can_access_rbac("whatsapp").await);
}

#[tokio::test]
async fn live_grants_take_precedence_over_static_table() {
    let server = MockServer::start().await;
    let listing = rbac_listing(
        "newhire@solsticehq.com",
        json!([
            { "id": "p1", "action": "access", "resource": "whatsapp", "isActive": true },
            { "id": "p2", "action": "access", "resource": "tasks", "isActive": false }
        ]),
    );
    Mock::given(method("GET"))
        .and(path("/api/rbac/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .mount(&server)
        .await;

    let portal = signed_in_portal(&server.uri(), 300, "newhire@solsticehq.com");

    // Granted live even though the static whatsapp list excludes them.
    assert!(portal.permissions.can_access_rbac("whatsapp").await);
    // With a non-empty grant list the static wildcard no longer applies,
    // and the tasks grant is inactive.
    assert!(!portal.permissions.can_access_rbac("tasks").await);
}

#[tokio::test]
async fn grant_matching_is_email_case_insensitive_and_defaults_active() {
    let server = MockServer::start().await;
    let listing = rbac_listing(
        "NewHire@SolsticeHQ.com",
        json!([{ "id": "p1", "action": "access", "resource": "whatsapp" }]),
    );
    Mock::given(method("GET"))
        .and(path("/api/rbac/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .mount(&server)
        .await;

    let portal = signed_in_portal(&server.uri(), 300, "newhire@solsticehq.com");

    let grants = portal.permissions.fetch_user_permissions().await;
    assert_eq!(grants.len(), 1);
    assert!(grants[0].is_active);
    assert!(portal.permissions.can_access_rbac("whatsapp").await);
}

#[tokio::test]
async fn missing_session_email_yields_no_permissions() {
    let server = MockServer::start().await;
    let portal = Portal::new(test_settings(&server.uri(), 300)).unwrap();
    portal.session.set_token(valid_token());
    // No session record stored.

    let grants = portal.permissions.fetch_user_permissions().await;

    assert!(grants.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}
