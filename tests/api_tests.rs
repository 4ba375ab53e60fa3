use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use avatarforge::clients::identity::{Identity, IdentityProvider};
use avatarforge::config::Config;
use avatarforge::state::SharedState;

const USER_TOKEN: &str = "tok-user";
const ADMIN_TOKEN: &str = "tok-admin";
const ROOT_TOKEN: &str = "tok-root";

/// Identity provider stub: a fixed token -> identity map.
struct StaticIdentityProvider {
    tokens: HashMap<String, Identity>,
}

#[async_trait::async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify_token(&self, token: &str) -> anyhow::Result<Option<Identity>> {
        Ok(self.tokens.get(token).cloned())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.access.admin_emails = vec!["admin@x.com".to_string()];
    config.access.super_admin_email = "root@x.com".to_string();
    config
}

async fn spawn_app() -> Router {
    let mut tokens = HashMap::new();
    tokens.insert(
        USER_TOKEN.to_string(),
        Identity {
            external_id: "ext-user-1".to_string(),
            email: "user@x.com".to_string(),
        },
    );
    tokens.insert(
        ADMIN_TOKEN.to_string(),
        Identity {
            external_id: "ext-admin-1".to_string(),
            email: "admin@x.com".to_string(),
        },
    );
    tokens.insert(
        ROOT_TOKEN.to_string(),
        Identity {
            external_id: "ext-root-1".to_string(),
            email: "root@x.com".to_string(),
        },
    );

    let identity = Arc::new(StaticIdentityProvider { tokens });
    let shared = Arc::new(
        SharedState::with_identity(test_config(), identity)
            .await
            .expect("Failed to create shared state"),
    );
    let state = avatarforge::api::create_app_state(shared, None);
    avatarforge::api::router(state)
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Provisions the caller and returns its account object.
async fn provision(app: &Router, token: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(request("GET", "/api/me", Some(token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["data"].clone()
}

#[tokio::test]
async fn test_requires_authentication() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/me", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/me", Some("bogus-token"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Health stays public
    let response = app
        .clone()
        .oneshot(request("GET", "/api/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_first_visit_provisions_account() {
    let app = spawn_app().await;

    let me = provision(&app, USER_TOKEN).await;
    assert_eq!(me["account"]["email"], "user@x.com");
    assert_eq!(me["account"]["credits"], 5);
    assert_eq!(me["account"]["is_active"], false);
    assert_eq!(me["account"]["is_authenticated"], false);
    assert_eq!(me["authorized"], false);

    // Second visit is a no-op
    let me = provision(&app, USER_TOKEN).await;
    assert_eq!(me["account"]["credits"], 5);
}

#[tokio::test]
async fn test_admin_email_is_authorized_immediately() {
    let app = spawn_app().await;

    let me = provision(&app, ADMIN_TOKEN).await;
    assert_eq!(me["account"]["is_active"], true);
    assert_eq!(me["account"]["is_authenticated"], true);
    assert_eq!(me["account"]["is_admin"], true);
    assert_eq!(me["authorized"], true);
}

#[tokio::test]
async fn test_pending_account_cannot_reach_product_surface() {
    let app = spawn_app().await;
    provision(&app, USER_TOKEN).await;

    let body = serde_json::json!({
        "target_audience": "Thai moms",
        "help_description": "learning English"
    });
    let response = app
        .clone()
        .oneshot(request("POST", "/api/generate", Some(USER_TOKEN), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/credits", Some(USER_TOKEN), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_generate_validates_input_before_charging() {
    let app = spawn_app().await;
    provision(&app, ADMIN_TOKEN).await;

    let body = serde_json::json!({
        "target_audience": "   ",
        "help_description": "learning English"
    });
    let response = app
        .clone()
        .oneshot(request("POST", "/api/generate", Some(ADMIN_TOKEN), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Balance untouched
    let response = app
        .clone()
        .oneshot(request("GET", "/api/credits", Some(ADMIN_TOKEN), None))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["credits"], 5);
}

#[tokio::test]
async fn test_generate_refuses_on_empty_balance() {
    let app = spawn_app().await;
    let me = provision(&app, ADMIN_TOKEN).await;
    let account_id = me["account"]["id"].as_i64().unwrap();

    // Drain the admin's own balance
    let body = serde_json::json!({ "amount": 5, "is_add": false });
    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/admin/accounts/{account_id}/credits"),
            Some(ADMIN_TOKEN),
            Some(body),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = serde_json::json!({
        "target_audience": "Thai moms",
        "help_description": "learning English"
    });
    let response = app
        .clone()
        .oneshot(request("POST", "/api/generate", Some(ADMIN_TOKEN), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_admin_adjustment_can_force_negative_balance() {
    let app = spawn_app().await;
    provision(&app, ADMIN_TOKEN).await;
    let user = provision(&app, USER_TOKEN).await;
    let user_id = user["account"]["id"].as_i64().unwrap();

    let body = serde_json::json!({ "amount": 10, "is_add": false });
    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/admin/accounts/{user_id}/credits"),
            Some(ADMIN_TOKEN),
            Some(body),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["credits"], -5);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/admin/accounts/{user_id}/credits/history"),
            Some(ADMIN_TOKEN),
            None,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    let newest = &body["data"][0];
    assert_eq!(newest["amount"], -10);
    assert_eq!(newest["action_type"], "admin_remove");
}

#[tokio::test]
async fn test_admin_routes_refuse_non_admins() {
    let app = spawn_app().await;
    provision(&app, USER_TOKEN).await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/admin/accounts", Some(USER_TOKEN), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_bulk_create_accounts() {
    let app = spawn_app().await;
    provision(&app, ADMIN_TOKEN).await;

    let body = serde_json::json!({
        "emails": ["a@x.com", "b@x.com"],
        "default_credits": 5
    });
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/accounts/bulk",
            Some(ADMIN_TOKEN),
            Some(body),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let created = body["data"].as_array().unwrap();
    assert_eq!(created.len(), 2);

    for account in created {
        assert_eq!(account["credits"], 5);
        assert_eq!(account["is_active"], true);
        assert!(
            account["external_id"]
                .as_str()
                .unwrap()
                .starts_with("import-")
        );
    }
    assert_ne!(created[0]["external_id"], created[1]["external_id"]);
}

#[tokio::test]
async fn test_csv_import_filters_non_emails() {
    let app = spawn_app().await;
    provision(&app, ADMIN_TOKEN).await;

    let csv = "c@x.com\nnot-an-email\n\n  d@x.com  \n";
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/accounts/import")
                .header("Authorization", format!("Bearer {ADMIN_TOKEN}"))
                .header("Content-Type", "text/csv")
                .body(Body::from(csv))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let created = body["data"].as_array().unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0]["email"], "c@x.com");
    assert_eq!(created[1]["email"], "d@x.com");
}

#[tokio::test]
async fn test_only_super_admin_may_grant_admin() {
    let app = spawn_app().await;
    provision(&app, ADMIN_TOKEN).await;
    provision(&app, ROOT_TOKEN).await;
    let user = provision(&app, USER_TOKEN).await;
    let user_id = user["account"]["id"].as_i64().unwrap();

    // A regular admin cannot grant the flag
    let body = serde_json::json!({ "value": true });
    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/admin/accounts/{user_id}/admin"),
            Some(ADMIN_TOKEN),
            Some(body.clone()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The super admin can
    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/admin/accounts/{user_id}/admin"),
            Some(ROOT_TOKEN),
            Some(body),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["is_admin"], true);
}

#[tokio::test]
async fn test_activation_opens_the_gate() {
    let app = spawn_app().await;
    provision(&app, ADMIN_TOKEN).await;
    let user = provision(&app, USER_TOKEN).await;
    let user_id = user["account"]["id"].as_i64().unwrap();

    // The admin UI toggles both flags together; the API takes each alone.
    for field in ["active", "authenticated"] {
        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/api/admin/accounts/{user_id}/{field}"),
                Some(ADMIN_TOKEN),
                Some(serde_json::json!({ "value": true })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(request("GET", "/api/credits", Some(USER_TOKEN), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["credits"], 5);
}

#[tokio::test]
async fn test_delete_account_removes_it_entirely() {
    let app = spawn_app().await;
    provision(&app, ADMIN_TOKEN).await;
    let user = provision(&app, USER_TOKEN).await;
    let user_id = user["account"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/admin/accounts/{user_id}"),
            Some(ADMIN_TOKEN),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/admin/accounts", Some(ADMIN_TOKEN), None))
        .await
        .unwrap();
    let body = json_body(response).await;
    let emails: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|a| a["email"].as_str())
        .collect();
    assert!(!emails.contains(&"user@x.com"));

    // The next visit provisions a fresh, unapproved account
    let me = provision(&app, USER_TOKEN).await;
    assert_eq!(me["account"]["credits"], 5);
    assert_eq!(me["account"]["is_active"], false);
}

#[tokio::test]
async fn test_metrics_endpoint_is_admin_gated() {
    let app = spawn_app().await;
    provision(&app, ADMIN_TOKEN).await;
    provision(&app, USER_TOKEN).await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/admin/metrics", Some(USER_TOKEN), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/admin/metrics", Some(ADMIN_TOKEN), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
