//! End-to-end tests: the real router over an in-memory SQLite database.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use relay_api::auth::AppStateInner;
use relay_auth::password::hash_password;
use relay_auth::{Authenticator, TokenService};
use relay_db::Database;
use relay_types::models::Role;

const SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";
const BOT_TOKEN: &str = "bot-secret-token";
const ADMIN_PASSWORD: &str = "admin-password";

struct TestApp {
    app: Router,
    db: Arc<Database>,
}

fn setup() -> TestApp {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let hash = hash_password(ADMIN_PASSWORD).unwrap();
    db.create_user("admin", &hash, Role::Admin, None).unwrap().unwrap();

    let auth = Authenticator::new(db.clone(), TokenService::new(SECRET)).unwrap();
    let state = Arc::new(AppStateInner {
        db: db.clone(),
        auth,
        token_ttl: Duration::from_secs(30 * 60),
        bot_token: Some(BOT_TOKEN.to_string()),
    });

    TestApp {
        app: relay_api::router(state),
        db,
    }
}

impl TestApp {
    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send_full(req).await;
        (status, body)
    }

    async fn send_full(&self, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    async fn login(&self, username: &str, password: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!(
                "grant_type=password&username={}&password={}",
                username, password
            )))
            .unwrap();
        self.send_full(req).await
    }

    async fn token(&self, username: &str, password: &str) -> String {
        let (status, _, body) = self.login(username, password).await;
        assert_eq!(status, StatusCode::OK, "login failed for {}: {}", username, body);
        assert_eq!(body["token_type"], "bearer");
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        self.token("admin", ADMIN_PASSWORD).await
    }

    async fn create_user(&self, admin: &str, username: &str, role: &str, manager: Option<Uuid>) -> (StatusCode, Value) {
        let mut body = json!({
            "username": username,
            "password": format!("{}-password", username),
            "role_name": role,
        });
        if let Some(manager) = manager {
            body["manager_id"] = json!(manager);
        }
        self.json(Method::POST, "/users", Some(admin), Some(body)).await
    }

    /// Creates a user and logs in as them; returns (id, token).
    async fn user(&self, admin: &str, username: &str, role: &str, manager: Option<Uuid>) -> (Uuid, String) {
        let (status, body) = self.create_user(admin, username, role, manager).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
        let token = self.token(username, &format!("{}-password", username)).await;
        (id, token)
    }

    async fn post_request(&self, token: &str, message: &str) -> Uuid {
        let (status, body) = self
            .json(
                Method::POST,
                "/requests",
                Some(token),
                Some(json!({ "bottoken": "t1", "chatid": "123", "message": message })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    async fn visible_messages(&self, token: &str) -> Vec<String> {
        let (status, body) = self.json(Method::GET, "/requests", Some(token), None).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        let mut messages: Vec<String> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["message"].as_str().unwrap().to_string())
            .collect();
        messages.sort();
        messages
    }
}

#[tokio::test]
async fn alice_bob_admin_scenario() {
    let t = setup();
    let admin = t.admin_token().await;
    let (alice_id, alice) = t.user(&admin, "alice", "User", None).await;
    let (_, bob) = t.user(&admin, "bob", "User", None).await;

    let (status, body) = t
        .json(
            Method::POST,
            "/requests",
            Some(&alice),
            Some(json!({ "bottoken": "t1", "chatid": "123", "message": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], json!(alice_id));
    assert_eq!(body["bottoken"], "t1");
    assert_eq!(body["chatid"], "123");

    assert_eq!(t.visible_messages(&alice).await, vec!["hi"]);
    assert!(t.visible_messages(&bob).await.is_empty());
    assert_eq!(t.visible_messages(&admin).await, vec!["hi"]);
}

#[tokio::test]
async fn manager_sees_reports_but_not_self_or_others() {
    let t = setup();
    let admin = t.admin_token().await;
    let (mia_id, mia) = t.user(&admin, "mia", "manager", None).await;
    let (_, u1) = t.user(&admin, "u1-user", "User", Some(mia_id)).await;
    let (_, u2) = t.user(&admin, "u2-user", "User", Some(mia_id)).await;
    let (_, u3) = t.user(&admin, "u3-user", "User", None).await;

    t.post_request(&u1, "from u1").await;
    t.post_request(&u2, "from u2").await;
    t.post_request(&u3, "from u3").await;
    t.post_request(&mia, "from mia").await;

    assert_eq!(t.visible_messages(&mia).await, vec!["from u1", "from u2"]);
    assert_eq!(
        t.visible_messages(&admin).await,
        vec!["from mia", "from u1", "from u2", "from u3"]
    );
}

#[tokio::test]
async fn single_row_access_matches_list_scope() {
    let t = setup();
    let admin = t.admin_token().await;
    let (_, alice) = t.user(&admin, "alice", "User", None).await;
    let (_, bob) = t.user(&admin, "bob", "User", None).await;

    let id = t.post_request(&alice, "hi").await;
    let uri = format!("/requests/{}", id);

    let (status, body) = t.json(Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "hi");

    let (status, body) = t.json(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = t.json(Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let missing = format!("/requests/{}", Uuid::new_v4());
    let (status, _) = t.json(Method::GET, &missing, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let t = setup();

    let (status, headers, wrong_password) = t.login("admin", "not-the-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers[header::WWW_AUTHENTICATE], "Bearer");

    let (status, _, unknown_user) = t.login("nobody", "not-the-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_user);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let t = setup();

    let (status, _) = t.json(Method::GET, "/requests", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t.json(Method::GET, "/requests", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = TokenService::new(SECRET).issue("admin", Some(Duration::ZERO)).unwrap();
    let (status, _) = t.json(Method::GET, "/requests", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = TokenService::new(b"a-completely-different-secret-value!!")
        .issue("admin", None)
        .unwrap();
    let (status, _) = t.json(Method::GET, "/users/me", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let ghost = TokenService::new(SECRET).issue("ghost", None).unwrap();
    let (status, _) = t.json(Method::GET, "/users/me", Some(&ghost), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_the_token_subject() {
    let t = setup();
    let admin = t.admin_token().await;
    let (status, body) = t.json(Method::GET, "/users/me", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "Admin");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn only_admins_create_users() {
    let t = setup();
    let admin = t.admin_token().await;
    let (mia_id, mia) = t.user(&admin, "mia", "Manager", None).await;

    let (status, body) = t.create_user(&mia, "sneaky", "Admin", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap().contains("Admin"));

    let (status, body) = t.create_user(&admin, "report", "user", Some(mia_id)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "User");
    assert_eq!(body["manager_id"], json!(mia_id));
}

#[tokio::test]
async fn create_user_validation() {
    let t = setup();
    let admin = t.admin_token().await;
    let (alice_id, _) = t.user(&admin, "alice", "User", None).await;

    let (status, body) = t.create_user(&admin, "alice", "User", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username already registered");

    let (status, body) = t.create_user(&admin, "carol", "Superuser", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Superuser"));

    let (status, _) = t.create_user(&admin, "carol", "User", Some(alice_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "manager must have the Manager role");

    let (status, _) = t.create_user(&admin, "carol", "User", Some(Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "manager must exist");

    let (status, _) = t
        .json(
            Method::POST,
            "/users",
            Some(&admin),
            Some(json!({ "username": "carol", "password": "short", "role_name": "User" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // length is counted in characters, not bytes
    let (status, _) = t.create_user(&admin, "日本", "User", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = t.create_user(&admin, "日本語", "User", None).await;
    assert_eq!(status, StatusCode::CREATED);

    assert!(t.db.get_user_by_username("carol").unwrap().is_none());
}

#[tokio::test]
async fn malformed_bodies_are_json_bad_requests() {
    let t = setup();
    let admin = t.admin_token().await;

    let (status, body) = t
        .json(
            Method::POST,
            "/users",
            Some(&admin),
            Some(json!({ "username": "carol", "password": "carol-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["message"].as_str().unwrap().contains("role_name"));

    let (status, body) = t
        .json(Method::POST, "/requests", Some(&admin), Some(json!({ "chatid": "1" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("grant_type=password&username=admin"))
        .unwrap();
    let (status, body) = t.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn bot_rows_are_admin_only() {
    let t = setup();
    let admin = t.admin_token().await;
    let (mia_id, mia) = t.user(&admin, "mia", "Manager", None).await;
    let (_, alice) = t.user(&admin, "alice", "User", Some(mia_id)).await;

    let (status, _) = t
        .json(
            Method::POST,
            "/bot/requests",
            None,
            Some(json!({ "bottoken": "wrong", "chatid": "42", "message": "spoof" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = t
        .json(
            Method::POST,
            "/bot/requests",
            None,
            Some(json!({ "bottoken": BOT_TOKEN, "chatid": "42", "message": "from bot" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["user_id"].is_null());
    assert!(body.get("bottoken").is_none());

    assert_eq!(t.visible_messages(&admin).await, vec!["from bot"]);
    let (_, listed) = t.json(Method::GET, "/requests", Some(&admin), None).await;
    assert!(listed[0].get("bottoken").is_none(), "bot secret must not be echoed");
    assert!(t.visible_messages(&mia).await.is_empty());
    assert!(t.visible_messages(&alice).await.is_empty());
}

#[tokio::test]
async fn health_is_public() {
    let t = setup();
    let (status, body) = t.json(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
