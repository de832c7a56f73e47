use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestResponse, TestServer};
use serde_json::{json, Value};
use uuid::Uuid;

use skillswap_database::MemoryStore;
use skillswap_marketplace::{
    config::{AppConfig, StorageBackend},
    create_app, AppState,
};

struct TestApp {
    server: TestServer,
    state: AppState,
}

struct TestUser {
    id: Uuid,
    token: String,
}

fn test_app() -> TestApp {
    let mut config = AppConfig::default();
    config.storage = StorageBackend::Memory;
    config.auth.bcrypt_cost = 4;

    let state = AppState::new(Arc::new(MemoryStore::new()), config);
    let server = TestServer::new(create_app(state.clone())).unwrap();
    TestApp { server, state }
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

fn with_query(request: TestRequest, query: &str) -> TestRequest {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .fold(request, |request, pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            request.add_query_param(key, value)
        })
}

fn data(response: &TestResponse) -> Value {
    response.json::<Value>()["data"].clone()
}

impl TestApp {
    async fn register(&self, name: &str, offered: &[&str], wanted: &[&str]) -> TestUser {
        self.register_with(json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "password": "password123",
            "offered_skills": offered,
            "wanted_skills": wanted,
        }))
        .await
    }

    async fn register_with(&self, body: Value) -> TestUser {
        let response = self.server.post("/api/auth/register").json(&body).await;
        response.assert_status(StatusCode::CREATED);
        let body = data(&response);
        TestUser {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    async fn admin(&self, name: &str) -> TestUser {
        let user = self.register(name, &[], &[]).await;
        self.state.store.set_admin(user.id, true).await.unwrap();
        user
    }

    /// `path` may carry a query string; its pairs go through the request
    /// builder rather than the URL.
    async fn get(&self, user: &TestUser, path: &str) -> TestResponse {
        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        let request = self
            .server
            .get(path)
            .add_header(AUTHORIZATION, bearer(&user.token));
        with_query(request, query).await
    }

    async fn post(&self, user: &TestUser, path: &str, body: Value) -> TestResponse {
        self.server
            .post(path)
            .add_header(AUTHORIZATION, bearer(&user.token))
            .json(&body)
            .await
    }

    async fn put(&self, user: &TestUser, path: &str, body: Value) -> TestResponse {
        self.server
            .put(path)
            .add_header(AUTHORIZATION, bearer(&user.token))
            .json(&body)
            .await
    }

    async fn delete(&self, user: &TestUser, path: &str) -> TestResponse {
        self.server
            .delete(path)
            .add_header(AUTHORIZATION, bearer(&user.token))
            .await
    }

    async fn request_swap(&self, from: &TestUser, to: &TestUser, offered: &str, wanted: &str) -> TestResponse {
        self.post(
            from,
            "/api/swaps",
            json!({
                "recipient_id": to.id,
                "offered_skill": offered,
                "wanted_skill": wanted,
                "message": "Happy to trade!",
            }),
        )
        .await
    }

    async fn notification_kinds(&self, user: &TestUser) -> Vec<String> {
        let response = self.get(user, "/api/notifications").await;
        response.assert_status_ok();
        data(&response)["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["kind"].as_str().unwrap().to_string())
            .collect()
    }
}

#[tokio::test]
async fn test_javascript_python_swap_end_to_end() {
    let app = test_app();
    let alice = app.register("Alice", &["JavaScript"], &["Python"]).await;
    let bob = app.register("Bob", &["Python"], &["JavaScript"]).await;

    let response = app.request_swap(&alice, &bob, "JavaScript", "Python").await;
    response.assert_status(StatusCode::CREATED);
    let swap = data(&response);
    assert_eq!(swap["status"], "pending");
    let swap_id = swap["id"].as_str().unwrap().to_string();

    assert_eq!(app.notification_kinds(&bob).await, vec!["swap_request"]);

    let response = app.put(&bob, &format!("/api/swaps/{}/accept", swap_id), json!({})).await;
    response.assert_status_ok();
    assert_eq!(data(&response)["status"], "accepted");
    assert!(data(&response)["completed_at"].is_null());

    let response = app.put(&alice, &format!("/api/swaps/{}/complete", swap_id), json!({})).await;
    response.assert_status_ok();
    let completed = data(&response);
    assert_eq!(completed["status"], "completed");
    assert!(completed["completed_at"].is_string());

    let response = app
        .post(&alice, &format!("/api/swaps/{}/feedback", swap_id), json!({"rating": 5, "comment": "Clear and patient"}))
        .await;
    response.assert_status_ok();
    assert_eq!(data(&response)["feedback_complete"], false);

    let bob_profile = data(&app.get(&alice, &format!("/api/users/{}", bob.id)).await);
    assert_eq!(bob_profile["rating"], 5.0);
    assert_eq!(bob_profile["review_count"], 1);

    let response = app
        .post(&bob, &format!("/api/swaps/{}/feedback", swap_id), json!({"rating": 4}))
        .await;
    response.assert_status_ok();
    assert_eq!(data(&response)["feedback_complete"], true);

    let alice_profile = data(&app.get(&bob, &format!("/api/users/{}", alice.id)).await);
    assert_eq!(alice_profile["rating"], 4.0);
    assert_eq!(alice_profile["review_count"], 1);

    for user in [&alice, &bob] {
        let kinds = app.notification_kinds(user).await;
        assert_eq!(kinds.iter().filter(|k| *k == "feedback_received").count(), 1);
        assert_eq!(kinds.iter().filter(|k| *k == "swap_completed").count(), 1);
    }

    // Second feedback from the same participant is refused and changes nothing
    let response = app
        .post(&alice, &format!("/api/swaps/{}/feedback", swap_id), json!({"rating": 1}))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let bob_profile = data(&app.get(&alice, &format!("/api/users/{}", bob.id)).await);
    assert_eq!(bob_profile["rating"], 5.0);
    assert_eq!(bob_profile["review_count"], 1);

    let stats = data(&app.get(&alice, "/api/swaps/stats").await);
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["total"], 1);
}

#[tokio::test]
async fn test_swap_creation_rules() {
    let app = test_app();
    let alice = app.register("Alice", &["JavaScript"], &["Python"]).await;
    let bob = app.register("Bob", &["Python"], &["JavaScript"]).await;

    // Requesting yourself
    app.request_swap(&alice, &alice, "JavaScript", "JavaScript")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // Skills must come from the right lists
    let response = app.request_swap(&alice, &bob, "Cooking", "Python").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["errors"][0]["field"], "offered_skill");
    app.request_swap(&alice, &bob, "JavaScript", "Go")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // Unknown recipient
    let ghost = TestUser {
        id: Uuid::new_v4(),
        token: String::new(),
    };
    app.request_swap(&alice, &ghost, "JavaScript", "Python")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.request_swap(&alice, &bob, "JavaScript", "Python")
        .await
        .assert_status(StatusCode::CREATED);

    // A second pending swap between the pair is refused in either direction
    app.request_swap(&alice, &bob, "JavaScript", "Python")
        .await
        .assert_status(StatusCode::CONFLICT);
    app.request_swap(&bob, &alice, "Python", "JavaScript")
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_rejected_and_cancelled_swaps_free_the_pair() {
    let app = test_app();
    let alice = app.register("Alice", &["JavaScript"], &["Python"]).await;
    let bob = app.register("Bob", &["Python"], &["JavaScript"]).await;

    let first = data(&app.request_swap(&alice, &bob, "JavaScript", "Python").await);
    let response = app.put(&bob, &format!("/api/swaps/{}/reject", first["id"].as_str().unwrap()), json!({})).await;
    response.assert_status_ok();
    assert_eq!(data(&response)["status"], "rejected");
    assert_eq!(app.notification_kinds(&alice).await, vec!["swap_rejected"]);

    let second = data(&app.request_swap(&bob, &alice, "Python", "JavaScript").await);
    let response = app.delete(&bob, &format!("/api/swaps/{}", second["id"].as_str().unwrap())).await;
    response.assert_status_ok();
    assert_eq!(data(&response)["status"], "cancelled");

    app.request_swap(&alice, &bob, "JavaScript", "Python")
        .await
        .assert_status(StatusCode::CREATED);

    let sent = data(&app.get(&alice, "/api/swaps?direction=sent").await);
    assert_eq!(sent["total"], 2);
    let pending = data(&app.get(&alice, "/api/swaps?status=pending").await);
    assert_eq!(pending["total"], 1);
}

#[tokio::test]
async fn test_forbidden_is_distinct_from_missing() {
    let app = test_app();
    let alice = app.register("Alice", &["JavaScript"], &["Python"]).await;
    let bob = app.register("Bob", &["Python"], &["JavaScript"]).await;
    let carol = app.register("Carol", &["Go"], &["Rust"]).await;

    let swap = data(&app.request_swap(&alice, &bob, "JavaScript", "Python").await);
    let swap_path = format!("/api/swaps/{}", swap["id"].as_str().unwrap());

    app.get(&carol, &swap_path).await.assert_status(StatusCode::FORBIDDEN);
    app.get(&carol, &format!("/api/swaps/{}", Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.put(&carol, &format!("{}/accept", swap_path), json!({}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // The requester may not accept; the recipient may not cancel
    app.put(&alice, &format!("{}/accept", swap_path), json!({}))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.delete(&bob, &swap_path).await.assert_status(StatusCode::FORBIDDEN);

    // Completing a pending swap is a state conflict
    app.put(&alice, &format!("{}/complete", swap_path), json!({}))
        .await
        .assert_status(StatusCode::CONFLICT);
    // Feedback before completion as well
    app.post(&alice, &format!("{}/feedback", swap_path), json!({"rating": 5}))
        .await
        .assert_status(StatusCode::CONFLICT);

    app.put(&bob, &format!("{}/accept", swap_path), json!({}))
        .await
        .assert_status_ok();
    let response = app.put(&bob, &format!("{}/accept", swap_path), json!({})).await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["success"], false);

    // Status is unchanged by the failed attempts
    assert_eq!(data(&app.get(&alice, &swap_path).await)["status"], "accepted");
}

#[tokio::test]
async fn test_profile_visibility() {
    let app = test_app();
    let alice = app.register("Alice", &["JavaScript"], &["Python"]).await;
    let hidden = app
        .register_with(json!({
            "name": "Hidden",
            "email": "hidden@example.com",
            "password": "password123",
            "visibility": "private",
            "offered_skills": ["Python"],
        }))
        .await;

    app.get(&alice, &format!("/api/users/{}", hidden.id))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.get(&hidden, &format!("/api/users/{}", hidden.id))
        .await
        .assert_status_ok();

    // Admins get no exception on the public directory
    let root = app.admin("Root").await;
    app.get(&root, &format!("/api/users/{}", hidden.id))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    let seen = data(&app.get(&root, &format!("/api/users/{}", alice.id)).await);
    assert_eq!(seen["name"], "Alice");
    assert!(seen.get("email").is_none());
    app.get(&alice, &format!("/api/users/{}", Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let matches = data(&app.get(&alice, "/api/users/matches").await);
    assert_eq!(matches["total"], 0);
    let search = data(&app.get(&alice, "/api/users?skill=python").await);
    assert_eq!(search["total"], 0);
}

#[tokio::test]
async fn test_matches_and_search() {
    let app = test_app();
    let alice = app.register("Alice", &["JavaScript"], &["Python"]).await;
    let bob = app.register("Bob", &["Python"], &[]).await;
    let carol = app.register("Carol", &[], &["JavaScript"]).await;
    app.register("Dave", &["Go"], &["Rust"]).await;

    let matches = data(&app.get(&alice, "/api/users/matches").await);
    assert_eq!(matches["total"], 2);
    let ids: Vec<&str> = matches["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["profile"]["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&bob.id.to_string().as_str()));
    assert!(ids.contains(&carol.id.to_string().as_str()));
    assert!(!ids.contains(&alice.id.to_string().as_str()));

    let search = data(&app.get(&alice, "/api/users?q=pyth").await);
    assert_eq!(search["total"], 1);
    assert_eq!(search["items"][0]["name"], "Bob");
    assert!(search["items"][0].get("email").is_none());

    let by_skill = data(&app.get(&alice, "/api/users?skill=javascript").await);
    assert_eq!(by_skill["total"], 1);
    assert_eq!(by_skill["items"][0]["name"], "Carol");

    let page = data(&app.get(&alice, "/api/users?limit=1&page=2").await);
    assert_eq!(page["total"], 3);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["total_pages"], 3);
}

#[tokio::test]
async fn test_skill_editing_is_idempotent() {
    let app = test_app();
    let alice = app.register("Alice", &["JavaScript"], &[]).await;

    let response = app
        .post(&alice, "/api/profile/skills/offered", json!({"skill": "  Rust "}))
        .await;
    response.assert_status_ok();
    assert_eq!(data(&response)["offered_skills"], json!(["JavaScript", "Rust"]));

    let response = app
        .post(&alice, "/api/profile/skills/offered", json!({"skill": "Rust"}))
        .await;
    assert_eq!(data(&response)["offered_skills"], json!(["JavaScript", "Rust"]));

    let response = app.delete(&alice, "/api/profile/skills/offered/Cooking").await;
    response.assert_status_ok();
    assert_eq!(data(&response)["offered_skills"], json!(["JavaScript", "Rust"]));

    let response = app.delete(&alice, "/api/profile/skills/offered/JavaScript").await;
    assert_eq!(data(&response)["offered_skills"], json!(["Rust"]));

    let response = app
        .put(&alice, "/api/profile", json!({"wanted_skills": ["Go", "Go", "Elm"], "bio": "Hi"}))
        .await;
    response.assert_status_ok();
    assert_eq!(data(&response)["wanted_skills"], json!(["Go", "Elm"]));
    assert_eq!(data(&response)["bio"], "Hi");
}

#[tokio::test]
async fn test_admin_moderation() {
    let app = test_app();
    let root = app.admin("Root").await;
    let other_admin = app.admin("Other").await;
    let alice = app.register("Alice", &["JavaScript"], &["Python"]).await;
    let bob = app.register("Bob", &["Python"], &["JavaScript"]).await;

    // Plain users cannot reach admin routes
    app.get(&alice, "/api/admin/stats").await.assert_status(StatusCode::FORBIDDEN);
    app.server.get("/api/admin/stats").await.assert_status(StatusCode::UNAUTHORIZED);

    // Admins cannot be banned
    let response = app
        .put(&root, &format!("/api/admin/users/{}/ban", other_admin.id), json!({}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "Cannot ban an administrator");

    // Nor can an admin drop their own flag
    app.put(&root, &format!("/api/admin/users/{}/admin", root.id), json!({"is_admin": false}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .put(&root, &format!("/api/admin/users/{}/ban", bob.id), json!({}))
        .await;
    response.assert_status_ok();
    assert_eq!(data(&response)["is_banned"], true);

    // The banned user is locked out and hidden
    app.server
        .post("/api/auth/login")
        .json(&json!({"email": "bob@example.com", "password": "password123"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.get(&bob, "/api/auth/me").await.assert_status(StatusCode::FORBIDDEN);
    app.get(&alice, &format!("/api/users/{}", bob.id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert_eq!(data(&app.get(&alice, "/api/users/matches").await)["total"], 0);
    app.request_swap(&alice, &bob, "JavaScript", "Python")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let users = data(&app.get(&root, "/api/admin/users").await);
    assert_eq!(users["total"], 4);

    let stats = data(&app.get(&root, "/api/admin/stats").await);
    assert_eq!(stats["users"]["banned"], 1);
    assert_eq!(stats["users"]["admins"], 2);

    app.put(&root, &format!("/api/admin/users/{}/unban", bob.id), json!({}))
        .await
        .assert_status_ok();
    app.server
        .post("/api/auth/login")
        .json(&json!({"email": "bob@example.com", "password": "password123"}))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_admin_broadcast() {
    let app = test_app();
    let root = app.admin("Root").await;
    let alice = app.register("Alice", &[], &[]).await;
    let bob = app.register("Bob", &[], &[]).await;

    let response = app
        .post(
            &root,
            "/api/admin/messages",
            json!({"title": "Maintenance", "message": "Back soon", "kind": "maintenance"}),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(data(&response)["delivered"], 3);

    let response = app
        .post(
            &root,
            "/api/admin/messages",
            json!({"title": "Hi Alice", "message": "Just you", "is_global": false, "target_user_ids": [alice.id]}),
        )
        .await;
    assert_eq!(data(&response)["delivered"], 1);

    assert_eq!(data(&app.get(&alice, "/api/notifications/unread-count").await)["count"], 2);
    assert_eq!(data(&app.get(&bob, "/api/notifications/unread-count").await)["count"], 1);

    let active = data(&app.get(&bob, "/api/messages/active").await);
    assert_eq!(active.as_array().unwrap().len(), 1);
    let active = data(&app.get(&alice, "/api/messages/active").await);
    assert_eq!(active.as_array().unwrap().len(), 2);

    // Expiry must be in the future
    app.post(
        &root,
        "/api/admin/messages",
        json!({"title": "Old", "message": "Stale", "expires_at": "2000-01-01T00:00:00Z"}),
    )
    .await
    .assert_status(StatusCode::BAD_REQUEST);

    // Deactivating hides the message without touching inboxes
    let listed = data(&app.get(&root, "/api/admin/messages").await);
    let global_id = listed["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["is_global"] == true)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    app.put(&root, &format!("/api/admin/messages/{}", global_id), json!({"is_active": false}))
        .await
        .assert_status_ok();
    assert_eq!(data(&app.get(&bob, "/api/messages/active").await).as_array().unwrap().len(), 0);
    assert_eq!(data(&app.get(&bob, "/api/notifications/unread-count").await)["count"], 1);
}

#[tokio::test]
async fn test_admin_message_activation_and_expiry() {
    let app = test_app();
    let root = app.admin("Root").await;
    let alice = app.register("Alice", &[], &[]).await;

    let response = app
        .post(
            &root,
            "/api/admin/messages",
            json!({
                "title": "Draft",
                "message": "Not yet",
                "is_active": false,
                "expires_at": "2999-01-01T00:00:00Z",
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(data(&response)["delivered"], 0);
    let message_path = format!(
        "/api/admin/messages/{}",
        data(&response)["message"]["id"].as_str().unwrap()
    );
    assert_eq!(data(&app.get(&alice, "/api/notifications/unread-count").await)["count"], 0);

    // A null expiry clears it; activation fans the message out
    let response = app
        .put(&root, &message_path, json!({"is_active": true, "expires_at": null}))
        .await;
    response.assert_status_ok();
    assert!(data(&response)["expires_at"].is_null());
    assert_eq!(data(&response)["is_active"], true);
    assert_eq!(data(&app.get(&alice, "/api/notifications/unread-count").await)["count"], 1);
    assert_eq!(data(&app.get(&alice, "/api/messages/active").await).as_array().unwrap().len(), 1);

    // Editing an active message does not deliver it again, and leaving the
    // expiry out keeps it as is
    app.put(&root, &message_path, json!({"expires_at": "2999-06-01T00:00:00Z"}))
        .await
        .assert_status_ok();
    let response = app.put(&root, &message_path, json!({"title": "Live"})).await;
    assert_eq!(data(&response)["title"], "Live");
    assert!(data(&response)["expires_at"].is_string());
    assert_eq!(data(&app.get(&alice, "/api/notifications/unread-count").await)["count"], 1);
}

#[tokio::test]
async fn test_notification_inbox() {
    let app = test_app();
    let alice = app.register("Alice", &["JavaScript"], &["Python"]).await;
    let bob = app.register("Bob", &["Python"], &["JavaScript"]).await;
    app.request_swap(&alice, &bob, "JavaScript", "Python").await;

    let inbox = data(&app.get(&bob, "/api/notifications?unread_only=true").await);
    assert_eq!(inbox["total"], 1);
    let notification_id = inbox["items"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(inbox["items"][0]["related"]["kind"], "swap_request");

    // Someone else's notification looks missing
    app.put(&alice, &format!("/api/notifications/{}/read", notification_id), json!({}))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.put(&bob, &format!("/api/notifications/{}/read", notification_id), json!({}))
        .await
        .assert_status_ok();
    assert_eq!(data(&app.get(&bob, "/api/notifications/unread-count").await)["count"], 0);

    app.delete(&bob, &format!("/api/notifications/{}", notification_id))
        .await
        .assert_status_ok();
    app.delete(&bob, &format!("/api/notifications/{}", notification_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_response_envelope() {
    let app = test_app();

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["success"], true);

    let response = app.server.get("/api/nowhere").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({"name": "", "email": "not-an-email", "password": "password123"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "name"]);

    app.register("Alice", &[], &[]).await;
    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({"name": "Again", "email": "ALICE@example.com", "password": "password123"}))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({"email": "alice@example.com", "password": "wrong-password1"}))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = app.server.get("/api/auth/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Missing or invalid authorization header");

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({"email": "alice@example.com", "password": "password123"}))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert!(body["data"]["user"].get("password_hash").is_none());
}
