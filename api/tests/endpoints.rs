//! End-to-end tests against the full router: authentication middleware,
//! policy enforcement, parent-chain resolution, and error mapping.

use api::{create_router, AppState};
use authz::types::Role;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use database::storage::{NewTitle, ReviewStore, TitleStore};
use database::{initialize_database, DatabaseConfig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use user::{
    Mailer, MailerConfig, NewUser, SignupConfig, SignupManager, TokenConfig, TokenManager,
    UserStore,
};

struct TestApp {
    _guard: TempDir,
    state: AppState,
    router: Router,
}

async fn spawn_app() -> TestApp {
    let guard = TempDir::new().unwrap();
    let db = initialize_database(DatabaseConfig::new_with_path(guard.path().join("api.db")))
        .await
        .unwrap();
    let tokens = TokenManager::new(&TokenConfig::new("test-secret"));
    // Nothing listens on the default SMTP port in tests; dispatch failures
    // must not surface.
    let signup = SignupManager::new(Mailer::new(MailerConfig::default()), SignupConfig::default());

    let state = AppState::new(db, tokens, signup);
    let router = create_router(state.clone());
    TestApp {
        _guard: guard,
        state,
        router,
    }
}

impl TestApp {
    /// Create an active account and an access token for it.
    async fn seed_user(&self, username: &str, role: Role) -> (user::User, String) {
        let account = UserStore::new(&self.state.db)
            .create(
                NewUser {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    role: Some(role),
                    ..Default::default()
                },
                true,
            )
            .await
            .unwrap();
        let token = self.state.tokens.issue(&account.id).unwrap();
        (account, token)
    }

    async fn seed_title(&self, name: &str) -> i64 {
        TitleStore::new(&self.state.db)
            .create(NewTitle {
                name: name.to_string(),
                year: 2001,
                ..Default::default()
            })
            .await
            .unwrap()
            .title
            .id
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&value).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn anonymous_can_list_reviews_for_an_existing_title() {
    let app = spawn_app().await;
    let title_id = app.seed_title("Solaris").await;
    let (author, _) = app.seed_user("lem_fan", Role::User).await;
    ReviewStore::new(&app.state.db)
        .create(title_id, &author.id, "dense but rewarding", 9)
        .await
        .unwrap();

    let (status, body) = app
        .request("GET", &format!("/api/v1/titles/{title_id}/reviews"), None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["author"], "lem_fan");
    assert_eq!(body["items"][0]["score"], 9);
}

#[tokio::test]
async fn anonymous_review_create_is_unauthorized() {
    let app = spawn_app().await;
    let title_id = app.seed_title("Solaris").await;

    let (status, _) = app
        .request(
            "POST",
            &format!("/api/v1/titles/{title_id}/reviews"),
            None,
            Some(json!({"text": "drive-by", "score": 5})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn second_review_for_the_same_title_is_rejected() {
    let app = spawn_app().await;
    let title_id = app.seed_title("Roadside Picnic").await;
    let (_, u1_token) = app.seed_user("u1", Role::User).await;
    let (_, u2_token) = app.seed_user("u2", Role::User).await;
    let uri = format!("/api/v1/titles/{title_id}/reviews");

    let (status, _) = app
        .request("POST", &uri, Some(&u1_token), Some(json!({"text": "good", "score": 7})))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .request("POST", &uri, Some(&u1_token), Some(json!({"text": "again", "score": 8})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // A different user reviews the same title just fine.
    let (status, _) = app
        .request("POST", &uri, Some(&u2_token), Some(json!({"text": "meh", "score": 4})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn only_owner_moderator_or_admin_may_update_a_review() {
    let app = spawn_app().await;
    let title_id = app.seed_title("Picnic").await;
    let (_, owner_token) = app.seed_user("owner", Role::User).await;
    let (_, stranger_token) = app.seed_user("stranger", Role::User).await;
    let (_, moderator_token) = app.seed_user("moderator", Role::Moderator).await;

    let (status, body) = app
        .request(
            "POST",
            &format!("/api/v1/titles/{title_id}/reviews"),
            Some(&owner_token),
            Some(json!({"text": "draft", "score": 5})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let review_id = body["id"].as_i64().unwrap();
    let uri = format!("/api/v1/titles/{title_id}/reviews/{review_id}");

    let (status, _) = app
        .request("PATCH", &uri, Some(&stranger_token), Some(json!({"score": 1})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request("PATCH", &uri, Some(&owner_token), Some(json!({"score": 6})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 6);

    let (status, _) = app
        .request("PATCH", &uri, Some(&moderator_token), Some(json!({"text": "moderated"})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request("DELETE", &uri, Some(&moderator_token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn comment_create_with_mismatched_chain_is_not_found() {
    let app = spawn_app().await;
    let title_a = app.seed_title("A").await;
    let title_b = app.seed_title("B").await;
    let (author, token) = app.seed_user("commenter", Role::User).await;

    let review = ReviewStore::new(&app.state.db)
        .create(title_a, &author.id, "belongs to A", 6)
        .await
        .unwrap();

    let (status, body) = app
        .request(
            "POST",
            &format!("/api/v1/titles/{title_b}/reviews/{}/comments", review.id),
            Some(&token),
            Some(json!({"text": "misrouted"})),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = app
        .request(
            "POST",
            &format!("/api/v1/titles/{title_a}/reviews/{}/comments", review.id),
            Some(&token),
            Some(json!({"text": "routed"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn signup_rejects_the_reserved_username() {
    let app = spawn_app().await;
    let (status, body) = app
        .request(
            "POST",
            "/api/v1/auth/signup",
            None,
            Some(json!({"username": "me", "email": "me@example.com"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn signup_and_confirmation_issue_a_working_token() {
    let app = spawn_app().await;

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/auth/signup",
            None,
            Some(json!({"username": "newcomer", "email": "newcomer@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let account = UserStore::new(&app.state.db)
        .get_by_username("newcomer")
        .await
        .unwrap();
    assert!(!account.is_active);

    // The code travels by email in production; fish it out of the store.
    let code: String = sqlx::query_scalar(
        "SELECT code FROM confirmation_codes WHERE user_id = ? ORDER BY created_at DESC LIMIT 1",
    )
    .bind(&account.id)
    .fetch_one(app.state.db.pool())
    .await
    .unwrap();

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/auth/token",
            None,
            Some(json!({"username": "newcomer", "confirmation_code": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/auth/token",
            None,
            Some(json!({"username": "newcomer", "confirmation_code": code})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.request("GET", "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "newcomer");
}

#[tokio::test]
async fn unknown_username_on_token_exchange_is_not_found() {
    let app = spawn_app().await;
    let (status, _) = app
        .request(
            "POST",
            "/api/v1/auth/token",
            None,
            Some(json!({"username": "ghost", "confirmation_code": "whatever"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_writes_are_admin_gated() {
    let app = spawn_app().await;
    let (_, user_token) = app.seed_user("plain", Role::User).await;
    let (_, admin_token) = app.seed_user("boss", Role::Admin).await;
    let payload = json!({"name": "Books", "slug": "books"});

    let (status, _) = app
        .request("POST", "/api/v1/categories", Some(&user_token), Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request("POST", "/api/v1/categories", Some(&admin_token), Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Duplicate slug maps to a validation failure.
    let (status, _) = app
        .request("POST", "/api/v1/categories", Some(&admin_token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_update_cannot_escalate_role() {
    let app = spawn_app().await;
    let (_, token) = app.seed_user("climber", Role::User).await;

    // The role field is not part of the profile surface; it is ignored.
    let (status, body) = app
        .request(
            "PATCH",
            "/api/v1/users/me",
            Some(&token),
            Some(json!({"bio": "aspiring admin", "role": "admin"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "aspiring admin");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn user_management_requires_admin() {
    let app = spawn_app().await;
    let (_, moderator_token) = app.seed_user("moderator", Role::Moderator).await;
    let (_, admin_token) = app.seed_user("boss", Role::Admin).await;

    let (status, _) = app
        .request("GET", "/api/v1/users", Some(&moderator_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.request("GET", "/api/v1/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    // Role changes go through the admin surface.
    let (status, body) = app
        .request(
            "PATCH",
            "/api/v1/users/moderator",
            Some(&admin_token),
            Some(json!({"role": "user"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn invalid_bearer_tokens_are_rejected_outright() {
    let app = spawn_app().await;
    let (status, _) = app
        .request("GET", "/api/v1/users/me", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_database_connectivity() {
    let app = spawn_app().await;
    let (status, body) = app.request("GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"]["connected"], true);
}
