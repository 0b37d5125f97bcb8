//! Router harness for handler tests: in-memory DB, seeded users, and a
//! `send` helper driving the router with `oneshot`.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use futures_util::future::BoxFuture;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use eduhub_ai::{ChatBackend, CompletionRequest, UnconfiguredBackend};
use eduhub_db::Database;
use eduhub_gateway::dispatcher::Dispatcher;
use eduhub_types::models::{Profile, Role};

use crate::auth::create_token;
use crate::routes::router;
use crate::{AppState, AppStateInner};

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_MAP_TEMPLATE: &str = "https://maps.example.com/embed?q={lat},{lng}";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// App whose AI endpoint is unconfigured, so every mini-app falls back.
pub fn test_app() -> TestApp {
    test_app_with_ai(Arc::new(UnconfiguredBackend))
}

pub fn test_app_with_ai(ai: Arc<dyn ChatBackend>) -> TestApp {
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: TEST_SECRET.to_string(),
        dispatcher: Dispatcher::new(),
        ai,
        map_url_template: TEST_MAP_TEMPLATE.to_string(),
    });
    TestApp { router: router(state.clone()), state }
}

impl TestApp {
    /// Insert a profile directly (skipping Argon2) and mint its token.
    pub fn seed_user(&self, role: Role, grade: Option<&str>) -> (Profile, String) {
        let id = Uuid::new_v4();
        let profile = Profile {
            id,
            email: format!("{}@example.org", id),
            full_name: format!("Test {}", role),
            role,
            grade: grade.map(str::to_string),
            center: None,
            created_at: chrono::Utc::now(),
        };
        assert!(self.state.db.create_profile(&profile, "not-a-real-hash").unwrap());
        let token = create_token(TEST_SECRET, profile.id, &profile.email, role).unwrap();
        (profile, token)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value, HeaderMap) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let res = self.router.clone().oneshot(request).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json, headers)
    }
}

/// Backend that always answers with the same text.
pub struct FixedReply(pub String);

impl ChatBackend for FixedReply {
    fn complete(&self, _request: CompletionRequest) -> BoxFuture<'_, eduhub_ai::AiResult<String>> {
        let reply = self.0.clone();
        Box::pin(async move { Ok(reply) })
    }
}
