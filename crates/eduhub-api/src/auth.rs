use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};
use uuid::Uuid;

use eduhub_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use eduhub_types::models::{Profile, Role};

use crate::middleware::Session;
use crate::{AppState, blocking};

const TOKEN_LIFETIME_DAYS: i64 = 30;

fn valid_email(email: &str) -> bool {
    (3..=254).contains(&email.len())
        && email.contains('@')
        && !email.starts_with('@')
        && !email.ends_with('@')
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    // Validate input
    let email = req.email.trim().to_lowercase();
    if !valid_email(&email) {
        return Err(StatusCode::BAD_REQUEST);
    }
    if req.password.len() < 8 {
        return Err(StatusCode::BAD_REQUEST);
    }
    let full_name = req.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    // Hash password with Argon2id
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("Password hashing failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let profile = Profile {
        id: Uuid::new_v4(),
        email,
        full_name,
        role: req.role,
        grade: blank_to_none(req.grade),
        center: blank_to_none(req.center),
        created_at: chrono::Utc::now(),
    };

    // The insert itself refuses a taken email
    let stored = profile.clone();
    let created = blocking(&state, move |db| db.create_profile(&stored, &password_hash)).await?;
    if !created {
        return Err(StatusCode::CONFLICT);
    }

    let token = create_token(&state.jwt_secret, profile.id, &profile.email, profile.role)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    info!("Registered {} as {}", profile.email, profile.role);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: profile.id,
            token,
            profile,
        }),
    ))
}

/// Wrong credentials are a plain 401; no stand-in identity is ever minted.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let email = req.email.trim().to_lowercase();
    let row = blocking(&state, move |db| db.get_profile_by_email(&email))
        .await?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // Verify password
    let stored_hash = row.password.clone();
    let password = req.password;
    tokio::task::spawn_blocking(move || {
        let parsed_hash =
            PasswordHash::new(&stored_hash).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| StatusCode::UNAUTHORIZED)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    let profile = row.into_profile().map_err(|e| {
        error!("Corrupt profile row: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let token = create_token(&state.jwt_secret, profile.id, &profile.email, profile.role)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(LoginResponse {
        user_id: profile.id,
        token,
        profile,
    }))
}

/// GET /me: the caller's profile.
pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, StatusCode> {
    let profile = load_profile(&state, session.user_id).await?.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(profile))
}

pub(crate) async fn load_profile(
    state: &AppState,
    user_id: Uuid,
) -> Result<Option<Profile>, StatusCode> {
    let id = user_id.to_string();
    blocking(state, move |db| {
        db.get_profile_by_id(&id)?.map(|row| row.into_profile()).transpose()
    })
    .await
}

pub fn create_token(
    secret: &str,
    user_id: Uuid,
    email: &str,
    role: Role,
) -> anyhow::Result<String> {
    let expires = chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS);
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        exp: expires.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestApp, test_app};
    use axum::http::Method;
    use serde_json::json;

    async fn register_student(app: &TestApp, password: &str) -> (StatusCode, serde_json::Value) {
        let (status, body, _) = app
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "email": "Lina@Example.org",
                    "password": password,
                    "full_name": "Lina",
                    "role": "student",
                    "grade": "6",
                })),
            )
            .await;
        (status, body)
    }

    #[tokio::test]
    async fn register_then_login() {
        let app = test_app();
        let (status, body) = register_student(&app, "correct horse").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["profile"]["email"], "lina@example.org");
        assert_eq!(body["profile"]["role"], "student");

        let (status, body, _) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "lina@example.org", "password": "correct horse" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, me, _) = app.send(Method::GET, "/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["grade"], "6");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected_without_fallback_identity() {
        let app = test_app();
        register_student(&app, "correct horse").await;

        let (status, body, _) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "lina@example.org", "password": "wrong horse" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.get("token").is_none());

        let (status, _, _) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "ghost@example.org", "password": "whatever1" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_email_and_short_password() {
        let app = test_app();
        assert_eq!(register_student(&app, "short").await.0, StatusCode::BAD_REQUEST);
        assert_eq!(register_student(&app, "long enough").await.0, StatusCode::CREATED);
        assert_eq!(register_student(&app, "long enough").await.0, StatusCode::CONFLICT);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_registrations_with_one_email_conflict_cleanly() {
        let app = test_app();
        let (first, second) = tokio::join!(
            register_student(&app, "long enough"),
            register_student(&app, "long enough"),
        );
        let mut statuses = vec![first.0, second.0];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let app = test_app();
        let (status, _, _) = app.send(Method::GET, "/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _, _) = app.send(Method::GET, "/lectures", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn email_shape() {
        assert!(valid_email("a@b"));
        assert!(!valid_email("plainaddress"));
        assert!(!valid_email("@example.org"));
    }
}
