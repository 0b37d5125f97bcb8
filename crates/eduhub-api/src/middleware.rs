use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use eduhub_types::api::Claims;
use eduhub_types::models::Role;

use crate::AppState;

/// The authenticated caller, injected into request extensions by
/// [`require_auth`]. Handlers take it as `Extension<Session>`.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Session {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), StatusCode> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(StatusCode::FORBIDDEN)
        }
    }
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Decode the bearer token, if any. `None` covers missing, malformed and
/// expired tokens alike.
pub fn session_from_headers(headers: &HeaderMap, jwt_secret: &str) -> Option<Session> {
    let bearer = headers.typed_get::<Authorization<Bearer>>()?;
    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;
    Some(token_data.claims.into())
}

/// Extract and validate JWT from Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let session =
        session_from_headers(req.headers(), &state.jwt_secret).ok_or(StatusCode::UNAUTHORIZED)?;
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
