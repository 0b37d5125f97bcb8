use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use eduhub_db::models::convert_all;
use eduhub_types::api::CreateChallengeRequest;
use eduhub_types::events::GatewayEvent;
use eduhub_types::models::{Challenge, Role};

use crate::middleware::Session;
use crate::{AppState, blocking};

#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    /// `true` keeps only challenges whose deadline has not passed.
    #[serde(default)]
    pub open: bool,
}

pub async fn list_challenges(
    State(state): State<AppState>,
    Query(query): Query<ChallengeQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let mut challenges = blocking(&state, |db| {
        convert_all(db.list_challenges(None)?, |r| r.into_challenge())
    })
    .await?;
    if query.open {
        let now = chrono::Utc::now();
        challenges.retain(|c| c.is_open(now));
    }
    Ok(Json(challenges))
}

pub async fn get_challenge(
    State(state): State<AppState>,
    Path(challenge_id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    let id = challenge_id.to_string();
    let challenge = blocking(&state, move |db| {
        db.get_challenge(&id)?.map(|r| r.into_challenge()).transpose()
    })
    .await?
    .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(challenge))
}

pub async fn create_challenge(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateChallengeRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    session.require_role(&[Role::Ngo])?;

    let title = req.title.trim().to_string();
    let now = chrono::Utc::now();
    if title.is_empty() || req.deadline <= now {
        return Err(StatusCode::BAD_REQUEST);
    }

    let challenge = Challenge {
        id: Uuid::new_v4(),
        title,
        description: req.description.trim().to_string(),
        ngo_id: session.user_id,
        deadline: req.deadline,
        created_at: now,
    };

    let stored = challenge.clone();
    blocking(&state, move |db| db.insert_challenge(&stored)).await?;

    info!(
        "Challenge '{}' posted by {}, closes {}",
        challenge.title, session.email, challenge.deadline
    );
    state.dispatcher.broadcast(GatewayEvent::ChallengePosted {
        challenge: challenge.clone(),
    });

    Ok((StatusCode::CREATED, Json(challenge)))
}
