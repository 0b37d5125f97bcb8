use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use eduhub_db::IdeaFilter;
use eduhub_db::models::convert_all;
use eduhub_types::api::{CreateIdeaRequest, UpdateIdeaStatusRequest};
use eduhub_types::events::{GatewayEvent, Notification};
use eduhub_types::models::{Idea, IdeaStatus, Role};

use crate::auth::load_profile;
use crate::middleware::Session;
use crate::{AppState, blocking};

#[derive(Debug, Deserialize)]
pub struct IdeaQuery {
    pub status: Option<IdeaStatus>,
    pub challenge_id: Option<Uuid>,
}

pub async fn list_ideas(
    State(state): State<AppState>,
    Query(query): Query<IdeaQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let filter = IdeaFilter {
        status: query.status,
        challenge_id: query.challenge_id.map(|id| id.to_string()),
        author_id: None,
    };
    let ideas =
        blocking(&state, move |db| convert_all(db.list_ideas(&filter)?, |r| r.into_idea())).await?;
    Ok(Json(ideas))
}

enum Draft {
    Created(Idea),
    Replayed(Idea),
    Taken,
}

/// POST /ideas
///
/// A `draft_id` doubles as the idea id, so a draft replayed after a dropped
/// response answers 200 with the stored idea instead of posting it twice.
pub async fn create_idea(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateIdeaRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    session.require_role(&[Role::Student])?;

    let title = req.title.trim().to_string();
    let description = req.description.trim().to_string();
    if title.is_empty() || description.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    // A replay is answered from the stored idea, even if its challenge closed since
    if let Some(draft_id) = req.draft_id {
        if let Some(draft) = lookup_draft(&state, draft_id, session.user_id).await? {
            return answer(&state, &session, draft);
        }
    }

    if let Some(challenge_id) = req.challenge_id {
        let id = challenge_id.to_string();
        let challenge = blocking(&state, move |db| {
            db.get_challenge(&id)?.map(|r| r.into_challenge()).transpose()
        })
        .await?
        .ok_or(StatusCode::NOT_FOUND)?;
        if !challenge.is_open(chrono::Utc::now()) {
            debug!("Idea for closed challenge {} refused", challenge.id);
            return Err(StatusCode::CONFLICT);
        }
    }

    let profile = load_profile(&state, session.user_id)
        .await?
        .ok_or(StatusCode::NOT_FOUND)?;

    let idea = Idea {
        id: req.draft_id.unwrap_or_else(Uuid::new_v4),
        title,
        description,
        author_id: profile.id,
        author_name: profile.full_name,
        challenge_id: req.challenge_id,
        status: IdeaStatus::Pending,
        created_at: chrono::Utc::now(),
    };

    let stored = idea.clone();
    let draft = if blocking(&state, move |db| db.insert_idea(&stored)).await? {
        Draft::Created(idea)
    } else {
        // Lost a race with a concurrent replay of the same draft
        lookup_draft(&state, idea.id, session.user_id)
            .await?
            .unwrap_or(Draft::Taken)
    };

    answer(&state, &session, draft)
}

fn answer(
    state: &AppState,
    session: &Session,
    draft: Draft,
) -> Result<(StatusCode, Json<Idea>), StatusCode> {
    match draft {
        Draft::Created(idea) => {
            info!("Idea '{}' posted by {}", idea.title, session.email);
            state.dispatcher.broadcast(GatewayEvent::IdeaCreated { idea: idea.clone() });
            Ok((StatusCode::CREATED, Json(idea)))
        }
        Draft::Replayed(idea) => {
            debug!("Draft {} already posted, replaying", idea.id);
            Ok((StatusCode::OK, Json(idea)))
        }
        Draft::Taken => {
            warn!("Draft id collision from {}", session.email);
            Err(StatusCode::CONFLICT)
        }
    }
}

async fn lookup_draft(
    state: &AppState,
    draft_id: Uuid,
    author: Uuid,
) -> Result<Option<Draft>, StatusCode> {
    let id = draft_id.to_string();
    let existing = blocking(state, move |db| db.get_idea(&id)?.map(|r| r.into_idea()).transpose())
        .await?;
    Ok(existing.map(|idea| {
        if idea.author_id == author {
            Draft::Replayed(idea)
        } else {
            Draft::Taken
        }
    }))
}

/// PATCH /ideas/{idea_id}/status: approve or reject a pending idea.
pub async fn update_idea_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(idea_id): Path<Uuid>,
    Json(req): Json<UpdateIdeaStatusRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    session.require_role(&[Role::Professor, Role::Ngo])?;

    let id = idea_id.to_string();
    let current = blocking(&state, move |db| db.get_idea(&id)?.map(|r| r.into_idea()).transpose())
        .await?
        .ok_or(StatusCode::NOT_FOUND)?;

    if !current.status.can_transition_to(req.status) {
        return Err(StatusCode::CONFLICT);
    }

    let id = idea_id.to_string();
    let (from, to) = (current.status, req.status);
    let updated = blocking(&state, move |db| {
        if !db.update_idea_status(&id, from, to)? {
            return Ok(None);
        }
        db.get_idea(&id)?.map(|r| r.into_idea()).transpose()
    })
    .await?
    // Someone else reviewed it between the read and the write
    .ok_or(StatusCode::CONFLICT)?;

    info!("Idea {} marked {} by {}", updated.id, updated.status, session.email);

    state.dispatcher.broadcast(GatewayEvent::IdeaStatusChanged {
        idea_id: updated.id,
        author_id: updated.author_id,
        status: updated.status,
    });
    let message = format!("Your idea \"{}\" was {}", updated.title, updated.status);
    let notification = match updated.status {
        IdeaStatus::Approved => Notification::success(message),
        _ => Notification::info(message),
    };
    state.dispatcher.notify(updated.author_id, notification).await;

    Ok(Json(updated))
}
