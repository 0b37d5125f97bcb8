use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use eduhub_db::IdeaFilter;
use eduhub_db::models::convert_all;
use tracing::debug;

use eduhub_types::api::DashboardResponse;
use eduhub_types::models::{IdeaStatus, Profile, Role};

use crate::auth::load_profile;
use crate::lectures::filter_by_grade;
use crate::middleware::session_from_headers;
use crate::{AppState, blocking};

/// GET /dashboard/{role}
///
/// No session sends the browser to `/auth`, a session without a profile to
/// `/`, and a profile of another role to its own dashboard.
pub async fn dashboard(
    State(state): State<AppState>,
    Path(role): Path<String>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    let requested: Role = role.parse().map_err(|_| StatusCode::NOT_FOUND)?;

    let Some(session) = session_from_headers(&headers, &state.jwt_secret) else {
        debug!("Dashboard {} requested without a session", requested);
        return Ok(Redirect::to("/auth").into_response());
    };

    let Some(profile) = load_profile(&state, session.user_id).await? else {
        debug!("Session {} has no profile, redirecting home", session.user_id);
        return Ok(Redirect::to("/").into_response());
    };

    if profile.role != requested {
        return Ok(Redirect::to(&format!("/dashboard/{}", profile.role)).into_response());
    }

    let body = match profile.role {
        Role::Student => student_dashboard(&state, profile).await?,
        Role::Professor => professor_dashboard(&state, profile).await?,
        Role::Ngo => ngo_dashboard(&state, profile).await?,
    };

    Ok(Json(body).into_response())
}

async fn student_dashboard(
    state: &AppState,
    profile: Profile,
) -> Result<DashboardResponse, StatusCode> {
    let id = profile.id.to_string();
    let (lectures, ideas, results, challenges) = blocking(state, move |db| {
        let lectures = convert_all(db.list_lectures()?, |r| r.into_lecture())?;
        let ideas = convert_all(
            db.list_ideas(&IdeaFilter { author_id: Some(id.clone()), ..Default::default() })?,
            |r| r.into_idea(),
        )?;
        let results = convert_all(db.list_results(Some(&id))?, |r| r.into_result())?;
        let challenges = convert_all(db.list_challenges(None)?, |r| r.into_challenge())?;
        Ok((lectures, ideas, results, challenges))
    })
    .await?;

    let lectures = match profile.grade.as_deref() {
        Some(grade) => filter_by_grade(lectures, grade),
        None => lectures,
    };
    let now = chrono::Utc::now();
    let open_challenges = challenges.into_iter().filter(|c| c.is_open(now)).collect();

    Ok(DashboardResponse::Student {
        profile,
        lectures,
        ideas,
        results,
        open_challenges,
    })
}

async fn professor_dashboard(
    state: &AppState,
    profile: Profile,
) -> Result<DashboardResponse, StatusCode> {
    let id = profile.id.to_string();
    let (lectures, pending_ideas) = blocking(state, move |db| {
        let lectures = convert_all(db.list_lectures_by_author(&id)?, |r| r.into_lecture())?;
        let pending = convert_all(db.list_ideas(&pending_filter())?, |r| r.into_idea())?;
        Ok((lectures, pending))
    })
    .await?;

    Ok(DashboardResponse::Professor {
        profile,
        lectures,
        pending_ideas,
    })
}

async fn ngo_dashboard(
    state: &AppState,
    profile: Profile,
) -> Result<DashboardResponse, StatusCode> {
    let id = profile.id.to_string();
    let (challenges, pending_ideas) = blocking(state, move |db| {
        let challenges = convert_all(db.list_challenges(Some(&id))?, |r| r.into_challenge())?;
        let pending = convert_all(db.list_ideas(&pending_filter())?, |r| r.into_idea())?;
        Ok((challenges, pending))
    })
    .await?;

    Ok(DashboardResponse::Ngo {
        profile,
        challenges,
        pending_ideas,
    })
}

fn pending_filter() -> IdeaFilter {
    IdeaFilter {
        status: Some(IdeaStatus::Pending),
        ..Default::default()
    }
}
