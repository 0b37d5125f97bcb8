use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

use eduhub_db::models::convert_all;
use eduhub_types::api::RecordResultRequest;
use eduhub_types::models::{Role, TestResult};

use crate::middleware::Session;
use crate::{AppState, blocking};

/// Students see their own results, professors see everyone's.
pub async fn list_results(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, StatusCode> {
    let student_id = match session.role {
        Role::Student => Some(session.user_id.to_string()),
        Role::Professor => None,
        Role::Ngo => return Err(StatusCode::FORBIDDEN),
    };
    let results = blocking(&state, move |db| {
        convert_all(db.list_results(student_id.as_deref())?, |r| r.into_result())
    })
    .await?;
    Ok(Json(results))
}

pub async fn record_result(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<RecordResultRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    session.require_role(&[Role::Student])?;

    let topic = req.topic.trim().to_string();
    if topic.is_empty() || req.total == 0 || req.score > req.total {
        return Err(StatusCode::BAD_REQUEST);
    }

    let result = TestResult {
        id: Uuid::new_v4(),
        student_id: session.user_id,
        topic,
        score: req.score,
        total: req.total,
        created_at: chrono::Utc::now(),
    };

    let stored = result.clone();
    blocking(&state, move |db| db.insert_result(&stored)).await?;

    info!("{} scored {}/{} on {}", session.email, result.score, result.total, result.topic);

    Ok((StatusCode::CREATED, Json(result)))
}
