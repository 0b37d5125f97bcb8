//! AI mini-app endpoints. Every generator answers 200 even when the model is
//! unreachable; the body's `fallback` flag says so and the caller also gets an
//! error toast over the gateway.

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::debug;

use eduhub_ai::{quiz, review, story, summary, tutor};
use eduhub_db::models::convert_all;
use eduhub_types::api::{
    BattleRequest, ChatRole, Generated, QuizRequest, StoryRequest, SummarizeRequest, TutorRequest,
};
use eduhub_types::events::Notification;
use eduhub_types::models::Role;

use crate::auth::load_profile;
use crate::middleware::Session;
use crate::{AppState, blocking};

async fn respond<T: Serialize>(
    state: &AppState,
    session: &Session,
    generated: Generated<T>,
) -> Json<Generated<T>> {
    if let Some(notice) = &generated.notice {
        debug!("Serving fallback content to {}", session.email);
        state.dispatcher.notify(session.user_id, Notification::error(notice.clone())).await;
    }
    Json(generated)
}

fn non_blank(value: &str) -> Result<&str, StatusCode> {
    let value = value.trim();
    if value.is_empty() { Err(StatusCode::BAD_REQUEST) } else { Ok(value) }
}

pub async fn tutor(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<TutorRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    match req.messages.last() {
        Some(turn) if turn.role == ChatRole::User && !turn.content.trim().is_empty() => {}
        _ => return Err(StatusCode::BAD_REQUEST),
    }

    let grade = load_profile(&state, session.user_id).await?.and_then(|p| p.grade);
    let reply = tutor::tutor_reply(state.ai.as_ref(), grade.as_deref(), &req.messages).await;
    Ok(respond(&state, &session, reply).await)
}

pub async fn summarize(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<SummarizeRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let summary = summary::summarize(state.ai.as_ref(), &req.transcript).await;
    Ok(respond(&state, &session, summary).await)
}

pub async fn story(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<StoryRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let topic = non_blank(&req.topic)?;
    let grade = match req.grade {
        Some(grade) => Some(grade),
        None => load_profile(&state, session.user_id).await?.and_then(|p| p.grade),
    };
    let story = story::generate_story(state.ai.as_ref(), topic, grade.as_deref()).await;
    Ok(respond(&state, &session, story).await)
}

pub async fn quiz(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<QuizRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let topic = non_blank(&req.topic)?;
    let questions = quiz::generate_quiz(state.ai.as_ref(), topic).await;
    Ok(respond(&state, &session, questions).await)
}

/// Score a two-player battle over questions the client already holds.
pub async fn battle(Json(req): Json<BattleRequest>) -> Result<impl IntoResponse, StatusCode> {
    let well_formed = !req.questions.is_empty()
        && req.questions.iter().all(|q| q.answer_index < q.options.len())
        && req.player_one.len() <= req.questions.len()
        && req.player_two.len() <= req.questions.len();
    if !well_formed {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(quiz::score_battle(&req.questions, &req.player_one, &req.player_two)))
}

/// Review of the caller's own quiz history.
pub async fn review(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, StatusCode> {
    session.require_role(&[Role::Student])?;

    let id = session.user_id.to_string();
    let results = blocking(&state, move |db| {
        convert_all(db.list_results(Some(&id))?, |r| r.into_result())
    })
    .await?;
    let review = review::performance_review(state.ai.as_ref(), &results).await;
    Ok(respond(&state, &session, review).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedReply, test_app, test_app_with_ai};
    use axum::http::Method;
    use eduhub_types::events::GatewayEvent;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn unconfigured_quiz_falls_back_and_toasts() {
        let app = test_app();
        let (student, token) = app.seed_user(Role::Student, Some("6"));
        let (_, mut inbox) = app.state.dispatcher.register_user_channel(student.id).await;

        let topic = json!({ "topic": "Photosynthesis" });
        let (status, body, _) = app.send(Method::POST, "/ai/quiz", Some(&token), Some(topic)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fallback"], true);
        let questions = body["value"].as_array().unwrap();
        assert_eq!(questions.len(), 5);
        for q in questions {
            assert!(q["question"].as_str().unwrap().contains("Photosynthesis"));
        }

        match inbox.try_recv().unwrap() {
            GatewayEvent::Notification(n) => {
                assert_eq!(n, Notification::error(body["notice"].as_str().unwrap()))
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn configured_tutor_answers_without_notice() {
        let reply = FixedReply("Let's count the apples together.".to_string());
        let app = test_app_with_ai(Arc::new(reply));
        let (student, token) = app.seed_user(Role::Student, Some("2"));
        let (_, mut inbox) = app.state.dispatcher.register_user_channel(student.id).await;

        let (status, body, _) = app
            .send(
                Method::POST,
                "/ai/tutor",
                Some(&token),
                Some(json!({ "messages": [{ "role": "user", "content": "What is 3 + 4?" }] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fallback"], false);
        assert_eq!(body["value"], "Let's count the apples together.");
        assert!(body.get("notice").is_none());
        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn tutor_needs_a_trailing_user_turn() {
        let app = test_app();
        let (_, token) = app.seed_user(Role::Student, None);
        for messages in [json!([]), json!([{ "role": "assistant", "content": "Hi!" }])] {
            let body = json!({ "messages": messages });
            let (status, _, _) =
                app.send(Method::POST, "/ai/tutor", Some(&token), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn story_and_summary_fall_back() {
        let app = test_app();
        let (_, token) = app.seed_user(Role::Professor, None);

        let topic = json!({ "topic": "the water cycle" });
        let (status, body, _) =
            app.send(Method::POST, "/ai/story", Some(&token), Some(topic)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fallback"], true);
        assert!(body["value"].as_str().unwrap().contains("the water cycle"));

        let blank = json!({ "topic": "" });
        let (status, _, _) = app.send(Method::POST, "/ai/story", Some(&token), Some(blank)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body, _) = app
            .send(
                Method::POST,
                "/ai/summarize",
                Some(&token),
                Some(json!({
                    "transcript": "Plants need light. They make sugar. Roots drink water. \
                                   Leaves breathe."
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], "Plants need light. They make sugar. Roots drink water.");
    }

    #[tokio::test]
    async fn battle_is_scored() {
        let app = test_app();
        let (_, token) = app.seed_user(Role::Student, None);
        let questions = serde_json::to_value(eduhub_ai::quiz::fallback_quiz("Rivers")).unwrap();
        let key: Vec<usize> =
            eduhub_ai::quiz::fallback_quiz("Rivers").iter().map(|q| q.answer_index).collect();

        let (status, body, _) = app
            .send(
                Method::POST,
                "/ai/quiz/battle",
                Some(&token),
                Some(json!({ "questions": questions, "player_one": key, "player_two": [] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["player_one_score"], 5);
        assert_eq!(body["player_two_score"], 0);
        assert_eq!(body["winner"], "player_one");

        let (status, _, _) = app
            .send(
                Method::POST,
                "/ai/quiz/battle",
                Some(&token),
                Some(json!({ "questions": [], "player_one": [], "player_two": [] })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn review_covers_own_results_only() {
        let app = test_app();
        let (_, token) = app.seed_user(Role::Student, None);
        let (_, professor) = app.seed_user(Role::Professor, None);

        let (status, body, _) = app.send(Method::POST, "/ai/review", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], eduhub_ai::review::NO_RESULTS);

        let result = json!({ "topic": "Maps", "score": 3, "total": 4 });
        app.send(Method::POST, "/results", Some(&token), Some(result)).await;
        let (_, body, _) = app.send(Method::POST, "/ai/review", Some(&token), None).await;
        assert_eq!(body["fallback"], true);
        assert!(body["value"].as_str().unwrap().starts_with("Average score 75%"));

        let (status, _, _) = app.send(Method::POST, "/ai/review", Some(&professor), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
