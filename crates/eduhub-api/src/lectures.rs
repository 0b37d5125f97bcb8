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
use eduhub_types::api::CreateLectureRequest;
use eduhub_types::models::{Lecture, Role};

use crate::middleware::Session;
use crate::{AppState, blocking};

#[derive(Debug, Deserialize)]
pub struct LectureQuery {
    pub grade: Option<String>,
}

/// Keep lectures for `grade`, preserving their order.
pub fn filter_by_grade(lectures: Vec<Lecture>, grade: &str) -> Vec<Lecture> {
    let grade = grade.trim();
    lectures.into_iter().filter(|l| l.grade == grade).collect()
}

pub async fn list_lectures(
    State(state): State<AppState>,
    Query(query): Query<LectureQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let lectures =
        blocking(&state, |db| convert_all(db.list_lectures()?, |r| r.into_lecture())).await?;
    let lectures = match query.grade.as_deref().filter(|g| !g.trim().is_empty()) {
        Some(grade) => filter_by_grade(lectures, grade),
        None => lectures,
    };
    Ok(Json(lectures))
}

pub async fn get_lecture(
    State(state): State<AppState>,
    Path(lecture_id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    let id = lecture_id.to_string();
    let lecture =
        blocking(&state, move |db| db.get_lecture(&id)?.map(|r| r.into_lecture()).transpose())
            .await?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(lecture))
}

pub async fn create_lecture(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateLectureRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    session.require_role(&[Role::Professor])?;

    let title = req.title.trim().to_string();
    let grade = req.grade.trim().to_string();
    if title.is_empty() || grade.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let lecture = Lecture {
        id: Uuid::new_v4(),
        title,
        description: req.description.trim().to_string(),
        subject: req.subject.trim().to_string(),
        grade,
        video_url: req.video_url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
        author_id: session.user_id,
        created_at: chrono::Utc::now(),
    };

    let stored = lecture.clone();
    blocking(&state, move |db| db.insert_lecture(&stored)).await?;

    info!("Lecture '{}' for grade {} posted by {}", lecture.title, lecture.grade, session.email);

    Ok((StatusCode::CREATED, Json(lecture)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_app;
    use axum::http::Method;
    use serde_json::json;

    fn lecture(title: &str, grade: &str) -> Lecture {
        Lecture {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            subject: "math".to_string(),
            grade: grade.to_string(),
            video_url: None,
            author_id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn grade_filter_keeps_order() {
        let all = vec![lecture("a", "5"), lecture("b", "6"), lecture("c", "5"), lecture("d", "5")];
        let expected: Vec<Lecture> = all.iter().filter(|l| l.grade == "5").cloned().collect();
        let filtered = filter_by_grade(all, " 5 ");
        assert_eq!(filtered, expected);
        let titles: Vec<&str> = filtered.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "c", "d"]);
    }

    #[test]
    fn grade_filter_on_unknown_grade_is_empty() {
        assert!(filter_by_grade(vec![lecture("a", "5")], "12").is_empty());
    }

    #[tokio::test]
    async fn only_professors_post_lectures() {
        let app = test_app();
        let (_, student) = app.seed_user(Role::Student, Some("5"));
        let (_, professor) = app.seed_user(Role::Professor, None);
        let body = json!({
            "title": "Fractions",
            "grade": "5",
            "video_url": "https://video.example/1",
        });

        let (status, _, _) =
            app.send(Method::POST, "/lectures", Some(&student), Some(body.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, created, _) =
            app.send(Method::POST, "/lectures", Some(&professor), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["grade"], "5");

        let uri = format!("/lectures/{}", created["id"].as_str().unwrap());
        let (status, fetched, _) = app.send(Method::GET, &uri, Some(&student), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["title"], "Fractions");

        let blank = json!({ "title": " ", "grade": "5" });
        let (status, _, _) =
            app.send(Method::POST, "/lectures", Some(&professor), Some(blank)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_filters_by_query_grade() {
        let app = test_app();
        let (_, professor) = app.seed_user(Role::Professor, None);
        for (title, grade) in [("One", "3"), ("Two", "4"), ("Three", "3")] {
            let body = json!({ "title": title, "grade": grade });
            app.send(Method::POST, "/lectures", Some(&professor), Some(body)).await;
        }

        let (status, body, _) =
            app.send(Method::GET, "/lectures?grade=3", Some(&professor), None).await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> =
            body.as_array().unwrap().iter().map(|l| l["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["One", "Three"]);

        let (_, body, _) = app.send(Method::GET, "/lectures", Some(&professor), None).await;
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn missing_lecture_is_not_found() {
        let app = test_app();
        let (_, token) = app.seed_user(Role::Student, None);
        let uri = format!("/lectures/{}", Uuid::new_v4());
        let (status, _, _) = app.send(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
