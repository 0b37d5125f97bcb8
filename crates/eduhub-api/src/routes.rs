use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::middleware::require_auth;
use crate::{AppState, ai, auth, centers, challenges, dashboard, ideas, lectures, results};

/// Every REST route. The WebSocket gateway is mounted by the server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        // Dashboards redirect instead of answering 401, so they sit outside require_auth
        .route("/dashboard/{role}", get(dashboard::dashboard))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/me", get(auth::me))
        .route("/lectures", get(lectures::list_lectures).post(lectures::create_lecture))
        .route("/lectures/{lecture_id}", get(lectures::get_lecture))
        .route("/ideas", get(ideas::list_ideas).post(ideas::create_idea))
        .route("/ideas/{idea_id}/status", patch(ideas::update_idea_status))
        .route("/challenges", get(challenges::list_challenges).post(challenges::create_challenge))
        .route("/challenges/{challenge_id}", get(challenges::get_challenge))
        .route("/results", get(results::list_results).post(results::record_result))
        .route("/centers", get(centers::list_centers))
        .route("/centers/{center_id}/map", get(centers::center_map))
        .route("/ai/tutor", post(ai::tutor))
        .route("/ai/summarize", post(ai::summarize))
        .route("/ai/story", post(ai::story))
        .route("/ai/quiz", post(ai::quiz))
        .route("/ai/quiz/battle", post(ai::battle))
        .route("/ai/review", post(ai::review))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
