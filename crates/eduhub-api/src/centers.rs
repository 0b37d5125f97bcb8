use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use eduhub_db::models::convert_all;
use eduhub_types::api::{CenterResponse, MapEmbedResponse};

use crate::{AppState, blocking};

/// Fill the `{lat}` and `{lng}` placeholders of a map embed template.
pub fn map_embed_url(template: &str, latitude: f64, longitude: f64) -> String {
    template
        .replace("{lat}", &latitude.to_string())
        .replace("{lng}", &longitude.to_string())
}

pub async fn list_centers(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let centers =
        blocking(&state, |db| convert_all(db.list_centers()?, |r| r.into_center())).await?;
    let centers: Vec<CenterResponse> = centers
        .into_iter()
        .map(|center| CenterResponse {
            map_url: map_embed_url(&state.map_url_template, center.latitude, center.longitude),
            center,
        })
        .collect();
    Ok(Json(centers))
}

pub async fn center_map(
    State(state): State<AppState>,
    Path(center_id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    let id = center_id.to_string();
    let center =
        blocking(&state, move |db| db.get_center(&id)?.map(|r| r.into_center()).transpose())
            .await?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(MapEmbedResponse {
        map_url: map_embed_url(&state.map_url_template, center.latitude, center.longitude),
    }))
}
