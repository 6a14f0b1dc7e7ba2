use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};

use crate::{
    auth::CurrentUser,
    error::ApiError,
    models::destination::{
        Destination, DestinationFilter, SaveDestinationRequest, SavedDestination,
        SavedDestinationEntry,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_destinations))
        .route("/saved", get(list_saved))
        .route("/:id", get(get_destination))
        .route("/:id/save", post(save_destination).delete(unsave_destination))
}

async fn list_destinations(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): WithRejection<Query<DestinationFilter>, ApiError>,
) -> Result<Json<Vec<Destination>>, ApiError> {
    Ok(Json(state.destinations.list_destinations(filter).await?))
}

async fn get_destination(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Destination>, ApiError> {
    Ok(Json(state.destinations.get_destination(&id).await?))
}

async fn save_destination(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    payload: Option<Json<SaveDestinationRequest>>,
) -> Result<(StatusCode, Json<SavedDestination>), ApiError> {
    let payload = payload.map(|Json(body)| body).unwrap_or_default();
    let saved = state
        .destinations
        .save_destination(&caller, &id, payload.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn unsave_destination(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.destinations.unsave_destination(&caller, &id).await?;
    Ok(Json(json!({ "message": "destination removed from saved list" })))
}

async fn list_saved(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<SavedDestinationEntry>>, ApiError> {
    Ok(Json(state.destinations.list_saved(&caller).await?))
}
