use axum::{extract::State, routing::get, Json, Router};
use axum_extra::extract::WithRejection;

use crate::{
    auth::CurrentUser,
    error::ApiError,
    models::profile::{ProfilePatch, UserProfile},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}

async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.profiles.get_profile(&caller).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    WithRejection(Json(patch), _): WithRejection<Json<ProfilePatch>, ApiError>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.profiles.upsert_profile(&caller, patch).await?))
}
