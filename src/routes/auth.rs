use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth::BearerToken, error::ApiError, services::identity::AuthTokens, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(sign_up))
        .route("/signin", post(sign_in))
        .route("/signout", post(sign_out))
}

#[derive(Debug, Default, Deserialize)]
struct Credentials {
    email: Option<String>,
    password: Option<String>,
}

impl Credentials {
    fn require(self) -> Result<(String, String), ApiError> {
        match (self.email, self.password) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(ApiError::missing_fields("email and password are required")),
        }
    }
}

async fn sign_up(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<Credentials>, ApiError>,
) -> Result<(StatusCode, Json<AuthTokens>), ApiError> {
    let (email, password) = payload.require()?;
    let tokens = state.identity.sign_up(&email, &password).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

async fn sign_in(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<Credentials>, ApiError>,
) -> Result<Json<AuthTokens>, ApiError> {
    let (email, password) = payload.require()?;
    let tokens = state.identity.sign_in(&email, &password).await?;
    Ok(Json(tokens))
}

async fn sign_out(
    State(state): State<AppState>,
    bearer: BearerToken,
) -> Result<Json<Value>, ApiError> {
    state.identity.sign_out(bearer.token()).await?;
    Ok(Json(json!({ "message": "signed out" })))
}
