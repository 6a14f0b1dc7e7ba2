use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth::CurrentUser,
    error::ApiError,
    models::{
        itinerary::{
            ActivityPatch, NewActivity, NewTripDestination, TripActivity, TripDestination,
            TripDestinationEntry,
        },
        trip::{NewTrip, Trip, TripPatch, TripStatus},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trips).post(create_trip))
        .route("/:id", get(get_trip).put(update_trip).delete(delete_trip))
        .route(
            "/:id/destinations",
            get(list_trip_destinations).post(add_trip_destination),
        )
        .route("/:id/destinations/:link_id", delete(remove_trip_destination))
        .route("/:id/activities", get(list_activities).post(add_activity))
        .route(
            "/:id/activities/:activity_id",
            put(update_activity).delete(remove_activity),
        )
}

#[derive(Debug, Default, Deserialize)]
struct TripListQuery {
    status: Option<TripStatus>,
}

async fn list_trips(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    WithRejection(Query(query), _): WithRejection<Query<TripListQuery>, ApiError>,
) -> Result<Json<Vec<Trip>>, ApiError> {
    Ok(Json(state.trips.list_trips(&caller, query.status).await?))
}

async fn create_trip(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    WithRejection(Json(payload), _): WithRejection<Json<NewTrip>, ApiError>,
) -> Result<(StatusCode, Json<Trip>), ApiError> {
    let trip = state.trips.create_trip(&caller, payload).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn get_trip(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Trip>, ApiError> {
    Ok(Json(state.trips.get_trip(&caller, &id).await?))
}

async fn update_trip(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    WithRejection(Json(patch), _): WithRejection<Json<TripPatch>, ApiError>,
) -> Result<Json<Trip>, ApiError> {
    Ok(Json(state.trips.update_trip(&caller, &id, patch).await?))
}

async fn delete_trip(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.trips.delete_trip(&caller, &id).await?;
    Ok(Json(json!({ "message": "trip deleted" })))
}

async fn list_trip_destinations(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<TripDestinationEntry>>, ApiError> {
    Ok(Json(
        state.destinations.list_trip_destinations(&caller, &id).await?,
    ))
}

async fn add_trip_destination(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<NewTripDestination>, ApiError>,
) -> Result<(StatusCode, Json<TripDestination>), ApiError> {
    let link = state
        .destinations
        .add_destination_to_trip(&caller, &id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

async fn remove_trip_destination(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((id, link_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    state
        .destinations
        .remove_trip_destination(&caller, &id, &link_id)
        .await?;
    Ok(Json(json!({ "message": "destination removed from trip" })))
}

async fn list_activities(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<TripActivity>>, ApiError> {
    Ok(Json(state.activities.list_activities(&caller, &id).await?))
}

async fn add_activity(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<NewActivity>, ApiError>,
) -> Result<(StatusCode, Json<TripActivity>), ApiError> {
    let activity = state.activities.add_activity(&caller, &id, payload).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

async fn update_activity(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((id, activity_id)): Path<(String, String)>,
    WithRejection(Json(patch), _): WithRejection<Json<ActivityPatch>, ApiError>,
) -> Result<Json<TripActivity>, ApiError> {
    Ok(Json(
        state
            .activities
            .update_activity(&caller, &id, &activity_id, patch)
            .await?,
    ))
}

async fn remove_activity(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((id, activity_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    state
        .activities
        .remove_activity(&caller, &id, &activity_id)
        .await?;
    Ok(Json(json!({ "message": "activity removed" })))
}
