use chrono::{NaiveDate, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    db::DbPool,
    error::ApiError,
    models::trip::{NewTrip, Trip, TripPatch, TripStatus},
    services::guard::{AccessRight, AuthGuard},
};

#[derive(Clone)]
pub struct TripService {
    db: DbPool,
    guard: AuthGuard,
}

impl TripService {
    pub fn new(db: DbPool, guard: AuthGuard) -> Self {
        Self { db, guard }
    }

    pub async fn create_trip(
        &self,
        caller: &AuthenticatedUser,
        payload: NewTrip,
    ) -> Result<Trip, ApiError> {
        let name = payload
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let (name, start_date, end_date) = match (name, payload.start_date, payload.end_date) {
            (Some(name), Some(start), Some(end)) => (name.to_string(), start, end),
            _ => {
                return Err(ApiError::missing_fields(
                    "name, start_date and end_date are required",
                ))
            }
        };
        validate_date_range(start_date, end_date)?;
        validate_budget(payload.budget)?;

        let now = Utc::now();
        let trip = Trip {
            id: Uuid::new_v4().to_string(),
            owner_id: caller.id.clone(),
            name,
            description: payload.description,
            start_date,
            end_date,
            cover_photo: payload.cover_photo,
            budget: payload.budget,
            status: TripStatus::Planning,
            destination: payload.destination,
            adults: payload.adults,
            kids: payload.kids,
            preferences: Json(payload.preferences.unwrap_or_default()),
            created_at: now,
            updated_at: now,
        };
        self.insert_trip(&trip).await?;
        Ok(trip)
    }

    pub async fn update_trip(
        &self,
        caller: &AuthenticatedUser,
        trip_id: &str,
        patch: TripPatch,
    ) -> Result<Trip, ApiError> {
        let mut trip = self
            .guard
            .authorize_trip(caller, trip_id, AccessRight::Write)
            .await?;

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ApiError::missing_fields("name must not be empty"));
            }
            trip.name = name;
        }
        if let Some(description) = patch.description {
            trip.description = Some(description);
        }
        if let Some(start_date) = patch.start_date {
            trip.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            trip.end_date = end_date;
        }
        if let Some(cover_photo) = patch.cover_photo {
            trip.cover_photo = Some(cover_photo);
        }
        if let Some(budget) = patch.budget {
            validate_budget(Some(budget))?;
            trip.budget = Some(budget);
        }
        if let Some(status) = patch.status {
            trip.status = status;
        }
        if let Some(destination) = patch.destination {
            trip.destination = Some(destination);
        }
        if let Some(adults) = patch.adults {
            trip.adults = Some(adults);
        }
        if let Some(kids) = patch.kids {
            trip.kids = Some(kids);
        }
        if let Some(preferences) = patch.preferences {
            trip.preferences = Json(preferences);
        }

        // The range invariant must hold for the merged record, not only
        // when both dates arrive in the same request.
        validate_date_range(trip.start_date, trip.end_date)?;
        trip.updated_at = Utc::now();

        sqlx::query(
            "UPDATE trips SET name = ?, description = ?, start_date = ?, end_date = ?,
                              cover_photo = ?, budget = ?, status = ?, destination = ?,
                              adults = ?, kids = ?, preferences = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&trip.name)
        .bind(&trip.description)
        .bind(trip.start_date)
        .bind(trip.end_date)
        .bind(&trip.cover_photo)
        .bind(trip.budget)
        .bind(trip.status)
        .bind(&trip.destination)
        .bind(trip.adults)
        .bind(trip.kids)
        .bind(&trip.preferences)
        .bind(trip.updated_at)
        .bind(&trip.id)
        .execute(&self.db)
        .await?;

        Ok(trip)
    }

    pub async fn delete_trip(
        &self,
        caller: &AuthenticatedUser,
        trip_id: &str,
    ) -> Result<(), ApiError> {
        let trip = self
            .guard
            .authorize_trip(caller, trip_id, AccessRight::Write)
            .await?;

        // Itinerary rows go with the trip via the foreign-key cascades.
        sqlx::query("DELETE FROM trips WHERE id = ?")
            .bind(&trip.id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn list_trips(
        &self,
        caller: &AuthenticatedUser,
        status: Option<TripStatus>,
    ) -> Result<Vec<Trip>, ApiError> {
        let trips = match status {
            Some(status) => {
                sqlx::query_as(
                    "SELECT * FROM trips WHERE owner_id = ? AND status = ?
                     ORDER BY created_at DESC",
                )
                .bind(&caller.id)
                .bind(status)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM trips WHERE owner_id = ? ORDER BY created_at DESC")
                    .bind(&caller.id)
                    .fetch_all(&self.db)
                    .await?
            }
        };
        Ok(trips)
    }

    pub async fn get_trip(
        &self,
        caller: &AuthenticatedUser,
        trip_id: &str,
    ) -> Result<Trip, ApiError> {
        self.guard
            .authorize_trip(caller, trip_id, AccessRight::Read)
            .await
    }

    async fn insert_trip(&self, trip: &Trip) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO trips (id, owner_id, name, description, start_date, end_date,
                                cover_photo, budget, status, destination, adults, kids,
                                preferences, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&trip.id)
        .bind(&trip.owner_id)
        .bind(&trip.name)
        .bind(&trip.description)
        .bind(trip.start_date)
        .bind(trip.end_date)
        .bind(&trip.cover_photo)
        .bind(trip.budget)
        .bind(trip.status)
        .bind(&trip.destination)
        .bind(trip.adults)
        .bind(trip.kids)
        .bind(&trip.preferences)
        .bind(trip.created_at)
        .bind(trip.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
    if end < start {
        return Err(ApiError::invalid_date_range());
    }
    Ok(())
}

fn validate_budget(budget: Option<f64>) -> Result<(), ApiError> {
    match budget {
        Some(value) if value < 0.0 => Err(ApiError::invalid_budget()),
        _ => Ok(()),
    }
}
