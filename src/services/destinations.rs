use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    db::DbPool,
    error::ApiError,
    models::{
        destination::{
            Destination, DestinationFilter, SavedDestination, SavedDestinationEntry,
        },
        itinerary::{NewTripDestination, TripDestination, TripDestinationEntry},
    },
    services::guard::{AccessRight, AuthGuard},
};

#[derive(Clone)]
pub struct DestinationService {
    db: DbPool,
    guard: AuthGuard,
}

impl DestinationService {
    pub fn new(db: DbPool, guard: AuthGuard) -> Self {
        Self { db, guard }
    }

    pub async fn list_destinations(
        &self,
        filter: DestinationFilter,
    ) -> Result<Vec<Destination>, ApiError> {
        let pattern = filter.search.map(|term| format!("%{}%", term.trim()));
        let destinations = sqlx::query_as(
            "SELECT * FROM destinations
             WHERE (?1 IS NULL OR country = ?1)
               AND (?2 IS NULL OR name LIKE ?2)
             ORDER BY name",
        )
        .bind(filter.country)
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;
        Ok(destinations)
    }

    pub async fn get_destination(&self, destination_id: &str) -> Result<Destination, ApiError> {
        sqlx::query_as("SELECT * FROM destinations WHERE id = ?")
            .bind(destination_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ApiError::NotFound)
    }

    // Duplicates are allowed; a trip may visit the same place twice.
    pub async fn add_destination_to_trip(
        &self,
        caller: &AuthenticatedUser,
        trip_id: &str,
        payload: NewTripDestination,
    ) -> Result<TripDestination, ApiError> {
        let trip = self
            .guard
            .authorize_trip(caller, trip_id, AccessRight::Write)
            .await?;
        let Some(destination_id) = payload.destination_id else {
            return Err(ApiError::missing_fields("destination_id is required"));
        };
        let destination = self.get_destination(&destination_id).await?;

        let link = TripDestination {
            id: Uuid::new_v4().to_string(),
            trip_id: trip.id,
            destination_id: destination.id,
            visit_order: payload.visit_order,
            notes: payload.notes,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO trip_destinations (id, trip_id, destination_id, visit_order, notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&link.id)
        .bind(&link.trip_id)
        .bind(&link.destination_id)
        .bind(link.visit_order)
        .bind(&link.notes)
        .bind(link.created_at)
        .execute(&self.db)
        .await?;
        Ok(link)
    }

    pub async fn list_trip_destinations(
        &self,
        caller: &AuthenticatedUser,
        trip_id: &str,
    ) -> Result<Vec<TripDestinationEntry>, ApiError> {
        let trip = self
            .guard
            .authorize_trip(caller, trip_id, AccessRight::Read)
            .await?;

        let rows = sqlx::query(
            "SELECT td.id, td.trip_id, td.destination_id, td.visit_order, td.notes, td.created_at,
                    d.name, d.country, d.description AS destination_description, d.image,
                    d.latitude, d.longitude, d.rating,
                    d.created_at AS destination_created_at,
                    d.updated_at AS destination_updated_at
             FROM trip_destinations td
             JOIN destinations d ON d.id = td.destination_id
             WHERE td.trip_id = ?
             ORDER BY td.visit_order IS NULL, td.visit_order, td.created_at",
        )
        .bind(&trip.id)
        .fetch_all(&self.db)
        .await?;

        let entries = rows
            .into_iter()
            .map(|row| TripDestinationEntry {
                link: TripDestination {
                    id: row.get("id"),
                    trip_id: row.get("trip_id"),
                    destination_id: row.get("destination_id"),
                    visit_order: row.get("visit_order"),
                    notes: row.get("notes"),
                    created_at: row.get("created_at"),
                },
                destination: Destination {
                    id: row.get("destination_id"),
                    name: row.get("name"),
                    country: row.get("country"),
                    description: row.get("destination_description"),
                    image: row.get("image"),
                    latitude: row.get("latitude"),
                    longitude: row.get("longitude"),
                    rating: row.get("rating"),
                    created_at: row.get("destination_created_at"),
                    updated_at: row.get("destination_updated_at"),
                },
            })
            .collect();
        Ok(entries)
    }

    pub async fn remove_trip_destination(
        &self,
        caller: &AuthenticatedUser,
        trip_id: &str,
        link_id: &str,
    ) -> Result<(), ApiError> {
        let trip = self
            .guard
            .authorize_trip(caller, trip_id, AccessRight::Write)
            .await?;
        sqlx::query("DELETE FROM trip_destinations WHERE id = ? AND trip_id = ?")
            .bind(link_id)
            .bind(&trip.id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn save_destination(
        &self,
        caller: &AuthenticatedUser,
        destination_id: &str,
        notes: Option<String>,
    ) -> Result<SavedDestination, ApiError> {
        let destination = self.get_destination(destination_id).await?;

        // Fast path only; the unique index is what actually prevents a
        // duplicate under concurrent saves.
        let existing: Option<String> = sqlx::query_scalar(
            "SELECT id FROM saved_destinations WHERE user_id = ? AND destination_id = ?",
        )
        .bind(&caller.id)
        .bind(&destination.id)
        .fetch_optional(&self.db)
        .await?;
        if existing.is_some() {
            return Err(ApiError::already_saved());
        }

        let saved = SavedDestination {
            id: Uuid::new_v4().to_string(),
            user_id: caller.id.clone(),
            destination_id: destination.id,
            notes,
            saved_at: Utc::now(),
        };
        let inserted = sqlx::query(
            "INSERT INTO saved_destinations (id, user_id, destination_id, notes, saved_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&saved.id)
        .bind(&saved.user_id)
        .bind(&saved.destination_id)
        .bind(&saved.notes)
        .bind(saved.saved_at)
        .execute(&self.db)
        .await;
        match inserted {
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(ApiError::already_saved())
            }
            Err(err) => Err(err.into()),
            Ok(_) => Ok(saved),
        }
    }

    // Idempotent; removing an absent bookmark succeeds quietly.
    pub async fn unsave_destination(
        &self,
        caller: &AuthenticatedUser,
        destination_id: &str,
    ) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM saved_destinations WHERE user_id = ? AND destination_id = ?")
            .bind(&caller.id)
            .bind(destination_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn list_saved(
        &self,
        caller: &AuthenticatedUser,
    ) -> Result<Vec<SavedDestinationEntry>, ApiError> {
        let rows = sqlx::query(
            "SELECT sd.id, sd.user_id, sd.destination_id, sd.notes, sd.saved_at,
                    d.name, d.country, d.description AS destination_description, d.image,
                    d.latitude, d.longitude, d.rating,
                    d.created_at AS destination_created_at,
                    d.updated_at AS destination_updated_at
             FROM saved_destinations sd
             JOIN destinations d ON d.id = sd.destination_id
             WHERE sd.user_id = ?
             ORDER BY sd.saved_at DESC",
        )
        .bind(&caller.id)
        .fetch_all(&self.db)
        .await?;

        let entries = rows
            .into_iter()
            .map(|row| SavedDestinationEntry {
                saved: SavedDestination {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    destination_id: row.get("destination_id"),
                    notes: row.get("notes"),
                    saved_at: row.get("saved_at"),
                },
                destination: Destination {
                    id: row.get("destination_id"),
                    name: row.get("name"),
                    country: row.get("country"),
                    description: row.get("destination_description"),
                    image: row.get("image"),
                    latitude: row.get("latitude"),
                    longitude: row.get("longitude"),
                    rating: row.get("rating"),
                    created_at: row.get("destination_created_at"),
                    updated_at: row.get("destination_updated_at"),
                },
            })
            .collect();
        Ok(entries)
    }
}
