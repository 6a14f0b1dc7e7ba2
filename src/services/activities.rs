use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    db::DbPool,
    error::ApiError,
    models::itinerary::{ActivityPatch, NewActivity, TripActivity},
    services::guard::{AccessRight, AuthGuard},
};

#[derive(Clone)]
pub struct ActivityService {
    db: DbPool,
    guard: AuthGuard,
}

impl ActivityService {
    pub fn new(db: DbPool, guard: AuthGuard) -> Self {
        Self { db, guard }
    }

    pub async fn list_activities(
        &self,
        caller: &AuthenticatedUser,
        trip_id: &str,
    ) -> Result<Vec<TripActivity>, ApiError> {
        let trip = self
            .guard
            .authorize_trip(caller, trip_id, AccessRight::Read)
            .await?;
        let activities = sqlx::query_as(
            "SELECT * FROM trip_activities WHERE trip_id = ? ORDER BY day_number, created_at",
        )
        .bind(&trip.id)
        .fetch_all(&self.db)
        .await?;
        Ok(activities)
    }

    pub async fn add_activity(
        &self,
        caller: &AuthenticatedUser,
        trip_id: &str,
        payload: NewActivity,
    ) -> Result<TripActivity, ApiError> {
        let trip = self
            .guard
            .authorize_trip(caller, trip_id, AccessRight::Write)
            .await?;

        let name = payload
            .activity_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let (activity_name, day_number) = match (name, payload.day_number) {
            (Some(name), Some(day)) => (name.to_string(), day),
            _ => {
                return Err(ApiError::missing_fields(
                    "activity_name and day_number are required",
                ))
            }
        };
        if day_number < 1 {
            return Err(ApiError::invalid_day_number());
        }

        let activity = TripActivity {
            id: Uuid::new_v4().to_string(),
            trip_id: trip.id,
            day_number,
            time_of_day: payload.time_of_day,
            activity_name,
            location: payload.location,
            estimated_cost: payload.estimated_cost,
            notes: payload.notes,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO trip_activities (id, trip_id, day_number, time_of_day, activity_name,
                                          location, estimated_cost, notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&activity.id)
        .bind(&activity.trip_id)
        .bind(activity.day_number)
        .bind(&activity.time_of_day)
        .bind(&activity.activity_name)
        .bind(&activity.location)
        .bind(activity.estimated_cost)
        .bind(&activity.notes)
        .bind(activity.created_at)
        .execute(&self.db)
        .await?;
        Ok(activity)
    }

    pub async fn update_activity(
        &self,
        caller: &AuthenticatedUser,
        trip_id: &str,
        activity_id: &str,
        patch: ActivityPatch,
    ) -> Result<TripActivity, ApiError> {
        let trip = self
            .guard
            .authorize_trip(caller, trip_id, AccessRight::Write)
            .await?;
        let mut activity = sqlx::query_as::<_, TripActivity>(
            "SELECT * FROM trip_activities WHERE id = ? AND trip_id = ?",
        )
        .bind(activity_id)
        .bind(&trip.id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ApiError::NotFound)?;

        if let Some(day_number) = patch.day_number {
            if day_number < 1 {
                return Err(ApiError::invalid_day_number());
            }
            activity.day_number = day_number;
        }
        if let Some(name) = patch.activity_name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ApiError::missing_fields("activity_name must not be empty"));
            }
            activity.activity_name = name;
        }
        if let Some(time_of_day) = patch.time_of_day {
            activity.time_of_day = Some(time_of_day);
        }
        if let Some(location) = patch.location {
            activity.location = Some(location);
        }
        if let Some(cost) = patch.estimated_cost {
            activity.estimated_cost = Some(cost);
        }
        if let Some(notes) = patch.notes {
            activity.notes = Some(notes);
        }

        sqlx::query(
            "UPDATE trip_activities SET day_number = ?, time_of_day = ?, activity_name = ?,
                                        location = ?, estimated_cost = ?, notes = ?
             WHERE id = ?",
        )
        .bind(activity.day_number)
        .bind(&activity.time_of_day)
        .bind(&activity.activity_name)
        .bind(&activity.location)
        .bind(activity.estimated_cost)
        .bind(&activity.notes)
        .bind(&activity.id)
        .execute(&self.db)
        .await?;
        Ok(activity)
    }

    pub async fn remove_activity(
        &self,
        caller: &AuthenticatedUser,
        trip_id: &str,
        activity_id: &str,
    ) -> Result<(), ApiError> {
        let trip = self
            .guard
            .authorize_trip(caller, trip_id, AccessRight::Write)
            .await?;
        sqlx::query("DELETE FROM trip_activities WHERE id = ? AND trip_id = ?")
            .bind(activity_id)
            .bind(&trip.id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
