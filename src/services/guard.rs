use crate::{auth::AuthenticatedUser, db::DbPool, error::ApiError, models::trip::Trip};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRight {
    Read,
    Write,
}

impl AccessRight {
    fn permits(self, caller: &AuthenticatedUser, trip: &Trip) -> bool {
        // Trip details are owner-only across the board; a looser read
        // policy would change only the Read arm.
        match self {
            AccessRight::Read | AccessRight::Write => trip.owner_id == caller.id,
        }
    }
}

#[derive(Clone)]
pub struct AuthGuard {
    db: DbPool,
}

impl AuthGuard {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn authorize_trip(
        &self,
        caller: &AuthenticatedUser,
        trip_id: &str,
        right: AccessRight,
    ) -> Result<Trip, ApiError> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = ?")
            .bind(trip_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ApiError::NotFound)?;

        if !right.permits(caller, &trip) {
            return Err(ApiError::Forbidden);
        }
        Ok(trip)
    }
}
