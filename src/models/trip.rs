use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TripStatus {
    #[default]
    Planning,
    Ongoing,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Planning => "planning",
            TripStatus::Ongoing => "ongoing",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cover_photo: Option<String>,
    pub budget: Option<f64>,
    pub status: TripStatus,
    pub destination: Option<String>,
    pub adults: Option<i64>,
    pub kids: Option<i64>,
    pub preferences: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTrip {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cover_photo: Option<String>,
    pub budget: Option<f64>,
    pub destination: Option<String>,
    pub adults: Option<i64>,
    pub kids: Option<i64>,
    pub preferences: Option<Vec<String>>,
}

// Absent fields are left untouched on update, never nulled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cover_photo: Option<String>,
    pub budget: Option<f64>,
    pub status: Option<TripStatus>,
    pub destination: Option<String>,
    pub adults: Option<i64>,
    pub kids: Option<i64>,
    pub preferences: Option<Vec<String>>,
}
