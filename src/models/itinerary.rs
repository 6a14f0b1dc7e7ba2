use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::destination::Destination;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TripDestination {
    pub id: String,
    pub trip_id: String,
    pub destination_id: String,
    pub visit_order: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripDestinationEntry {
    #[serde(flatten)]
    pub link: TripDestination,
    pub destination: Destination,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTripDestination {
    pub destination_id: Option<String>,
    pub visit_order: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TripActivity {
    pub id: String,
    pub trip_id: String,
    pub day_number: i64,
    pub time_of_day: Option<String>,
    pub activity_name: String,
    pub location: Option<String>,
    pub estimated_cost: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewActivity {
    pub day_number: Option<i64>,
    pub time_of_day: Option<String>,
    pub activity_name: Option<String>,
    pub location: Option<String>,
    pub estimated_cost: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityPatch {
    pub day_number: Option<i64>,
    pub time_of_day: Option<String>,
    pub activity_name: Option<String>,
    pub location: Option<String>,
    pub estimated_cost: Option<f64>,
    pub notes: Option<String>,
}
