use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Destination {
    pub id: String,
    pub name: String,
    pub country: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DestinationFilter {
    pub country: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SavedDestination {
    pub id: String,
    pub user_id: String,
    pub destination_id: String,
    pub notes: Option<String>,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedDestinationEntry {
    #[serde(flatten)]
    pub saved: SavedDestination,
    pub destination: Destination,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveDestinationRequest {
    pub notes: Option<String>,
}
