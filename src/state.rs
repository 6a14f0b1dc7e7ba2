use chrono::Duration;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        activities::ActivityService, destinations::DestinationService, guard::AuthGuard,
        identity::IdentityService, profile::ProfileService, trips::TripService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub identity: IdentityService,
    pub trips: TripService,
    pub destinations: DestinationService,
    pub activities: ActivityService,
    pub profiles: ProfileService,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let guard = AuthGuard::new(db.clone());
        let identity =
            IdentityService::new(db.clone(), Duration::hours(config.session_ttl_hours));
        let trips = TripService::new(db.clone(), guard.clone());
        let destinations = DestinationService::new(db.clone(), guard.clone());
        let activities = ActivityService::new(db.clone(), guard);
        let profiles = ProfileService::new(db.clone());
        Self {
            config,
            db,
            identity,
            trips,
            destinations,
            activities,
            profiles,
        }
    }
}
