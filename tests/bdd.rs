use std::{collections::HashMap, fmt, net::SocketAddr};

use anyhow::Context;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use cucumber::{given, then, when, World as _};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use voyara::{
    auth::AuthenticatedUser,
    config::AppConfig,
    db::init_pool,
    error::ApiError,
    models::{
        itinerary::{NewActivity, NewTripDestination},
        profile::ProfilePatch,
        trip::{NewTrip, Trip, TripPatch, TripStatus},
    },
    routes::create_router,
    state::AppState,
};

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    state: Option<TestState>,
    users: HashMap<String, UserHandle>,
    trips: HashMap<String, Trip>,
    last_trip: Option<(String, String)>,
    last_error: Option<ApiError>,
    current_token: Option<String>,
    last_http: Option<(StatusCode, Value)>,
}

impl AppWorld {
    fn app(&self) -> &AppState {
        self.state
            .as_ref()
            .expect("state must be initialised first")
            .app()
    }

    fn handle(&self, name: &str) -> &UserHandle {
        self.users
            .get(name)
            .expect("user must be signed up before use")
    }

    fn last_trip_id(&self) -> String {
        self.last_trip
            .as_ref()
            .expect("a trip must have been created first")
            .1
            .clone()
    }

    fn last_trip_owner(&self) -> AuthenticatedUser {
        let owner = &self
            .last_trip
            .as_ref()
            .expect("a trip must have been created first")
            .0;
        self.handle(owner).user.clone()
    }

    async fn fetch_last_trip(&self) -> Trip {
        let owner = self.last_trip_owner();
        self.app()
            .trips
            .get_trip(&owner, &self.last_trip_id())
            .await
            .expect("the trip should still exist")
    }
}

#[derive(Debug, Clone)]
struct UserHandle {
    user: AuthenticatedUser,
    token: String,
}

struct TestState {
    app: AppState,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let db_path = root.path().join("bdd.sqlite");
        let database_url = format!("sqlite://{}", db_path.to_string_lossy());

        let config = AppConfig {
            database_url: database_url.clone(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            session_ttl_hours: 24,
        };

        let db = init_pool(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&db).await?;

        let app = AppState::new(config, db);
        Ok(Self { app, _root: root })
    }

    fn app(&self) -> &AppState {
        &self.app
    }
}

fn parse_date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("date in yyyy-mm-dd form")
}

async fn destination_id_by_name(app: &AppState, name: &str) -> String {
    sqlx::query_scalar("SELECT id FROM destinations WHERE name = ?")
        .bind(name)
        .fetch_one(&app.db)
        .await
        .expect("destination should be seeded")
}

#[given("a fresh application")]
async fn given_fresh_application(world: &mut AppWorld) {
    world.state = Some(TestState::new().await.expect("state"));
    world.users.clear();
    world.trips.clear();
    world.last_trip = None;
    world.last_error = None;
    world.current_token = None;
    world.last_http = None;
}

#[given(regex = r#"^a signed-up user "([^"]+)" with email "([^"]+)" and password "([^"]+)"$"#)]
async fn given_signed_up_user(world: &mut AppWorld, name: String, email: String, password: String) {
    let tokens = world
        .app()
        .identity
        .sign_up(&email, &password)
        .await
        .expect("sign up");
    world.users.insert(
        name,
        UserHandle {
            user: AuthenticatedUser {
                id: tokens.user.id.clone(),
                email: tokens.user.email.clone(),
            },
            token: tokens.access_token,
        },
    );
}

#[when(regex = r#"^I sign up with email "([^"]+)" and password "([^"]+)"$"#)]
async fn when_sign_up(world: &mut AppWorld, email: String, password: String) {
    match world.app().identity.sign_up(&email, &password).await {
        Ok(tokens) => {
            world.current_token = Some(tokens.access_token);
            world.last_error = None;
        }
        Err(err) => world.last_error = Some(err),
    }
}

#[when(regex = r#"^I sign in with email "([^"]+)" and password "([^"]+)"$"#)]
async fn when_sign_in(world: &mut AppWorld, email: String, password: String) {
    match world.app().identity.sign_in(&email, &password).await {
        Ok(tokens) => {
            world.current_token = Some(tokens.access_token);
            world.last_error = None;
        }
        Err(err) => world.last_error = Some(err),
    }
}

#[when("I sign out")]
async fn when_sign_out(world: &mut AppWorld) {
    let token = world.current_token.clone().expect("token from sign-up");
    world
        .app()
        .identity
        .sign_out(&token)
        .await
        .expect("sign out");
}

#[then(regex = r#"^the token resolves to "([^"]+)"$"#)]
async fn then_token_resolves(world: &mut AppWorld, email: String) {
    let token = world.current_token.clone().expect("token from sign-up");
    let user = world
        .app()
        .identity
        .get_user(&token)
        .await
        .expect("token should resolve");
    assert_eq!(user.email, email);
}

#[then("the token no longer resolves")]
async fn then_token_gone(world: &mut AppWorld) {
    let token = world.current_token.clone().expect("token from sign-up");
    assert!(world.app().identity.get_user(&token).await.is_err());
}

#[then(regex = r#"^the request fails with code "([^"]+)"$"#)]
async fn then_request_fails(world: &mut AppWorld, code: String) {
    let err = world
        .last_error
        .as_ref()
        .expect("an error should have been recorded");
    assert_eq!(err.code(), code);
}

#[given(regex = r#"^"([^"]+)" created a trip "([^"]+)" from "([^"]+)" to "([^"]+)"$"#)]
async fn given_created_trip(
    world: &mut AppWorld,
    user: String,
    name: String,
    start: String,
    end: String,
) {
    create_trip(world, user, name, start, end).await;
    assert!(world.last_error.is_none(), "trip creation should succeed");
}

#[when(regex = r#"^"([^"]+)" creates a trip "([^"]+)" from "([^"]+)" to "([^"]+)"$"#)]
async fn when_creates_trip(
    world: &mut AppWorld,
    user: String,
    name: String,
    start: String,
    end: String,
) {
    create_trip(world, user, name, start, end).await;
}

async fn create_trip(world: &mut AppWorld, user: String, name: String, start: String, end: String) {
    let payload = NewTrip {
        name: Some(name.clone()),
        start_date: Some(parse_date(&start)),
        end_date: Some(parse_date(&end)),
        ..NewTrip::default()
    };
    let caller = world.handle(&user).user.clone();
    match world.app().trips.create_trip(&caller, payload).await {
        Ok(trip) => {
            world.last_trip = Some((user, trip.id.clone()));
            world.trips.insert(name, trip);
            world.last_error = None;
        }
        Err(err) => world.last_error = Some(err),
    }
}

#[when(regex = r#"^"([^"]+)" creates a trip without a name$"#)]
async fn create_trip_without_name(world: &mut AppWorld, user: String) {
    let payload = NewTrip {
        start_date: Some(parse_date("2026-05-01")),
        end_date: Some(parse_date("2026-05-02")),
        ..NewTrip::default()
    };
    let caller = world.handle(&user).user.clone();
    world.last_error = world
        .app()
        .trips
        .create_trip(&caller, payload)
        .await
        .err();
}

#[when(regex = r#"^"([^"]+)" updates the trip budget to (\d+(?:\.\d+)?)$"#)]
async fn update_trip_budget(world: &mut AppWorld, user: String, budget: f64) {
    let caller = world.handle(&user).user.clone();
    let trip_id = world.last_trip_id();
    let patch = TripPatch {
        budget: Some(budget),
        ..TripPatch::default()
    };
    world.last_error = world
        .app()
        .trips
        .update_trip(&caller, &trip_id, patch)
        .await
        .err();
}

#[when(regex = r#"^"([^"]+)" deletes the trip$"#)]
async fn delete_trip(world: &mut AppWorld, user: String) {
    let caller = world.handle(&user).user.clone();
    let trip_id = world.last_trip_id();
    world.last_error = world
        .app()
        .trips
        .delete_trip(&caller, &trip_id)
        .await
        .err();
}

#[when(regex = r#"^"([^"]+)" marks the trip "([^"]+)" as "([^"]+)"$"#)]
async fn mark_trip_status(world: &mut AppWorld, user: String, trip_name: String, status: String) {
    let caller = world.handle(&user).user.clone();
    let trip_id = world
        .trips
        .get(&trip_name)
        .expect("trip by that name")
        .id
        .clone();
    let status: TripStatus =
        serde_json::from_value(Value::String(status)).expect("a known trip status");
    let patch = TripPatch {
        status: Some(status),
        ..TripPatch::default()
    };
    world.last_error = world
        .app()
        .trips
        .update_trip(&caller, &trip_id, patch)
        .await
        .err();
}

#[then(regex = r#"^"([^"]+)" has (\d+) trips?$"#)]
async fn user_has_trips(world: &mut AppWorld, user: String, expected: usize) {
    let caller = world.handle(&user).user.clone();
    let trips = world
        .app()
        .trips
        .list_trips(&caller, None)
        .await
        .expect("list trips");
    assert_eq!(trips.len(), expected);
}

#[then(regex = r#"^listing "([^"]+)" trips with status "([^"]+)" yields (\d+) trips?$"#)]
async fn listing_with_status(world: &mut AppWorld, user: String, status: String, expected: usize) {
    let caller = world.handle(&user).user.clone();
    let status: TripStatus =
        serde_json::from_value(Value::String(status)).expect("a known trip status");
    let trips = world
        .app()
        .trips
        .list_trips(&caller, Some(status))
        .await
        .expect("list trips");
    assert_eq!(trips.len(), expected);
}

#[then(regex = r#"^the stored trip has status "([^"]+)"$"#)]
async fn stored_trip_status(world: &mut AppWorld, status: String) {
    let trip = world.fetch_last_trip().await;
    assert_eq!(trip.status.as_str(), status);
}

#[then(regex = r#"^the stored trip is owned by "([^"]+)"$"#)]
async fn stored_trip_owner(world: &mut AppWorld, user: String) {
    let trip = world.fetch_last_trip().await;
    assert_eq!(trip.owner_id, world.handle(&user).user.id);
}

#[then(regex = r#"^the stored trip runs from "([^"]+)" to "([^"]+)"$"#)]
async fn stored_trip_dates(world: &mut AppWorld, start: String, end: String) {
    let trip = world.fetch_last_trip().await;
    assert_eq!(trip.start_date, parse_date(&start));
    assert_eq!(trip.end_date, parse_date(&end));
}

#[then(regex = r#"^the stored trip has budget (\d+(?:\.\d+)?)$"#)]
async fn stored_trip_budget(world: &mut AppWorld, budget: f64) {
    let trip = world.fetch_last_trip().await;
    assert_eq!(trip.budget, Some(budget));
}

#[then(regex = r#"^the stored trip is named "([^"]+)"$"#)]
async fn stored_trip_name(world: &mut AppWorld, name: String) {
    let trip = world.fetch_last_trip().await;
    assert_eq!(trip.name, name);
}

#[given(regex = r#"^"([^"]+)" added destination "([^"]+)" to the trip with visit order (\d+)$"#)]
async fn added_destination_to_trip(
    world: &mut AppWorld,
    user: String,
    destination: String,
    order: i64,
) {
    let caller = world.handle(&user).user.clone();
    let trip_id = world.last_trip_id();
    let destination_id = destination_id_by_name(world.app(), &destination).await;
    let payload = NewTripDestination {
        destination_id: Some(destination_id),
        visit_order: Some(order),
        notes: None,
    };
    world
        .app()
        .destinations
        .add_destination_to_trip(&caller, &trip_id, payload)
        .await
        .expect("add destination to trip");
}

#[then("the trip has no stored itinerary rows")]
async fn trip_has_no_itinerary_rows(world: &mut AppWorld) {
    let trip_id = world.last_trip_id();
    let links: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM trip_destinations WHERE trip_id = ?")
            .bind(&trip_id)
            .fetch_one(&world.app().db)
            .await
            .expect("count links");
    let activities: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM trip_activities WHERE trip_id = ?")
            .bind(&trip_id)
            .fetch_one(&world.app().db)
            .await
            .expect("count activities");
    assert_eq!(links, 0);
    assert_eq!(activities, 0);
}

#[given(regex = r#"^"([^"]+)" saved destination "([^"]+)"$"#)]
async fn given_saved_destination(world: &mut AppWorld, user: String, destination: String) {
    let caller = world.handle(&user).user.clone();
    let destination_id = destination_id_by_name(world.app(), &destination).await;
    world
        .app()
        .destinations
        .save_destination(&caller, &destination_id, None)
        .await
        .expect("save destination");
}

#[when(regex = r#"^"([^"]+)" saves destination "([^"]+)"$"#)]
async fn when_saves_destination(world: &mut AppWorld, user: String, destination: String) {
    let caller = world.handle(&user).user.clone();
    let destination_id = destination_id_by_name(world.app(), &destination).await;
    world.last_error = world
        .app()
        .destinations
        .save_destination(&caller, &destination_id, None)
        .await
        .err();
}

#[when(regex = r#"^"([^"]+)" unsaves destination "([^"]+)"$"#)]
async fn when_unsaves_destination(world: &mut AppWorld, user: String, destination: String) {
    let caller = world.handle(&user).user.clone();
    let destination_id = destination_id_by_name(world.app(), &destination).await;
    world
        .app()
        .destinations
        .unsave_destination(&caller, &destination_id)
        .await
        .expect("unsave destination");
}

#[then("the save succeeds")]
async fn save_succeeds(world: &mut AppWorld) {
    assert!(world.last_error.is_none());
}

#[then(regex = r#"^"([^"]+)" has (\d+) saved destinations?$"#)]
async fn user_saved_count(world: &mut AppWorld, user: String, expected: usize) {
    let caller = world.handle(&user).user.clone();
    let saved = world
        .app()
        .destinations
        .list_saved(&caller)
        .await
        .expect("list saved");
    assert_eq!(saved.len(), expected);
}

#[then(regex = r#"^searching destinations for "([^"]+)" yields (\d+) destinations?$"#)]
async fn search_destinations(world: &mut AppWorld, term: String, expected: usize) {
    let filter = voyara::models::destination::DestinationFilter {
        search: Some(term),
        ..Default::default()
    };
    let found = world
        .app()
        .destinations
        .list_destinations(filter)
        .await
        .expect("search destinations");
    assert_eq!(found.len(), expected);
}

#[then(regex = r#"^filtering destinations by country "([^"]+)" yields (\d+) destinations?$"#)]
async fn filter_destinations(world: &mut AppWorld, country: String, expected: usize) {
    let filter = voyara::models::destination::DestinationFilter {
        country: Some(country),
        ..Default::default()
    };
    let found = world
        .app()
        .destinations
        .list_destinations(filter)
        .await
        .expect("filter destinations");
    assert_eq!(found.len(), expected);
}

#[when(regex = r#"^"([^"]+)" adds activity "([^"]+)" on day (\d+)$"#)]
async fn add_activity(world: &mut AppWorld, user: String, name: String, day: i64) {
    let caller = world.handle(&user).user.clone();
    let trip_id = world.last_trip_id();
    let payload = NewActivity {
        activity_name: Some(name),
        day_number: Some(day),
        ..NewActivity::default()
    };
    world.last_error = world
        .app()
        .activities
        .add_activity(&caller, &trip_id, payload)
        .await
        .err();
}

#[when(regex = r#"^"([^"]+)" adds an activity without a name$"#)]
async fn add_activity_without_name(world: &mut AppWorld, user: String) {
    let caller = world.handle(&user).user.clone();
    let trip_id = world.last_trip_id();
    let payload = NewActivity {
        day_number: Some(1),
        ..NewActivity::default()
    };
    world.last_error = world
        .app()
        .activities
        .add_activity(&caller, &trip_id, payload)
        .await
        .err();
}

#[then(regex = r#"^the trip itinerary lists activities in order "([^"]+)"$"#)]
async fn itinerary_order(world: &mut AppWorld, expected: String) {
    let owner = world.last_trip_owner();
    let trip_id = world.last_trip_id();
    let activities = world
        .app()
        .activities
        .list_activities(&owner, &trip_id)
        .await
        .expect("list activities");
    let names: Vec<&str> = activities
        .iter()
        .map(|activity| activity.activity_name.as_str())
        .collect();
    assert_eq!(names.join(", "), expected);
}

#[when(regex = r#"^"([^"]+)" replaces the trip preferences with "([^"]+)"$"#)]
async fn replace_preferences(world: &mut AppWorld, user: String, prefs: String) {
    let caller = world.handle(&user).user.clone();
    let trip_id = world.last_trip_id();
    let preferences: Vec<String> = prefs.split(", ").map(str::to_string).collect();
    let patch = TripPatch {
        preferences: Some(preferences),
        ..TripPatch::default()
    };
    world.last_error = world
        .app()
        .trips
        .update_trip(&caller, &trip_id, patch)
        .await
        .err();
}

#[then(regex = r#"^the stored trip preferences are "([^"]+)"$"#)]
async fn stored_preferences(world: &mut AppWorld, expected: String) {
    let trip = world.fetch_last_trip().await;
    assert_eq!(trip.preferences.0.join(", "), expected);
}

#[then(regex = r#"^"([^"]+)" profile language is "([^"]+)"$"#)]
async fn profile_language(world: &mut AppWorld, user: String, language: String) {
    let caller = world.handle(&user).user.clone();
    let profile = world
        .app()
        .profiles
        .get_profile(&caller)
        .await
        .expect("profile");
    assert_eq!(profile.language, language);
}

#[when(regex = r#"^"([^"]+)" sets profile full name to "([^"]+)"$"#)]
async fn set_profile_full_name(world: &mut AppWorld, user: String, full_name: String) {
    let caller = world.handle(&user).user.clone();
    let patch = ProfilePatch {
        full_name: Some(full_name),
        ..ProfilePatch::default()
    };
    world
        .app()
        .profiles
        .upsert_profile(&caller, patch)
        .await
        .expect("upsert profile");
}

#[when(regex = r#"^"([^"]+)" sets profile bio to "([^"]+)"$"#)]
async fn set_profile_bio(world: &mut AppWorld, user: String, bio: String) {
    let caller = world.handle(&user).user.clone();
    let patch = ProfilePatch {
        bio: Some(bio),
        ..ProfilePatch::default()
    };
    world
        .app()
        .profiles
        .upsert_profile(&caller, patch)
        .await
        .expect("upsert profile");
}

#[then(regex = r#"^"([^"]+)" profile full name is "([^"]+)"$"#)]
async fn profile_full_name(world: &mut AppWorld, user: String, full_name: String) {
    let caller = world.handle(&user).user.clone();
    let profile = world
        .app()
        .profiles
        .get_profile(&caller)
        .await
        .expect("profile");
    assert_eq!(profile.full_name.as_deref(), Some(full_name.as_str()));
}

#[then(regex = r#"^"([^"]+)" profile bio is "([^"]+)"$"#)]
async fn profile_bio(world: &mut AppWorld, user: String, bio: String) {
    let caller = world.handle(&user).user.clone();
    let profile = world
        .app()
        .profiles
        .get_profile(&caller)
        .await
        .expect("profile");
    assert_eq!(profile.bio.as_deref(), Some(bio.as_str()));
}

#[when("I request the health endpoint over HTTP")]
async fn http_health(world: &mut AppWorld) {
    perform_http(world, "/api/health").await;
}

#[when("I request my trips over HTTP without a token")]
async fn http_trips_without_token(world: &mut AppWorld) {
    perform_http(world, "/api/trips").await;
}

async fn perform_http(world: &mut AppWorld, uri: &str) {
    let app = create_router(world.app().clone());
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");
    world.last_http = Some((status, body));
}

#[then(regex = r#"^the HTTP response status is (\d+) with code "([^"]+)"$"#)]
async fn http_status_with_code(world: &mut AppWorld, status: u16, code: String) {
    let (actual, body) = world
        .last_http
        .as_ref()
        .expect("an HTTP request must come first");
    assert_eq!(actual.as_u16(), status);
    assert_eq!(body["code"], code.as_str());
}

#[then(regex = r#"^the HTTP response status is (\d+) and the body status is "([^"]+)"$"#)]
async fn http_status_with_body_status(world: &mut AppWorld, status: u16, body_status: String) {
    let (actual, body) = world
        .last_http
        .as_ref()
        .expect("an HTTP request must come first");
    assert_eq!(actual.as_u16(), status);
    assert_eq!(body["status"], body_status.as_str());
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
