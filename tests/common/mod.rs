//! Shared fixtures for the PostgreSQL-backed integration tests.
//!
//! Set `TEST_DATABASE_URL` to run them; every test works inside a
//! transaction that is never committed.
#![allow(dead_code)]

use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use std::str::FromStr;
use std::sync::{Arc, Mutex, OnceLock};
use uuid::Uuid;

use kitlast::core::shared::enums::UserType;
use kitlast::core::shared::models::{Category, Service, User};
use kitlast::core::shared::schema::{categories, services};
use kitlast::core::shared::utils::run_migrations;
use kitlast::users::{create_user, NewUser};
use kitlast::{AppConfig, AppState};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

static MIGRATED: OnceLock<Mutex<bool>> = OnceLock::new();

pub fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
}

fn ensure_migrated(url: &str) {
    let lock = MIGRATED.get_or_init(|| Mutex::new(false));
    let mut done = lock.lock().unwrap_or_else(|e| e.into_inner());
    if !*done {
        let mut conn = PgConnection::establish(url).expect("connect for migrations");
        run_migrations(&mut conn).expect("run migrations");
        *done = true;
    }
}

/// A connection inside a test transaction, or `None` when no test database
/// is configured.
pub fn connection() -> Option<PgConnection> {
    let Some(url) = database_url() else {
        println!("Skipping test - TEST_DATABASE_URL not set");
        return None;
    };
    ensure_migrated(&url);
    let mut conn = PgConnection::establish(&url).expect("connect to test database");
    conn.begin_test_transaction().expect("begin test transaction");
    Some(conn)
}

#[derive(Debug)]
struct TestTransaction;

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for TestTransaction {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        conn.begin_test_transaction()
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Application state over a single pooled connection that never commits,
/// so fixtures written through `state.conn` are visible to requests.
pub fn test_state() -> Option<Arc<AppState>> {
    let Some(url) = database_url() else {
        println!("Skipping test - TEST_DATABASE_URL not set");
        return None;
    };
    ensure_migrated(&url);

    let pool = Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(TestTransaction))
        .build(ConnectionManager::<PgConnection>::new(&url))
        .expect("build test pool");

    let config = AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some(url.clone()),
        "JWT_SECRET" => Some(TEST_JWT_SECRET.to_string()),
        "TIME_ZONE" => Some("Europe/Paris".to_string()),
        _ => None,
    })
    .expect("test config");

    Some(Arc::new(AppState::new(pool, config)))
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

pub fn professional(conn: &mut PgConnection, first_name: &str) -> User {
    create_user(
        conn,
        NewUser {
            email: unique_email("pro"),
            password: Some("s3cret-pass".into()),
            first_name: first_name.into(),
            last_name: "Pro".into(),
            user_type: UserType::Professional,
            ..NewUser::default()
        },
    )
    .expect("create professional")
}

pub fn individual(conn: &mut PgConnection, professional: &User, first_name: &str) -> User {
    create_user(
        conn,
        NewUser {
            email: unique_email("client"),
            first_name: first_name.into(),
            last_name: "Client".into(),
            user_type: UserType::Individual,
            linked_professional_id: Some(professional.id),
            ..NewUser::default()
        },
    )
    .expect("create individual")
}

pub fn category(conn: &mut PgConnection, name: &str) -> Category {
    let category = Category {
        id: Uuid::new_v4(),
        name: format!("{name} {}", Uuid::new_v4().simple()),
        created_at: Utc::now(),
    };
    diesel::insert_into(categories::table)
        .values(&category)
        .execute(conn)
        .expect("insert category");
    category
}

pub fn service(
    conn: &mut PgConnection,
    owner: &User,
    category: &Category,
    name: &str,
    duration_minutes: Option<i32>,
) -> Service {
    let service = Service {
        id: Uuid::new_v4(),
        category_id: category.id,
        name: name.into(),
        description: format!("{name} description"),
        price: Some(BigDecimal::from_str("45.00").expect("decimal")),
        duration_minutes,
        created_at: Utc::now(),
        created_by: owner.id,
    };
    diesel::insert_into(services::table)
        .values(&service)
        .execute(conn)
        .expect("insert service");
    service
}
