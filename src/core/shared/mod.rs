pub mod enums;
pub mod models;
pub mod schema;
pub mod state;
pub mod utils;

pub use enums::*;
pub use schema::*;

pub use models::{Calendar, Category, Event, EventAttendee, Service, User, Workshop};

pub use utils::{create_conn, html_escape, run_migrations, safe_int, DbPool};
