pub mod calendar;
pub mod catalog;
pub mod contacts;
pub mod core;
pub mod dashboards;
pub mod forms;
pub mod security;
pub mod users;
pub mod web;
pub mod workshops;

pub use crate::core::config::AppConfig;
pub use crate::core::shared::state::AppState;
pub use crate::web::create_router;
