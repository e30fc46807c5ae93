//! Read-only workshop pages.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use diesel::prelude::*;
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::{group_by_category, CategoryWithServices};
use crate::core::shared::models::{Category, Service, User, Workshop};
use crate::core::shared::schema::{
    categories, services, users, workshop_professionals, workshop_services, workshops,
};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::html_escape;
use crate::core::urls::ApiUrls;

pub const DEFAULT_WORKSHOP_PHOTO: &str = "img/elio-santos-5ZQn_gWKvLE-unsplash.jpg";

#[derive(Debug, thiserror::Error)]
pub enum WorkshopsError {
    #[error("Atelier introuvable.")]
    NotFound,
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<diesel::result::Error> for WorkshopsError {
    fn from(e: diesel::result::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl IntoResponse for WorkshopsError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => {
                log::error!("Workshop page failed: {self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkshopDetail {
    pub workshop: Workshop,
    pub services_by_category: Vec<CategoryWithServices>,
    /// Display names of the professionals working there.
    pub professionals: Vec<String>,
    pub photo: String,
}

pub fn configure_workshop_routes() -> Router<Arc<AppState>> {
    Router::new().route(ApiUrls::WORKSHOP_DETAIL, get(handle_workshop_detail))
}

pub fn workshop_photo(workshop: &Workshop) -> &str {
    let photo = workshop.photo.trim();
    if photo.is_empty() {
        DEFAULT_WORKSHOP_PHOTO
    } else {
        photo
    }
}

pub fn load_workshop_detail(
    conn: &mut PgConnection,
    workshop_id: Uuid,
) -> Result<WorkshopDetail, WorkshopsError> {
    let workshop = workshops::table
        .find(workshop_id)
        .select(Workshop::as_select())
        .first(conn)
        .optional()?
        .ok_or(WorkshopsError::NotFound)?;

    let rows: Vec<(Service, Category)> = workshop_services::table
        .inner_join(services::table.inner_join(categories::table))
        .filter(workshop_services::workshop_id.eq(workshop.id))
        .order((categories::name.asc(), services::name.asc(), services::id.asc()))
        .select((Service::as_select(), Category::as_select()))
        .load(conn)?;

    let professionals: Vec<User> = workshop_professionals::table
        .inner_join(users::table)
        .filter(workshop_professionals::workshop_id.eq(workshop.id))
        .order((users::first_name.asc(), users::last_name.asc()))
        .select(User::as_select())
        .load(conn)?;

    Ok(WorkshopDetail {
        photo: workshop_photo(&workshop).to_string(),
        workshop,
        services_by_category: group_by_category(rows),
        professionals: professionals.iter().map(User::display_name).collect(),
    })
}

pub fn render_workshop(detail: &WorkshopDetail) -> String {
    let workshop = &detail.workshop;
    let mut services = String::new();
    for group in &detail.services_by_category {
        let _ = write!(services, "<h2>{}</h2><ul>", html_escape(&group.category.name));
        for service in &group.services {
            let price = service
                .price
                .as_ref()
                .map(|p| format!(" · {p} €"))
                .unwrap_or_default();
            let _ = write!(
                services,
                "<li>{}{}</li>",
                html_escape(&service.name),
                html_escape(&price)
            );
        }
        services.push_str("</ul>");
    }
    if services.is_empty() {
        services.push_str("<p>Aucune prestation proposée pour le moment.</p>");
    }

    let team = if detail.professionals.is_empty() {
        String::new()
    } else {
        format!(
            "<p>Équipe : {}</p>",
            html_escape(&detail.professionals.join(", "))
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{name}</title>
</head>
<body>
    <img src="/static/{photo}" alt="{name}">
    <h1>{name}</h1>
    <p>{address}<br>{zip} {city}</p>
    {team}
    {services}
</body>
</html>"#,
        name = html_escape(&workshop.name),
        photo = html_escape(&detail.photo),
        address = html_escape(&workshop.address),
        zip = html_escape(&workshop.zip_code),
        city = html_escape(&workshop.city),
    )
}

pub async fn handle_workshop_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, WorkshopsError> {
    let workshop_id = Uuid::parse_str(&id).map_err(|_| WorkshopsError::NotFound)?;
    let pool = state.conn.clone();

    let detail = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| WorkshopsError::Database(e.to_string()))?;
        load_workshop_detail(&mut conn, workshop_id)
    })
    .await
    .map_err(|e: tokio::task::JoinError| WorkshopsError::Internal(e.to_string()))??;

    Ok(Html(render_workshop(&detail)))
}
