//! Categories and the services professionals offer under them.

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use log::{error, info};
use serde::Serialize;
use uuid::Uuid;

use crate::core::shared::models::{Category, Service, User};
use crate::core::shared::schema::{categories, services};
use crate::forms::{CategoryForm, FormData, ServiceForm};
use crate::security::validation::ValidationError;

pub const MSG_CATEGORY_EXISTS: &str = "Une catégorie avec ce nom existe déjà.";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catégorie invalide.")]
    InvalidCategory(CategoryForm),
    #[error("Prestation invalide.")]
    InvalidService(ServiceForm),
    #[error("Prestation introuvable ou non autorisée.")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] DieselError),
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithServices {
    pub category: Category,
    pub services: Vec<Service>,
}

pub fn list_categories(conn: &mut PgConnection) -> Result<Vec<Category>, CatalogError> {
    Ok(categories::table
        .order(categories::name.asc())
        .select(Category::as_select())
        .load(conn)?)
}

pub fn category_exists(conn: &mut PgConnection, category_id: Uuid) -> Result<bool, CatalogError> {
    Ok(diesel::select(diesel::dsl::exists(categories::table.find(category_id))).get_result(conn)?)
}

pub fn save_category(
    conn: &mut PgConnection,
    mut form: CategoryForm,
) -> Result<Category, CatalogError> {
    let Some(name) = form.clean() else {
        return Err(CatalogError::InvalidCategory(form));
    };

    let taken: bool = diesel::select(diesel::dsl::exists(
        categories::table.filter(categories::name.eq(&name)),
    ))
    .get_result(conn)?;
    if taken {
        form.errors.add("name", MSG_CATEGORY_EXISTS);
        return Err(CatalogError::InvalidCategory(form));
    }

    let category = Category {
        id: Uuid::new_v4(),
        name,
        created_at: Utc::now(),
    };

    diesel::insert_into(categories::table)
        .values(&category)
        .execute(conn)
        .map_err(|e| {
            error!("Failed to create category {}: {}", category.name, e);
            CatalogError::Database(e)
        })?;

    info!("Created category {}", category.name);
    Ok(category)
}

fn find_owned_service(
    conn: &mut PgConnection,
    requester: &User,
    service_id: Uuid,
) -> Result<Option<Service>, CatalogError> {
    Ok(services::table
        .filter(services::id.eq(service_id))
        .filter(services::created_by.eq(requester.id))
        .select(Service::as_select())
        .first(conn)
        .optional()?)
}

/// Builds the service form for the dashboard: bound to `data` when given,
/// otherwise showing the values of the requester's existing service.
pub fn prepare_service_form(
    conn: &mut PgConnection,
    requester: &User,
    service_id: Option<Uuid>,
    data: Option<&FormData>,
) -> Result<(ServiceForm, Option<Service>), CatalogError> {
    let Some(service_id) = service_id else {
        let form = data.map(ServiceForm::bind).unwrap_or_default();
        return Ok((form, None));
    };

    let service = find_owned_service(conn, requester, service_id)?.ok_or(CatalogError::NotFound)?;
    let mut form = match data {
        Some(data) => ServiceForm::bind(data),
        None => ServiceForm::from_service(&service),
    };
    form.service_id = Some(service.id);
    Ok((form, Some(service)))
}

/// Creates the service, or updates it when the form carries a service id.
/// A new service is owned by `requester`.
pub fn save_service(
    conn: &mut PgConnection,
    mut form: ServiceForm,
    requester: &User,
) -> Result<Service, CatalogError> {
    let Some(input) = form.clean() else {
        return Err(CatalogError::InvalidService(form));
    };

    if !category_exists(conn, input.category_id)? {
        form.errors.add_validation(
            "category",
            &ValidationError::InvalidChoice(input.category_id.to_string()),
        );
        return Err(CatalogError::InvalidService(form));
    }

    let service = match form.service_id {
        Some(service_id) => {
            let mut service =
                find_owned_service(conn, requester, service_id)?.ok_or(CatalogError::NotFound)?;
            service.name = input.name;
            service.category_id = input.category_id;
            service.price = input.price;
            service.duration_minutes = input.duration_minutes;

            diesel::update(services::table.find(service.id))
                .set(&service)
                .execute(conn)?;
            info!("Updated service {} ({})", service.name, service.id);
            service
        }
        None => {
            let service = Service {
                id: Uuid::new_v4(),
                category_id: input.category_id,
                name: input.name,
                description: String::new(),
                price: input.price,
                duration_minutes: input.duration_minutes,
                created_at: Utc::now(),
                created_by: requester.id,
            };

            diesel::insert_into(services::table)
                .values(&service)
                .execute(conn)
                .map_err(|e| {
                    error!("Failed to create service {}: {}", service.name, e);
                    CatalogError::Database(e)
                })?;
            info!("Created service {} for {}", service.name, requester.id);
            service
        }
    };

    Ok(service)
}

/// Deletes one of the requester's services and returns it.
pub fn delete_service(
    conn: &mut PgConnection,
    requester: &User,
    service_id: Uuid,
) -> Result<Service, CatalogError> {
    let service = find_owned_service(conn, requester, service_id)?.ok_or(CatalogError::NotFound)?;
    diesel::delete(services::table.find(service.id)).execute(conn)?;
    info!("Deleted service {} ({})", service.name, service.id);
    Ok(service)
}

pub fn list_user_services(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<Service>, CatalogError> {
    Ok(services::table
        .filter(services::created_by.eq(user_id))
        .order((services::name.asc(), services::id.asc()))
        .select(Service::as_select())
        .load(conn)?)
}

/// Categories holding at least one of the user's services, by name, each
/// with only that user's services sorted by name.
pub fn list_user_categories(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<CategoryWithServices>, CatalogError> {
    let rows: Vec<(Service, Category)> = services::table
        .inner_join(categories::table)
        .filter(services::created_by.eq(user_id))
        .order((categories::name.asc(), services::name.asc(), services::id.asc()))
        .select((Service::as_select(), Category::as_select()))
        .load(conn)?;

    Ok(group_by_category(rows))
}

/// Folds rows already sorted by category into one group per category.
pub fn group_by_category(rows: Vec<(Service, Category)>) -> Vec<CategoryWithServices> {
    let mut grouped: Vec<CategoryWithServices> = Vec::new();
    for (service, category) in rows {
        if let Some(group) = grouped
            .last_mut()
            .filter(|group| group.category.id == category.id)
        {
            group.services.push(service);
            continue;
        }
        grouped.push(CategoryWithServices {
            category,
            services: vec![service],
        });
    }
    grouped
}
