use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::core::shared::schema::{categories, services, workshops};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Queryable, Selectable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = services)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct Service {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Option<BigDecimal>,
    pub duration_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = workshops)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Workshop {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub zip_code: String,
    pub city: String,
    pub photo: String,
    pub created_at: DateTime<Utc>,
}
