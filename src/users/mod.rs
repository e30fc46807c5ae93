//! User persistence with the professional/individual link invariant.
//!
//! Every write goes through [`save_user`], which runs [`full_clean`] first,
//! so an individual can never be stored without a professional behind it.

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::error;
use uuid::Uuid;

use crate::core::shared::enums::UserType;
use crate::core::shared::models::User;
use crate::core::shared::schema::users;
use crate::security::password::{hash_password, unusable_password};
use crate::security::validation::{normalize_email, validate_email, validate_length};

diesel::define_sql_function!(fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text);

pub const MSG_INDIVIDUAL_NEEDS_PROFESSIONAL: &str =
    "Un particulier doit être rattaché à un professionnel.";
pub const MSG_LINK_MUST_BE_PROFESSIONAL: &str = "Le compte associé doit être professionnel.";
pub const MSG_EMAIL_TAKEN: &str = "Un utilisateur avec cette adresse e-mail existe déjà.";

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("{message}")]
    Validation { field: String, message: String },
    #[error("Failed to hash password: {0}")]
    Password(String),
    #[error("Database error: {0}")]
    Database(#[from] DieselError),
}

impl UserError {
    fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Checks field formats and the link invariant:
/// an individual must point at a professional, and a professional may only
/// point at another professional.
pub fn full_clean(conn: &mut PgConnection, user: &User) -> Result<(), UserError> {
    if user.email.trim().is_empty() {
        return Err(UserError::validation("email", "Ce champ est obligatoire."));
    }
    validate_email(&user.email).map_err(|e| UserError::validation("email", e.to_string()))?;

    for (field, value, max) in [
        ("first_name", &user.first_name, 150),
        ("last_name", &user.last_name, 150),
        ("phone_number", &user.phone_number, 30),
    ] {
        validate_length(value, field, max).map_err(|e| UserError::validation(field, e.to_string()))?;
    }

    if email_taken(conn, &user.email, Some(user.id))? {
        return Err(UserError::validation("email", MSG_EMAIL_TAKEN));
    }

    let linked = match user.linked_professional_id {
        Some(linked_id) => users::table
            .find(linked_id)
            .select(users::user_type)
            .first::<UserType>(conn)
            .optional()?,
        None => None,
    };

    match (user.user_type, linked) {
        (UserType::Individual, None) => Err(UserError::validation(
            "linked_professional",
            MSG_INDIVIDUAL_NEEDS_PROFESSIONAL,
        )),
        (_, Some(linked_type)) if linked_type != UserType::Professional => Err(
            UserError::validation("linked_professional", MSG_LINK_MUST_BE_PROFESSIONAL),
        ),
        (UserType::Professional, None) if user.linked_professional_id.is_some() => Err(
            UserError::validation("linked_professional", MSG_LINK_MUST_BE_PROFESSIONAL),
        ),
        _ => Ok(()),
    }
}

/// Validates then inserts or updates the row.
pub fn save_user(conn: &mut PgConnection, user: &User) -> Result<User, UserError> {
    full_clean(conn, user)?;

    diesel::insert_into(users::table)
        .values(user)
        .on_conflict(users::id)
        .do_update()
        .set(user)
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                UserError::validation("email", MSG_EMAIL_TAKEN)
            }
            other => {
                error!("Failed to save user {}: {}", user.id, other);
                UserError::Database(other)
            }
        })
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    /// `None` stores an unusable password.
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub user_type: UserType,
    pub linked_professional_id: Option<Uuid>,
    pub is_staff: bool,
}

pub fn create_user(conn: &mut PgConnection, new_user: NewUser) -> Result<User, UserError> {
    if new_user.email.trim().is_empty() {
        return Err(UserError::validation("email", "Ce champ est obligatoire."));
    }

    let password_hash = match new_user.password.as_deref() {
        Some(password) => hash_password(password).map_err(|e| UserError::Password(e.to_string()))?,
        None => unusable_password(),
    };

    let user = User {
        id: Uuid::new_v4(),
        email: normalize_email(&new_user.email),
        password_hash,
        first_name: new_user.first_name,
        last_name: new_user.last_name,
        phone_number: new_user.phone_number,
        user_type: new_user.user_type,
        linked_professional_id: new_user.linked_professional_id,
        is_staff: new_user.is_staff,
        is_active: true,
        date_joined: Utc::now(),
    };

    save_user(conn, &user)
}

pub fn get_user(conn: &mut PgConnection, user_id: Uuid) -> Result<Option<User>, UserError> {
    Ok(users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?)
}

/// Whether another user already uses `email` (case-insensitive).
pub fn email_taken(
    conn: &mut PgConnection,
    email: &str,
    exclude: Option<Uuid>,
) -> Result<bool, UserError> {
    let mut query = users::table
        .filter(lower(users::email).eq(email.to_lowercase()))
        .select(users::id)
        .into_boxed();

    if let Some(id) = exclude {
        query = query.filter(users::id.ne(id));
    }

    Ok(query.first::<Uuid>(conn).optional()?.is_some())
}
