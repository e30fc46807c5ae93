use chrono::Utc;
use diesel::prelude::*;
use log::{error, info};
use uuid::Uuid;

use super::error::{ClientError, MSG_PROFESSIONAL_REQUIRED};
use crate::core::shared::enums::UserType;
use crate::core::shared::models::User;
use crate::core::shared::schema::users;
use crate::forms::{ClientForm, FormData};
use crate::security::password::{hash_password, random_password, CLIENT_PASSWORD_LENGTH};
use crate::users::{email_taken, save_user, UserError, MSG_EMAIL_TAKEN};

/// Moves a save failure onto the form, or turns it into an infrastructure
/// error.
fn attach_user_error(mut form: ClientForm, err: UserError) -> ClientError {
    match err {
        UserError::Validation { field, message } => {
            form.errors.add(&field, message);
            ClientError::Invalid(form)
        }
        other => {
            error!("Failed to save client: {other}");
            ClientError::Database(other.to_string())
        }
    }
}

/// Looks up a client owned by `professional`.
pub fn find_client(
    conn: &mut PgConnection,
    professional: &User,
    client_id: Uuid,
) -> Result<Option<User>, ClientError> {
    Ok(users::table
        .filter(users::id.eq(client_id))
        .filter(users::linked_professional_id.eq(professional.id))
        .filter(users::user_type.eq(UserType::Individual))
        .select(User::as_select())
        .first(conn)
        .optional()?)
}

/// Creates an individual linked to `requester`, with a random password.
pub fn create_client(
    conn: &mut PgConnection,
    requester: &User,
    data: &FormData,
) -> Result<User, ClientError> {
    let mut bound = data.clone();
    bound.insert("linked_professional".to_string(), requester.id.to_string());
    let mut form = ClientForm::bind(&bound);

    if !requester.is_professional() {
        form.errors.add_non_field(MSG_PROFESSIONAL_REQUIRED);
        return Err(ClientError::Invalid(form));
    }

    let Some(input) = form.clean() else {
        return Err(ClientError::Invalid(form));
    };

    if email_taken(conn, &input.email, None).map_err(|e| ClientError::Database(e.to_string()))? {
        form.errors.add("email", MSG_EMAIL_TAKEN);
        return Err(ClientError::Invalid(form));
    }

    let password_hash = hash_password(&random_password(CLIENT_PASSWORD_LENGTH)).map_err(|e| {
        error!("Failed to hash client password: {e}");
        ClientError::Database(e.to_string())
    })?;

    let client = User {
        id: Uuid::new_v4(),
        email: input.email,
        password_hash,
        first_name: input.first_name,
        last_name: input.last_name,
        phone_number: input.phone_number,
        user_type: UserType::Individual,
        linked_professional_id: Some(requester.id),
        is_staff: false,
        is_active: true,
        date_joined: Utc::now(),
    };

    match save_user(conn, &client) {
        Ok(client) => {
            info!("Professional {} added client {}", requester.id, client.id);
            Ok(client)
        }
        Err(e) => Err(attach_user_error(form, e)),
    }
}

/// Updates one of `requester`'s clients. A blank or missing
/// `linked_professional` keeps the current link.
pub fn update_client(
    conn: &mut PgConnection,
    requester: &User,
    client_id: Uuid,
    data: &FormData,
) -> Result<User, ClientError> {
    let mut client = find_client(conn, requester, client_id)?.ok_or(ClientError::NotFound)?;

    let mut bound = data.clone();
    let link_missing = bound
        .get("linked_professional")
        .map_or(true, |v| v.trim().is_empty());
    if link_missing {
        bound.insert(
            "linked_professional".to_string(),
            client
                .linked_professional_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        );
    }

    let mut form = ClientForm::bind(&bound);
    let Some(input) = form.clean() else {
        return Err(ClientError::Invalid(form));
    };

    if email_taken(conn, &input.email, Some(client.id))
        .map_err(|e| ClientError::Database(e.to_string()))?
    {
        form.errors.add("email", MSG_EMAIL_TAKEN);
        return Err(ClientError::Invalid(form));
    }

    client.first_name = input.first_name;
    client.last_name = input.last_name;
    client.email = input.email;
    client.phone_number = input.phone_number;
    client.linked_professional_id = input.linked_professional_id;

    match save_user(conn, &client) {
        Ok(client) => {
            info!("Professional {} updated client {}", requester.id, client.id);
            Ok(client)
        }
        Err(e) => Err(attach_user_error(form, e)),
    }
}

pub fn delete_client(
    conn: &mut PgConnection,
    requester: &User,
    client_id: Uuid,
) -> Result<(), ClientError> {
    let client = find_client(conn, requester, client_id)?.ok_or(ClientError::NotFound)?;
    diesel::delete(users::table.find(client.id)).execute(conn)?;
    info!("Professional {} deleted client {}", requester.id, client.id);
    Ok(())
}

/// A professional's clients by first name, last name, then email.
pub fn list_clients(conn: &mut PgConnection, professional: &User) -> Result<Vec<User>, ClientError> {
    Ok(users::table
        .filter(users::user_type.eq(UserType::Individual))
        .filter(users::linked_professional_id.eq(professional.id))
        .order((
            users::first_name.asc(),
            users::last_name.asc(),
            users::email.asc(),
        ))
        .select(User::as_select())
        .load(conn)?)
}
