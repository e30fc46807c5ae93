use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::forms::ClientForm;

pub const MSG_CLIENT_NOT_FOUND: &str = "Client introuvable ou non autorisé.";
pub const MSG_PROFESSIONAL_REQUIRED: &str =
    "Vous devez être un professionnel pour ajouter un client.";

#[derive(Debug)]
pub enum ClientError {
    /// Validation or permission failure; the bound form carries the messages.
    Invalid(ClientForm),
    NotFound,
    Database(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(form) => match form.errors.non_field().first() {
                Some(message) => write!(f, "{message}"),
                None => write!(f, "Formulaire client invalide."),
            },
            Self::NotFound => write!(f, "{MSG_CLIENT_NOT_FOUND}"),
            Self::Database(msg) => write!(f, "Database error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<diesel::result::Error> for ClientError {
    fn from(e: diesel::result::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
