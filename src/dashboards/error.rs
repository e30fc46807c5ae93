use axum::{response::IntoResponse, Json};

#[derive(Debug, thiserror::Error)]
pub enum DashboardsError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DashboardsError {
    pub fn database(err: impl std::fmt::Display) -> Self {
        log::error!("Dashboard query failed: {err}");
        Self::Database(err.to_string())
    }
}

impl IntoResponse for DashboardsError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        let message = match &self {
            Self::Database(msg) | Self::Connection(msg) | Self::Internal(msg) => msg.clone(),
        };
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response()
    }
}
