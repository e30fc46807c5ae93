use serde::Serialize;
use uuid::Uuid;

use crate::core::shared::models::User;

/// Row of the dashboard client table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

impl From<&User> for ClientSummary {
    fn from(client: &User) -> Self {
        let phone = if client.phone_number.trim().is_empty() {
            "—".to_string()
        } else {
            client.phone_number.clone()
        };
        Self {
            id: client.id,
            full_name: client.display_name(),
            email: client.email.clone(),
            phone,
        }
    }
}

/// Entry of the client picker in the appointment form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientOption {
    pub id: Uuid,
    pub label: String,
}

impl From<&User> for ClientOption {
    fn from(client: &User) -> Self {
        Self {
            id: client.id,
            label: client.display_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::enums::UserType;
    use chrono::Utc;

    fn client(first: &str, last: &str, phone: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "client@example.com".into(),
            password_hash: String::new(),
            first_name: first.into(),
            last_name: last.into(),
            phone_number: phone.into(),
            user_type: UserType::Individual,
            linked_professional_id: Some(Uuid::new_v4()),
            is_staff: false,
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_summary_uses_dash_for_missing_phone() {
        let summary = ClientSummary::from(&client("Alice", "Martin", ""));
        assert_eq!(summary.full_name, "Alice Martin");
        assert_eq!(summary.phone, "—");
    }

    #[test]
    fn test_option_falls_back_to_email() {
        let option = ClientOption::from(&client("", "", "0601"));
        assert_eq!(option.label, "client@example.com");
    }
}
