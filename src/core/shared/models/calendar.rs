use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::core::shared::enums::{AttendeeRole, EventStatus};
use crate::core::shared::schema::{calendars, event_attendees, events};

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = calendars)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Calendar {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Event {
    pub id: Uuid,
    pub calendar_id: Uuid,
    pub title: String,
    pub description: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: EventStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = event_attendees)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EventAttendee {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub role: AttendeeRole,
    pub is_confirmed: bool,
}

impl EventAttendee {
    /// Attendee with the default role and confirmation flag.
    pub fn new(event_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            role: AttendeeRole::default(),
            is_confirmed: false,
        }
    }
}
