use crate::core::shared::schema::core::users;

diesel::table! {
    calendars (id) {
        id -> Uuid,
        owner_id -> Uuid,
        name -> Varchar,
        slug -> Varchar,
        is_public -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    events (id) {
        id -> Uuid,
        calendar_id -> Uuid,
        title -> Varchar,
        description -> Text,
        start_at -> Timestamptz,
        end_at -> Timestamptz,
        status -> Varchar,
        created_by -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    event_attendees (id) {
        id -> Uuid,
        event_id -> Uuid,
        user_id -> Uuid,
        role -> Varchar,
        is_confirmed -> Bool,
    }
}

diesel::joinable!(calendars -> users (owner_id));
diesel::joinable!(events -> calendars (calendar_id));
diesel::joinable!(event_attendees -> events (event_id));
diesel::joinable!(event_attendees -> users (user_id));
