use crate::core::shared::schema::core::users;

diesel::table! {
    categories (id) {
        id -> Uuid,
        name -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    services (id) {
        id -> Uuid,
        category_id -> Uuid,
        name -> Varchar,
        description -> Text,
        price -> Nullable<Numeric>,
        duration_minutes -> Nullable<Int4>,
        created_at -> Timestamptz,
        created_by -> Uuid,
    }
}

diesel::table! {
    workshops (id) {
        id -> Uuid,
        name -> Varchar,
        address -> Text,
        zip_code -> Varchar,
        city -> Varchar,
        photo -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    workshop_services (workshop_id, service_id) {
        workshop_id -> Uuid,
        service_id -> Uuid,
    }
}

diesel::table! {
    workshop_professionals (workshop_id, user_id) {
        workshop_id -> Uuid,
        user_id -> Uuid,
    }
}

diesel::joinable!(services -> categories (category_id));
diesel::joinable!(services -> users (created_by));
diesel::joinable!(workshop_services -> workshops (workshop_id));
diesel::joinable!(workshop_services -> services (service_id));
diesel::joinable!(workshop_professionals -> workshops (workshop_id));
diesel::joinable!(workshop_professionals -> users (user_id));
