diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Varchar,
        password_hash -> Varchar,
        first_name -> Varchar,
        last_name -> Varchar,
        phone_number -> Varchar,
        user_type -> Varchar,
        linked_professional_id -> Nullable<Uuid>,
        is_staff -> Bool,
        is_active -> Bool,
        date_joined -> Timestamptz,
    }
}
