//! Diesel table definitions mirroring `backend/migrations`.

diesel::table! {
    issues (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        image_url -> Nullable<Text>,
        latitude -> Nullable<Float8>,
        longitude -> Nullable<Float8>,
        owner_id -> Uuid,
        status -> Text,
        created_at -> Timestamptz,
        version -> Int8,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Text,
        password_hash -> Text,
        display_name -> Text,
        avatar_url -> Nullable<Text>,
        phone -> Nullable<Text>,
        address -> Nullable<Text>,
        role -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    sessions (token_digest) {
        token_digest -> Text,
        user_id -> Uuid,
        expires_at -> Timestamptz,
    }
}

diesel::table! {
    password_resets (token_digest) {
        token_digest -> Text,
        user_id -> Uuid,
        expires_at -> Timestamptz,
    }
}

diesel::joinable!(sessions -> users (user_id));
diesel::joinable!(password_resets -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(issues, users, sessions, password_resets);
