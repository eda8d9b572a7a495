// Mirrors the tables created in `migrations.rs`.

diesel::table! {
    users (id) {
        id -> Integer,
        email -> Text,
        password_hash -> Text,
        first_name -> Text,
        last_name -> Text,
        gender -> Text,
        date_of_birth -> Date,
        bio -> Nullable<Text>,
        profile_photo -> Nullable<Text>,
        location -> Nullable<Text>,
        denomination -> Nullable<Text>,
        interests -> Nullable<Text>,
        looking_for -> Nullable<Text>,
        videos_watched -> Integer,
        is_active -> Bool,
        created_at -> Timestamp,
    }
}

diesel::table! {
    likes (id) {
        id -> Integer,
        liker_id -> Integer,
        liked_id -> Integer,
        created_at -> Timestamp,
    }
}

diesel::table! {
    matches (id) {
        id -> Integer,
        user1_id -> Integer,
        user2_id -> Integer,
        status -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    messages (id) {
        id -> Integer,
        sender_id -> Integer,
        receiver_id -> Integer,
        content -> Text,
        is_read -> Bool,
        created_at -> Timestamp,
    }
}

diesel::table! {
    revoked_tokens (jti) {
        jti -> Text,
        revoked_at -> Timestamp,
        expires_at -> Timestamp,
    }
}

diesel::joinable!(likes -> users (liker_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    likes,
    matches,
    messages,
    revoked_tokens,
);
