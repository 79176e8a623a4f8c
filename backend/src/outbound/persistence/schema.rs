//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Case-insensitive
//! unique indexes on names live only in the migrations.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Int8,
        /// Unique login name.
        username -> Text,
        /// Lower-cased contact address; unique when present.
        email -> Nullable<Text>,
        /// PHC-encoded password digest.
        password_digest -> Text,
        /// `admin` or `user`.
        role -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Key/value runtime settings such as the invitation code.
    settings (key) {
        key -> Text,
        value -> Text,
    }
}

diesel::table! {
    /// Named groupings of items.
    rooms (id) {
        id -> Int8,
        name -> Text,
        description -> Text,
        created_at -> Timestamptz,
        created_by -> Nullable<Int8>,
    }
}

diesel::table! {
    /// Consumables; `room_name` mirrors the owning room's name.
    items (id) {
        id -> Int8,
        name -> Text,
        description -> Text,
        room_id -> Int8,
        room_name -> Text,
        /// Unit price in whole cents.
        price_cents -> Int8,
        created_at -> Timestamptz,
        created_by -> Nullable<Int8>,
    }
}

diesel::table! {
    /// Append-only consumption events.
    strokes (id) {
        id -> Int8,
        item_id -> Int8,
        /// Cleared when the account is deleted.
        user_id -> Nullable<Int8>,
        username -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Named date windows; at most one row is active.
    billing_periods (id) {
        id -> Int8,
        name -> Text,
        start_date -> Date,
        end_date -> Date,
        is_active -> Bool,
        created_at -> Timestamptz,
        created_by -> Nullable<Int8>,
    }
}

diesel::joinable!(items -> rooms (room_id));
diesel::joinable!(strokes -> items (item_id));

diesel::allow_tables_to_appear_in_same_query!(billing_periods, items, rooms, settings, strokes, users);
