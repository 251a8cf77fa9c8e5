diesel::table! {
    kv_entries (key) {
        key -> Text,
        value -> Text,
        updated_at -> BigInt,
    }
}
