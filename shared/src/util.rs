/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate an opaque unique resource ID (UUID v4)
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
