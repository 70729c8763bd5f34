use chrono::Utc;

/// Current wall-clock time as epoch milliseconds.
/// All persisted instants use this representation.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
