use chrono::{DateTime, Utc};

/// Current unix time in milliseconds.
pub fn time_millis() -> i64 {
    let time: DateTime<chrono::Utc> = Utc::now();
    time.timestamp_millis()
}
