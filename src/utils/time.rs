use chrono::{DateTime, Utc};

/// Milliseconds since the epoch, used to stamp crawl reports.
pub fn time_millis() -> i64 {
    let time: DateTime<chrono::Utc> = Utc::now();
    time.timestamp_millis()
}
