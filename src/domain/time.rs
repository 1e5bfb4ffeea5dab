use chrono::{DateTime, Utc};

/// Renders how long ago a payment happened, for display only.
///
/// `payment_ts_millis` is a unix timestamp in milliseconds. Non-positive input
/// yields "Unknown"; a timestamp ahead of `now` yields "Not yet paid".
pub fn time_since(payment_ts_millis: i64, now: DateTime<Utc>) -> String {
    if payment_ts_millis <= 0 {
        return "Unknown".to_string();
    }
    let diff_millis = now.timestamp_millis() - payment_ts_millis;
    if diff_millis < 0 {
        return "Not yet paid".to_string();
    }
    let diff = diff_millis / 1000;

    let intervals = [
        (diff / 86_400, "days"),
        (diff / 3_600 % 24, "hours"),
        (diff / 60 % 60, "minutes"),
    ];
    for (count, unit) in intervals {
        if count >= 1 {
            return format!("{} {}", count, unit);
        }
    }
    format!("{} seconds", diff)
}
