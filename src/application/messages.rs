use crate::domain::time::time_since;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub const START_HINT: &str = "Use /track [ADDRESS] to start";
pub const MISSING_ADDRESS: &str = "Please provide a token address after /track";
pub const LOOKUP_FAILED: &str = "Invalid token address or API error";
pub const SLOTS_FULL: &str = "Tracking slots full! Which one to replace?";
pub const NO_ACTIVE_TRACKING: &str = "No active tracking";
pub const NO_PENDING: &str = "No pending token to track";
pub const INVALID_SLOT: &str = "Invalid slot selection";
pub const REPLACEMENT_LOOKUP_FAILED: &str = "Invalid token address";

fn with_payment_time(mut text: String, payment_ts: i64, now: DateTime<Utc>) -> String {
    let ago = time_since(payment_ts, now);
    if ago != "Unknown" {
        text.push_str(&format!("\nPayment Time: {} ago", ago));
    }
    text
}

pub fn status_report(
    symbol: &str,
    address: &str,
    status: &str,
    payment_ts: i64,
    now: DateTime<Utc>,
) -> String {
    with_payment_time(
        format!("{} ({})\nStatus: {}", symbol, address, status),
        payment_ts,
        now,
    )
}

pub fn now_tracking(symbol: &str, address: &str, status: &str) -> String {
    format!(
        "Now tracking {} ({})\nInitial Status: {}",
        symbol, address, status
    )
}

pub fn already_tracking(address: &str) -> String {
    format!("Already tracking {}", address)
}

pub fn stopped_tracking(symbol: &str, address: &str) -> String {
    format!("Stopped tracking {} ({})", symbol, address)
}

pub fn stopped_idle(symbol: &str, address: &str, idle: Duration) -> String {
    format!(
        "Stopped tracking {} ({}) - no changes for {} minutes",
        symbol,
        address,
        idle.as_secs() / 60
    )
}

pub fn replaced(
    slot: usize,
    symbol: &str,
    address: &str,
    status: &str,
    payment_ts: i64,
    now: DateTime<Utc>,
) -> String {
    with_payment_time(
        format!(
            "Replaced slot {} with {} ({})\nStatus: {}",
            slot, symbol, address, status
        ),
        payment_ts,
        now,
    )
}

pub fn replace_choice(slot: usize, symbol: &str) -> String {
    format!("Replace Slot {}: {}", slot, symbol)
}

pub fn stopped_all(count: usize) -> String {
    format!("Stopped tracking {} tokens", count)
}

pub fn watching<'a>(entries: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let lines: Vec<String> = entries
        .enumerate()
        .map(|(i, (symbol, address))| format!("{}. {} ({})", i + 1, symbol, address))
        .collect();
    format!("Currently tracking:\n{}", lines.join("\n"))
}
