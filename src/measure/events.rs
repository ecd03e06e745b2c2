//! Pull timing extraction from pod events

use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Event;
use regex::Regex;

use crate::error::{BenchError, BenchResult};

pub const PULLING_REASON: &str = "Pulling";
pub const PULLED_REASON: &str = "Pulled";

fn pull_message_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `... in 873.420598ms (873.428863ms including waiting)`, or the older form without the
    // parenthetical at the end of the message
    RE.get_or_init(|| Regex::new(r#"" in ([^\s(]+)(?: \(|$)"#).expect("valid regex"))
}

fn duration_unit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([0-9]*)(?:\.([0-9]*))?(ns|us|µs|μs|ms|s|m|h)").expect("valid regex")
    })
}

/// First event with the given reason
pub fn find_event<'a>(events: &'a [Event], reason: &str) -> BenchResult<&'a Event> {
    events
        .iter()
        .find(|e| e.reason.as_deref() == Some(reason))
        .ok_or_else(|| BenchError::MissingEvent(reason.to_string()))
}

/// When the event happened: `firstTimestamp`, then `eventTime`, then creation time
pub fn event_time(event: &Event) -> Option<DateTime<Utc>> {
    event
        .first_timestamp
        .as_ref()
        .map(|t| t.0)
        .or_else(|| event.event_time.as_ref().map(|t| t.0))
        .or_else(|| event.metadata.creation_timestamp.as_ref().map(|t| t.0))
}

/// Extract the pull duration from a `Pulled` event message
pub fn parse_pull_message(msg: &str) -> BenchResult<Duration> {
    let caps = pull_message_regex()
        .captures(msg)
        .ok_or(BenchError::PullDurationNotFound)?;
    parse_go_duration(&caps[1])
}

/// Parse a duration in the format the kubelet prints, e.g. `1m2.5s` or `873.420598ms`
pub fn parse_go_duration(s: &str) -> BenchResult<Duration> {
    let invalid = || BenchError::InvalidDuration(s.to_string());
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    let mut consumed = 0;
    for caps in duration_unit_regex().captures_iter(s) {
        let whole = caps.get(0).ok_or_else(invalid)?;
        if whole.start() != consumed {
            return Err(invalid());
        }
        consumed = whole.end();

        let int_part = caps.get(1).map_or("", |m| m.as_str());
        let frac_part = caps.get(2).map_or("", |m| m.as_str());
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit: u128 = match &caps[3] {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            _ => return Err(invalid()),
        };

        let int_value: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        total = int_value
            .checked_mul(unit)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(invalid)?;

        if !frac_part.is_empty() {
            // digits past nanosecond precision do not contribute
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac_value: u128 = digits.parse().map_err(|_| invalid())?;
            let scaled = frac_value * unit / 10u128.pow(digits.len() as u32);
            total = total.checked_add(scaled).ok_or_else(invalid)?;
        }
    }
    if consumed != s.len() {
        return Err(invalid());
    }

    let nanos = u64::try_from(total).map_err(|_| invalid())?;
    Ok(Duration::from_nanos(nanos))
}
