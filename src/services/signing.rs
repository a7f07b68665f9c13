// src/services/signing.rs
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

/// Rounds `now` down to the start of its cache window.
///
/// A fresh signature per request makes every thumbnail URL unique, which
/// busts browser image caches on each page load. Signing as-of the window
/// start instead keeps every URL issued within one window byte-identical,
/// so the image responses stay cacheable. Windows are aligned to the Unix
/// epoch; a 24h window therefore starts at UTC midnight.
///
/// Known limitation: a URL signed near the end of a window expires
/// `url_expiry` after the *window start*, so it can go stale shortly after
/// a client caches it.
pub fn truncated_signing_time(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    let window_secs = window.as_secs() as i64;
    if window_secs <= 0 {
        return now;
    }
    let secs = now.timestamp();
    let truncated = secs - secs.rem_euclid(window_secs);
    Utc.timestamp_opt(truncated, 0).single().unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(86400);
    const TEN_MINUTES: Duration = Duration::from_secs(600);

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn day_window_truncates_to_utc_midnight() {
        let t = truncated_signing_time(at("2024-03-05T17:42:31.250Z"), DAY);
        assert_eq!(t, at("2024-03-05T00:00:00Z"));
    }

    #[test]
    fn ten_minute_window_truncates_to_mark() {
        let t = truncated_signing_time(at("2024-03-05T17:42:31Z"), TEN_MINUTES);
        assert_eq!(t, at("2024-03-05T17:40:00Z"));
    }

    #[test]
    fn same_window_yields_same_instant() {
        let a = truncated_signing_time(at("2024-03-05T00:00:01Z"), DAY);
        let b = truncated_signing_time(at("2024-03-05T23:59:59Z"), DAY);
        assert_eq!(a, b);
    }

    #[test]
    fn different_windows_differ() {
        let a = truncated_signing_time(at("2024-03-05T23:59:59Z"), DAY);
        let b = truncated_signing_time(at("2024-03-06T00:00:00Z"), DAY);
        assert_ne!(a, b);
    }

    #[test]
    fn zero_window_is_passthrough() {
        let now = at("2024-03-05T17:42:31Z");
        assert_eq!(truncated_signing_time(now, Duration::ZERO), now);
    }
}
