//! Request parameter parsing and clamping
//!
//! Query parameters (`duration`, `workers`) are best-effort: garbage falls
//! back to the default and every value is clamped into range. Path
//! parameters (`minutes`, Fibonacci target) are validated and rejected.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::LoadSettings;

/// Rejected path parameter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// Minutes missing from `/fib/`
    #[error("Please provide duration in minutes in the format /fib/{{minutes}}")]
    MissingMinutes,

    /// Minutes not a positive integer
    #[error("Invalid duration. Please provide a positive integer (minutes).")]
    InvalidMinutes,

    /// Minutes above the configured ceiling
    #[error("Invalid duration. Maximum is {max} minutes.")]
    MinutesTooLarge { max: u64 },

    /// Minutes too far in the future for the host clock
    #[error("Invalid duration. {minutes} minutes is too long to schedule.")]
    MinutesOutOfRange { minutes: u64 },

    /// Target missing from `/fib/`
    #[error("Please provide a number in the format /fib/{{number}}")]
    MissingTarget,

    /// Target not an integer in range
    #[error("Invalid number. Please provide an integer between 0 and {max}.")]
    InvalidTarget { max: u64 },
}

/// Duration for `/heavy`: default on missing or unparseable input, then
/// clamped into `[1, max_duration_secs]`
pub fn resolve_duration(raw: Option<&str>, settings: &LoadSettings) -> Duration {
    let secs = raw
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(settings.default_duration_secs as i64);
    let max = settings.max_duration_secs.max(1) as i64;
    Duration::from_secs(secs.clamp(1, max) as u64)
}

/// Worker count: host CPU count on missing or unparseable input, then
/// clamped into `[1, cap]`
pub fn resolve_workers(raw: Option<&str>, cpu_count: usize, cap: usize) -> usize {
    let requested = raw
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(cpu_count as i64);
    requested.clamp(1, cap.max(1) as i64) as usize
}

/// Minutes for the duration Fibonacci endpoint
pub fn parse_minutes(raw: &str, settings: &LoadSettings) -> Result<u64, ParamError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParamError::MissingMinutes);
    }

    let minutes = raw.parse::<i64>().map_err(|_| ParamError::InvalidMinutes)?;
    if minutes <= 0 {
        return Err(ParamError::InvalidMinutes);
    }

    let minutes = minutes as u64;
    if settings.max_fib_minutes > 0 && minutes > settings.max_fib_minutes {
        return Err(ParamError::MinutesTooLarge {
            max: settings.max_fib_minutes,
        });
    }

    Ok(minutes)
}

/// Minutes as a wall-clock duration whose deadline fits the host clock
pub fn minutes_to_duration(minutes: u64) -> Result<Duration, ParamError> {
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .filter(|d| Instant::now().checked_add(*d).is_some())
        .ok_or(ParamError::MinutesOutOfRange { minutes })
}

/// Ceiling for the bounded Fibonacci endpoint, in `[0, max_fib_target]`
pub fn parse_fib_target(raw: &str, settings: &LoadSettings) -> Result<u64, ParamError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParamError::MissingTarget);
    }

    let max = settings.max_fib_target;
    match raw.parse::<i64>() {
        Ok(n) if n >= 0 && (n as u64) <= max => Ok(n as u64),
        _ => Err(ParamError::InvalidTarget { max }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LoadSettings {
        LoadSettings::default()
    }

    #[test]
    fn test_duration_defaults() {
        let s = settings();
        assert_eq!(resolve_duration(None, &s), Duration::from_secs(10));
        assert_eq!(resolve_duration(Some("abc"), &s), Duration::from_secs(10));
        assert_eq!(resolve_duration(Some(""), &s), Duration::from_secs(10));
        assert_eq!(resolve_duration(Some("2.5"), &s), Duration::from_secs(10));
    }

    #[test]
    fn test_duration_clamped() {
        let s = settings();
        assert_eq!(resolve_duration(Some("0"), &s), Duration::from_secs(1));
        assert_eq!(resolve_duration(Some("-5"), &s), Duration::from_secs(1));
        assert_eq!(resolve_duration(Some("30"), &s), Duration::from_secs(30));
        assert_eq!(resolve_duration(Some("600"), &s), Duration::from_secs(60));
    }

    #[test]
    fn test_workers_clamped() {
        assert_eq!(resolve_workers(Some("999"), 4, 10), 10);
        assert_eq!(resolve_workers(Some("0"), 4, 10), 1);
        assert_eq!(resolve_workers(Some("-3"), 4, 10), 1);
        assert_eq!(resolve_workers(Some("7"), 4, 10), 7);
        assert_eq!(resolve_workers(Some("15"), 4, 20), 15);
    }

    #[test]
    fn test_workers_default_is_cpu_count_clamped() {
        assert_eq!(resolve_workers(None, 4, 10), 4);
        assert_eq!(resolve_workers(Some("many"), 4, 10), 4);
        assert_eq!(resolve_workers(None, 64, 10), 10);
        assert_eq!(resolve_workers(None, 64, 20), 20);
    }

    #[test]
    fn test_clamps_hold_for_any_input() {
        let s = settings();
        for raw in ["-100", "-1", "0", "1", "9", "10", "11", "60", "61", "99999999999999", "x"] {
            let d = resolve_duration(Some(raw), &s).as_secs();
            assert!((1..=60).contains(&d), "duration {} out of range for {}", d, raw);

            let w = resolve_workers(Some(raw), 8, 10);
            assert!((1..=10).contains(&w), "workers {} out of range for {}", w, raw);
        }
    }

    #[test]
    fn test_parse_minutes() {
        let s = settings();
        assert_eq!(parse_minutes("1", &s), Ok(1));
        assert_eq!(parse_minutes("90", &s), Ok(90));
        assert_eq!(parse_minutes("0", &s), Err(ParamError::InvalidMinutes));
        assert_eq!(parse_minutes("-2", &s), Err(ParamError::InvalidMinutes));
        assert_eq!(parse_minutes("1.5", &s), Err(ParamError::InvalidMinutes));
        assert_eq!(parse_minutes("soon", &s), Err(ParamError::InvalidMinutes));
        assert_eq!(parse_minutes("", &s), Err(ParamError::MissingMinutes));
    }

    #[test]
    fn test_parse_minutes_with_ceiling() {
        let mut s = settings();
        s.max_fib_minutes = 5;
        assert_eq!(parse_minutes("5", &s), Ok(5));
        assert_eq!(parse_minutes("6", &s), Err(ParamError::MinutesTooLarge { max: 5 }));
    }

    #[test]
    fn test_minutes_to_duration() {
        assert_eq!(minutes_to_duration(2).unwrap(), Duration::from_secs(120));
        assert_eq!(
            minutes_to_duration(u64::MAX),
            Err(ParamError::MinutesOutOfRange { minutes: u64::MAX })
        );
    }

    #[test]
    fn test_minutes_past_clock_range() {
        // Fits in u64 seconds but not in an Instant
        let minutes = 153_722_867_280_912_930;
        assert_eq!(
            minutes_to_duration(minutes),
            Err(ParamError::MinutesOutOfRange { minutes })
        );
    }

    #[test]
    fn test_parse_fib_target() {
        let s = settings();
        assert_eq!(parse_fib_target("0", &s), Ok(0));
        assert_eq!(parse_fib_target("10000", &s), Ok(10_000));
        assert_eq!(parse_fib_target("10001", &s), Err(ParamError::InvalidTarget { max: 10_000 }));
        assert_eq!(parse_fib_target("-1", &s), Err(ParamError::InvalidTarget { max: 10_000 }));
        assert_eq!(parse_fib_target("ten", &s), Err(ParamError::InvalidTarget { max: 10_000 }));
        assert_eq!(parse_fib_target("", &s), Err(ParamError::MissingTarget));
    }

    #[test]
    fn test_error_messages() {
        assert!(ParamError::MissingMinutes.to_string().contains("/fib/{minutes}"));
        assert!(ParamError::InvalidTarget { max: 10_000 }.to_string().contains("10000"));
    }
}
