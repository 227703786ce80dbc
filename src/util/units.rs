//! Human-readable sizes, durations and rates for reports

use std::time::Duration;

const BINARY_UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];

/// Binary-prefixed size with one decimal, plain bytes below 1 KiB
///
/// ```
/// use fanbench::util::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(3 * 1024 * 1024 / 2), "1.5 MiB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < BINARY_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, BINARY_UNITS[unit])
}

/// Task timings rendered by humantime
///
/// Truncated to whole milliseconds, or whole microseconds for sub-millisecond
/// durations, so reports don't carry nanosecond noise.
pub fn format_duration(duration: Duration) -> String {
    let truncated = if duration >= Duration::from_millis(1) {
        Duration::from_millis(duration.as_millis() as u64)
    } else {
        Duration::from_micros(duration.as_micros() as u64)
    };
    humantime::format_duration(truncated).to_string()
}

/// Average rate of `bytes` over `elapsed`, e.g. `2.0 MiB/s`
pub fn format_rate(bytes: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return "n/a".to_string();
    }
    format!("{}/s", format_bytes((bytes as f64 / secs) as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KiB");
        assert_eq!(format_bytes(20 * 1024 * 1024), "20.0 MiB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.0 GiB");
    }

    #[test]
    fn test_format_duration_truncates() {
        assert_eq!(format_duration(Duration::from_nanos(1_100_900_123)), "1s 100ms");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_nanos(412_345)), "412us");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(4 * 1024 * 1024, Duration::from_secs(2)), "2.0 MiB/s");
        assert_eq!(format_rate(100, Duration::ZERO), "n/a");
    }
}
