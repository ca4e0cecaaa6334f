//! Clock-stamp and progress pacing utilities.
//!
//! The media engine reports elapsed output time either as a microsecond
//! counter or as an `HH:MM:SS[.frac]` stamp. This module provides:
//! - Parsing and formatting of clock stamps
//! - A throttle that paces progress callbacks by wall time and by value delta

/// Parse an `HH:MM:SS[.frac]` stamp into seconds.
///
/// Returns `None` for anything that is not three colon-separated numeric
/// fields, or for negative values.
pub fn parse_clock_stamp(stamp: &str) -> Option<f64> {
    let mut parts = stamp.trim().split(':');
    let hours = parts.next()?.parse::<u64>().ok()?;
    let minutes = parts.next()?.parse::<u64>().ok()?;
    let seconds = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() || !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

/// Format seconds as `HH:MM:SS.mmm`.
pub fn format_clock_stamp(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Paces progress reports.
///
/// A value is let through only when at least `min_interval_ns` has passed
/// since the previous report *and* the value moved by at least `min_delta`.
/// The first call always passes.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    min_interval_ns: u64,
    min_delta: f64,
    last_emit_ns: Option<u64>,
    last_value: f64,
}

impl ProgressThrottle {
    /// Create a throttle with the given wall-time interval and value delta.
    pub fn new(min_interval_ms: u64, min_delta: f64) -> Self {
        Self {
            min_interval_ns: min_interval_ms * 1_000_000,
            min_delta: min_delta.max(0.0),
            last_emit_ns: None,
            last_value: 0.0,
        }
    }

    /// A throttle that never holds anything back.
    pub fn unthrottled() -> Self {
        Self::new(0, 0.0)
    }

    /// Check whether `value` observed at `now_ns` should be reported.
    /// Returns true and records the report if so.
    pub fn should_emit(&mut self, value: f64, now_ns: u64) -> bool {
        let ready = match self.last_emit_ns {
            None => true,
            Some(last) => {
                now_ns >= last.saturating_add(self.min_interval_ns)
                    && value >= self.last_value + self.min_delta
            }
        };
        if ready {
            self.last_emit_ns = Some(now_ns);
            self.last_value = value;
        }
        ready
    }

    /// Last value let through.
    pub fn last_value(&self) -> f64 {
        self.last_value
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(100, 0.05)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_stamp() {
        assert!((parse_clock_stamp("00:00:02.34").unwrap() - 2.34).abs() < 1e-9);
        assert!((parse_clock_stamp("01:02:03").unwrap() - 3723.0).abs() < 1e-9);
        assert_eq!(parse_clock_stamp("N/A"), None);
        assert_eq!(parse_clock_stamp("00:01"), None);
        assert_eq!(parse_clock_stamp("00:00:01:00"), None);
    }

    #[test]
    fn test_format_clock_stamp() {
        assert_eq!(format_clock_stamp(3723.5), "01:02:03.500");
        assert_eq!(format_clock_stamp(-4.0), "00:00:00.000");
    }

    #[test]
    fn test_throttle_first_value_always_passes() {
        let mut throttle = ProgressThrottle::new(100, 0.05);
        assert!(throttle.should_emit(0.0, 0));
    }

    #[test]
    fn test_throttle_requires_time_and_delta() {
        let mut throttle = ProgressThrottle::new(100, 0.05);
        assert!(throttle.should_emit(0.0, 0));
        // Large delta, too soon.
        assert!(!throttle.should_emit(1.0, 10_000_000));
        // Enough time, too small a delta.
        assert!(!throttle.should_emit(0.01, 200_000_000));
        // Both satisfied.
        assert!(throttle.should_emit(1.0, 200_000_000));
        assert!((throttle.last_value() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unthrottled_passes_everything_non_decreasing() {
        let mut throttle = ProgressThrottle::unthrottled();
        assert!(throttle.should_emit(0.5, 0));
        assert!(throttle.should_emit(0.5, 0));
        assert!(throttle.should_emit(0.7, 0));
    }
}
