//! Timecode and pacing utilities.
//!
//! Timeline positions are carried as `f64` seconds everywhere. This module
//! provides:
//! - Display formatting for timecodes
//! - Tolerance comparisons for surface-reported times
//! - A throttle for rate-limiting preview seeks

use std::time::Duration;

/// Format seconds as `M:SS`, or `H:MM:SS` once past the hour.
///
/// Non-finite input renders as `0:00`.
pub fn format_timecode(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Whether two times are within `tolerance` seconds of each other.
pub fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Convert seconds to a `Duration`, treating negative or non-finite input as zero.
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

/// Rate limiter keyed on caller-supplied monotonic timestamps.
///
/// Timestamps are passed in rather than read from a clock so the same
/// throttle works under real and simulated time.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_fire: Option<Duration>,
}

impl Throttle {
    /// Create a throttle that fires at most once per `min_interval`.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_fire: None,
        }
    }

    /// Returns true and records the fire if enough time has passed since the
    /// last one. The first call always fires.
    pub fn should_fire(&mut self, now: Duration) -> bool {
        match self.last_fire {
            Some(last) if now < last + self.min_interval => false,
            _ => {
                self.last_fire = Some(now);
                true
            }
        }
    }

    /// Forget the last fire so the next call fires unconditionally.
    pub fn reset(&mut self) {
        self.last_fire = None;
    }

    /// Minimum interval between fires.
    pub fn interval(&self) -> Duration {
        self.min_interval
    }
}
